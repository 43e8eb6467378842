//! Terminal interaction: prompts, console output, and the session loop.

pub mod app;
pub mod console;
pub mod prompt;
