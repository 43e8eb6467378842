//! Infrastructure adapters for external tools, config, clipboard, and terminal output.

pub mod capability;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod git;
pub mod highlight;
pub mod logging;
pub mod matcher;
pub mod selector;
pub mod text_search;
