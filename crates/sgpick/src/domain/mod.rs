//! Pure domain types: languages, patterns, search hits, and actions.

pub mod errors;
pub mod model;
pub mod pattern;
