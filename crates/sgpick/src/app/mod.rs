//! Application layer orchestrating domain logic and infrastructure.

pub mod actions;
pub mod catalog;
pub mod multi;
pub mod preview;
pub mod search;
pub mod select;
pub mod session;
