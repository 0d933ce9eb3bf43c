//! Analysis passes over a settled process map
//!
//! This module contains search and auto-expansion logic, separated from the
//! tree building and from presentation.

pub mod search;

pub use search::{auto_expand_process_tree, search_process_tree, search_text};
