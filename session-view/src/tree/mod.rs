//! Tree building from event batches
//!
//! See [`builder`] for the record / attach / resolve passes.

pub mod builder;

pub use builder::{process_new_events, update_process_map, BatchSummary};
