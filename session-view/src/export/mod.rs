//! Snapshot export
//!
//! Serializes the visible process tree of a session, with search and alert
//! annotations, to JSON for offline inspection or diffing between runs.

pub mod snapshot;

pub use snapshot::{export_snapshot, SnapshotAlert, SnapshotNode, TreeSnapshot};
