//! # Session View - Process Tree Reconstruction for Terminal Sessions
//!
//! Session View rebuilds the process tree of a recorded interactive session
//! from a stream of process lifecycle events (fork, exec, end, output) and
//! alerts. Events arrive in pages, possibly out of order and in either
//! direction, and the tree has to stay consistent after every page: children
//! that show up before their parents are parked and re-attached later, and
//! duplicate deliveries are absorbed.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Session Event Source                         │
//! │        (paged process events, alerts, alert status updates)     │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ ProcessEventsPage / ProcessEvent
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Session View (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │Classification│──▶│ Tree Builder │──▶│  ProcessMap  │        │
//! │  │  (routing)   │   │  (3 passes)  │   │   (arena)    │        │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘        │
//! │                                               │                 │
//! │         ┌─────────────────────┬───────────────┤                 │
//! │         ▼                     ▼               ▼                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Analysis   │   │     View     │   │    Export    │        │
//! │  │(search/jump) │   │(order/filter)│   │  (snapshot)  │        │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘        │
//! │                            ▼                                    │
//! │                     ┌──────────────┐                            │
//! │                     │    Render    │                            │
//! │                     │ (text tree)  │                            │
//! │                     └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Core Pipeline Modules
//!
//! - [`classification`]: Reduce an event to identity, parent identity and
//!   category; build the session leader stand-in
//!
//! - [`process`]: Process nodes and the [`process::ProcessMap`] arena
//!   - `node`: Event/alert logs, lazily derived details, noise classification
//!   - `map`: Identity-keyed ownership, ancestor walks
//!
//! - [`tree`]: Fold event batches into the map (record, attach, resolve
//!   orphans), in either paging direction
//!
//! - [`analysis`]: Text search and jump-to expansion
//!
//! - [`view`]: Sibling ordering and the non-verbose noise filter
//!
//! - [`session`]: Stateful facade: cursor deduplication, alert batch, alert
//!   status updates, view options
//!
//! ### Input and Output Modules
//!
//! - [`session_data`]: Load a recorded session from a JSON file
//! - [`render`]: Indented text rendering of the visible tree
//! - [`export`]: JSON snapshot of the tree
//! - [`cli`]: Command-line argument parsing
//! - [`domain`]: Core domain types (`ProcessId`, `SearchMatch`) and errors
//!
//! ## Key Concepts
//!
//! - **Entry leader**: the process at the root of user-facing activity; the
//!   session's root node
//! - **Orphan**: a node whose parent is not loaded yet, shown under the root
//!   until the parent arrives
//! - **Verbose process**: shell startup noise whose process group is led by
//!   the session leader; hidden unless verbose mode is on
//! - **Auto-expand**: a node on the path to a search match or jump target

pub mod analysis;
pub mod classification;
pub mod cli;
pub mod domain;
pub mod export;
pub mod process;
pub mod render;
pub mod session;
pub mod session_data;
pub mod tree;
pub mod view;
