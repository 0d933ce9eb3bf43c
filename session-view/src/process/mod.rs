//! Process nodes and the map that owns them.

pub mod map;
pub mod node;

pub use map::{Ancestors, ProcessMap};
pub use node::ProcessNode;
