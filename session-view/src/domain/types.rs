//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep process identities apart from the many other
//! strings flowing through an event (names, paths, alert uuids) and make the
//! tree's function signatures more expressive.

use std::borrow::Borrow;
use std::fmt;

/// Process identity (`process.entity_id`)
///
/// Opaque, session-unique key for one OS process instance. Stable across all
/// events about that process, unlike a PID which the kernel may reuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(String);

impl ProcessId {
    /// Get the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProcessId {
    fn from(s: String) -> Self {
        ProcessId(s)
    }
}

impl From<&str> for ProcessId {
    fn from(s: &str) -> Self {
        ProcessId(s.to_owned())
    }
}

// Lets the process map be queried with a plain `&str`.
impl Borrow<str> for ProcessId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Search state of a process node
///
/// A node is either untouched by search, matched by the current query, or
/// evaluated and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchMatch {
    #[default]
    Unset,
    /// Matched; holds the query that matched (used for highlighting)
    Matched(String),
    NotMatched,
}

impl SearchMatch {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, SearchMatch::Matched(_))
    }
}

/// External lifecycle of a process
///
/// `Created → Active → Ended`. `Ended` is terminal: no later event can move a
/// process out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Known to exist (referenced by an event or alert) but no fork/exec/end yet
    Created,
    /// Has a fork or exec, no end
    Active,
    /// Has an end event
    Ended,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Direction a page of events was fetched in
///
/// Paging backward walks towards the start of the session, so nodes created
/// by that page are older than their existing siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDirection {
    #[default]
    Forward,
    Backward,
}

impl PageDirection {
    #[must_use]
    pub fn is_backward(self) -> bool {
        matches!(self, PageDirection::Backward)
    }
}
