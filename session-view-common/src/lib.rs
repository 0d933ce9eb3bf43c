//! # Shared Data Structures (event source ↔ process tree)
//!
//! Defines the event records exchanged between whatever fetches session
//! activity (a search backend, a recorded file, a test fixture) and the
//! process-tree engine in `session-view`. Everything here is plain data with
//! `serde` derives; no tree logic lives in this crate.
//!
//! ## Event Shape
//!
//! Events follow an ECS-like nested layout:
//!
//! ```text
//! {
//!   "@timestamp": "2024-03-01T10:00:00.000Z",
//!   "event":   { "id": "...", "kind": "event", "action": "exec" },
//!   "process": { "entity_id": "...", "pid": 42, "args": [...],
//!                "parent": {...}, "group_leader": {...},
//!                "session_leader": {...}, "entry_leader": {...} },
//!   "alert":   { "uuid": "...", "workflow_status": "open" }
//! }
//! ```
//!
//! ## Key Types
//!
//! - [`ProcessEvent`] - A single timestamped lifecycle, output or alert record
//! - [`ProcessEventsPage`] - One page of events plus the cursor identifying it
//! - [`AlertStatusUpdate`] - Out-of-band workflow status change for an alert
//!
//! Every field is optional on the wire: session data is frequently partial
//! (paged from the middle of a long session, stripped by retention), so
//! missing attributes deserialize to `None` rather than failing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Event Classification Fields
// ============================================================================

/// High-level category of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Process lifecycle or informational ("wide") event
    Event,
    /// Detection alert raised against a process
    Alert,
    /// Anything else the source emits; kept so parsing never fails
    #[serde(other)]
    Other,
}

/// Lifecycle action carried by a process event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Fork,
    Exec,
    End,
    Output,
    #[serde(other)]
    Other,
}

impl EventAction {
    /// Returns true for fork, exec and end: the actions that describe where a
    /// process is in its lifecycle.
    #[must_use]
    pub fn is_lifecycle(self) -> bool {
        matches!(self, EventAction::Fork | EventAction::Exec | EventAction::End)
    }
}

/// Analyst workflow status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Closed,
}

// ============================================================================
// Event Records
// ============================================================================

/// Event metadata block (`event.*`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Unique event id, used to deduplicate re-delivered events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<EventAction>,
}

/// Controlling terminal of a process. Its presence marks an interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u32>,
}

/// User owning a process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A related process referenced from another process record: its parent, or
/// the group, session or entry leader it belongs to.
///
/// Entry leaders carry enough attributes to stand in for a full process
/// record when the session root's own events are not available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<Tty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Process attributes block (`process.*`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessFields {
    /// Session-unique process identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Process start time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// Process end time (RFC 3339), only on end events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<Tty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ProcessLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_leader: Option<ProcessLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_leader: Option<ProcessLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_leader: Option<ProcessLink>,
}

/// Rule that produced an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Alert linkage block (`alert.*`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_status: Option<AlertStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<AlertRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A single timestamped record about one process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// Event time (RFC 3339, UTC)
    #[serde(rename = "@timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessFields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertInfo>,
}

impl ProcessEvent {
    /// Event id, if the source assigned one.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        self.event.as_ref()?.id.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        self.event.as_ref()?.kind
    }

    #[must_use]
    pub fn action(&self) -> Option<EventAction> {
        self.event.as_ref()?.action
    }

    /// Identity of the process this event describes.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.process.as_ref()?.entity_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Identity of the parent of the process this event describes.
    #[must_use]
    pub fn parent_entity_id(&self) -> Option<&str> {
        self.process.as_ref()?.parent.as_ref()?.entity_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Alert uuid, if this event is linked to an alert.
    #[must_use]
    pub fn alert_uuid(&self) -> Option<&str> {
        self.alert.as_ref()?.uuid.as_deref()
    }
}

// ============================================================================
// Batches and Out-of-Band Updates
// ============================================================================

/// One page of session events as delivered by the fetch layer.
///
/// The cursor identifies the page; a page whose cursor has already been
/// applied is ignored by the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessEventsPage {
    #[serde(default)]
    pub events: Vec<ProcessEvent>,

    pub cursor: String,
}

/// New workflow status for one alert, and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatusUpdate {
    pub process_entity_id: String,
    pub status: AlertStatus,
}

/// Alert uuid → status update.
pub type AlertStatusMap = HashMap<String, AlertStatusUpdate>;
