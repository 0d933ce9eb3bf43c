//! Event classification for routing incoming session events.
//!
//! Every event that reaches the tree is first reduced to the handful of facts
//! the tree builder needs: which process it is about, which process that
//! process claims as its parent, and what kind of record it is.
//!
//! # Classification Strategy
//!
//! 1. **Identity** - `process.entity_id`; events without one are malformed and
//!    classify to `None` (they never create nodes)
//! 2. **Alert linkage** - an `alert` block or `kind = alert` wins over any
//!    lifecycle action, so alerts land in the alert log, not the event log
//! 3. **Lifecycle action** - fork, exec, end, output
//! 4. **Generic** - everything else that still carries process attributes,
//!    e.g. informational "wide" events
//!
//! Classification is a pure function of the event; it never logs or mutates.

use session_view_common::{EventAction, EventKind, ProcessEvent, ProcessFields};

use crate::domain::ProcessId;

/// What an event contributes to its process node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Fork,
    Exec,
    End,
    Output,
    /// Alert raised against the process; goes to the alert log
    Alert,
    /// Informational event carrying process attributes but no lifecycle action
    Generic,
}

/// Result of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub identity: ProcessId,
    pub parent_identity: Option<ProcessId>,
    pub category: EventCategory,
}

/// Classify an event.
///
/// Returns `None` when the event has no process identity.
///
/// # Examples
///
/// ```ignore
/// // exec of A under S
/// classify(&exec_event)  // → Some(ClassifiedEvent { identity: "A", parent_identity: Some("S"), category: Exec, .. })
///
/// // record without process.entity_id
/// classify(&garbage)     // → None
/// ```
#[must_use]
pub fn classify(event: &ProcessEvent) -> Option<ClassifiedEvent> {
    let identity = ProcessId::from(event.entity_id()?);
    let parent_identity = event.parent_entity_id().map(ProcessId::from);

    Some(ClassifiedEvent { identity, parent_identity, category: categorize(event) })
}

/// Category of an event, independent of whether it has an identity.
#[must_use]
pub fn categorize(event: &ProcessEvent) -> EventCategory {
    if is_alert(event) {
        return EventCategory::Alert;
    }

    match event.action() {
        Some(EventAction::Fork) => EventCategory::Fork,
        Some(EventAction::Exec) => EventCategory::Exec,
        Some(EventAction::End) => EventCategory::End,
        Some(EventAction::Output) => EventCategory::Output,
        Some(EventAction::Other) | None => EventCategory::Generic,
    }
}

/// Returns true if the event is an alert rather than a process record.
#[must_use]
pub fn is_alert(event: &ProcessEvent) -> bool {
    event.alert.is_some() || event.kind() == Some(EventKind::Alert)
}

// =============================================================================
// SESSION LEADER STAND-IN
// =============================================================================

/// Build a stand-in record for the session's entry leader from an
/// informational event.
///
/// When paging backward from deep inside a long session the leader's own fork
/// and exec are usually not loaded. Every process event embeds its
/// `entry_leader` attributes, so the first informational event of the first
/// page can stand in: its process block is overlaid with the entry leader's
/// fields while its own parent link is kept.
///
/// Returns `None` if the event is not informational (`kind = event`).
#[must_use]
pub fn entry_leader_stand_in(event: &ProcessEvent) -> Option<ProcessEvent> {
    if event.kind() != Some(EventKind::Event) {
        return None;
    }

    let mut stand_in = event.clone();
    let process = stand_in.process.get_or_insert_with(ProcessFields::default);

    if let Some(leader) = process.entry_leader.clone() {
        // Overlay: fields the leader knows replace the event's own values
        if leader.entity_id.is_some() {
            process.entity_id = leader.entity_id;
        }
        if leader.pid.is_some() {
            process.pid = leader.pid;
        }
        if leader.name.is_some() {
            process.name = leader.name;
        }
        if leader.executable.is_some() {
            process.executable = leader.executable;
        }
        if !leader.args.is_empty() {
            process.args = leader.args;
        }
        if leader.working_directory.is_some() {
            process.working_directory = leader.working_directory;
        }
        if leader.start.is_some() {
            process.start = leader.start;
        }
        if leader.tty.is_some() {
            process.tty = leader.tty;
        }
        if leader.user.is_some() {
            process.user = leader.user;
        }
    }

    Some(stand_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_view_common::{AlertInfo, EventMeta, ProcessLink};

    fn event(kind: Option<EventKind>, action: Option<EventAction>, id: Option<&str>) -> ProcessEvent {
        ProcessEvent {
            timestamp: Some("2024-03-01T10:00:00.000Z".to_string()),
            event: Some(EventMeta { id: Some("e".to_string()), kind, action }),
            process: Some(ProcessFields {
                entity_id: id.map(str::to_string),
                parent: Some(ProcessLink { entity_id: Some("P".to_string()), ..Default::default() }),
                ..Default::default()
            }),
            alert: None,
        }
    }

    #[test]
    fn test_classify_exec() {
        let e = event(Some(EventKind::Event), Some(EventAction::Exec), Some("A"));
        let c = classify(&e).unwrap();
        assert_eq!(c.identity, ProcessId::from("A"));
        assert_eq!(c.parent_identity, Some(ProcessId::from("P")));
        assert_eq!(c.category, EventCategory::Exec);
    }

    #[test]
    fn test_classify_missing_identity() {
        let e = event(Some(EventKind::Event), Some(EventAction::Fork), None);
        assert_eq!(classify(&e), None);
    }

    #[test]
    fn test_alert_wins_over_action() {
        let mut e = event(Some(EventKind::Event), Some(EventAction::Exec), Some("A"));
        e.alert = Some(AlertInfo { uuid: Some("al-1".to_string()), ..Default::default() });
        assert_eq!(categorize(&e), EventCategory::Alert);

        let kind_only = event(Some(EventKind::Alert), Some(EventAction::Exec), Some("A"));
        assert_eq!(categorize(&kind_only), EventCategory::Alert);
    }

    #[test]
    fn test_informational_event_is_generic_but_keeps_identity() {
        let e = event(Some(EventKind::Event), None, Some("A"));
        let c = classify(&e).unwrap();
        assert_eq!(c.category, EventCategory::Generic);
        assert_eq!(c.parent_identity, Some(ProcessId::from("P")));
    }

    #[test]
    fn test_entry_leader_stand_in_overlays_leader_fields() {
        let mut e = event(Some(EventKind::Event), Some(EventAction::Exec), Some("A"));
        if let Some(process) = e.process.as_mut() {
            process.args = vec!["ls".to_string()];
            process.entry_leader = Some(ProcessLink {
                entity_id: Some("S".to_string()),
                pid: Some(100),
                args: vec!["bash".to_string()],
                ..Default::default()
            });
        }

        let stand_in = entry_leader_stand_in(&e).unwrap();
        let process = stand_in.process.unwrap();
        assert_eq!(process.entity_id.as_deref(), Some("S"));
        assert_eq!(process.pid, Some(100));
        assert_eq!(process.args, vec!["bash".to_string()]);
        // Parent link belongs to the original event
        assert_eq!(process.parent.unwrap().entity_id.as_deref(), Some("P"));
    }

    #[test]
    fn test_entry_leader_stand_in_requires_informational_kind() {
        let e = event(Some(EventKind::Alert), Some(EventAction::Exec), Some("A"));
        assert_eq!(entry_leader_stand_in(&e), None);
    }
}
