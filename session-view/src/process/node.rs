//! Process node: the unit of the session tree.
//!
//! A node owns everything known about one process: its event log (fork,
//! exec, output, end and informational records, in arrival order), its alert
//! log, and the identities of the children and orphans placed under it. The
//! parent link is a non-owning identity; the [`ProcessMap`] arena owns every
//! node.
//!
//! # Derived State
//!
//! Most questions the view asks ("has it exited?", "is it shell noise?") are
//! answered from the node's *details*: the most recent lifecycle event. That
//! lookup is cached per node and keyed by the event log length. The log is
//! append-only, so a length change is exactly a content change; the cache is
//! recomputed lazily on the first read after an append.
//!
//! # Heuristics
//!
//! [`ProcessNode::is_verbose`] and [`ProcessNode::is_user_entered`] are
//! best-effort classifications with known false positives. They only drive
//! filtering and auto-expansion in the view.

use std::cell::Cell;

use session_view_common::{AlertStatus, EventAction, ProcessEvent, ProcessFields, ProcessLink};

use super::map::ProcessMap;
use crate::domain::{ProcessId, ProcessState, SearchMatch};

/// Indices into the event log, valid while `log_len == events.len()`.
#[derive(Debug, Clone, Copy)]
struct DetailsCache {
    log_len: usize,
    /// Latest end, else latest exec, else latest fork
    latest_lifecycle: Option<usize>,
    /// First fork/exec/end in log order (start time source)
    first_lifecycle: Option<usize>,
    /// `latest_lifecycle`, else the latest event carrying process attributes
    details: Option<usize>,
}

impl DetailsCache {
    fn compute(events: &[ProcessEvent]) -> Self {
        let mut last_fork = None;
        let mut last_exec = None;
        let mut last_end = None;
        let mut first_lifecycle = None;
        let mut last_with_process = None;

        for (i, event) in events.iter().enumerate() {
            if event.process.is_some() {
                last_with_process = Some(i);
            }
            let Some(action) = event.action().filter(|a| a.is_lifecycle()) else {
                continue;
            };
            match action {
                EventAction::Fork => last_fork = Some(i),
                EventAction::Exec => last_exec = Some(i),
                _ => last_end = Some(i),
            }
            if first_lifecycle.is_none() {
                first_lifecycle = Some(i);
            }
        }

        // End is terminal: later (malformed) fork/exec records never displace it
        let latest_lifecycle = last_end.or(last_exec).or(last_fork);

        Self {
            log_len: events.len(),
            latest_lifecycle,
            first_lifecycle,
            details: latest_lifecycle.or(last_with_process),
        }
    }
}

/// One process in the session tree.
#[derive(Debug)]
pub struct ProcessNode {
    id: ProcessId,
    events: Vec<ProcessEvent>,
    alerts: Vec<ProcessEvent>,

    // Tree links, maintained by the tree builder
    pub(crate) parent: Option<ProcessId>,
    pub(crate) children: Vec<ProcessId>,
    /// Nodes rendered inline under this one until their parent resolves.
    /// Only the session root uses this list.
    pub(crate) orphans: Vec<ProcessId>,

    // Ephemeral view flags
    pub(crate) expanded_by_search: bool,
    pub(crate) expanded_by_jump: bool,
    pub(crate) search_matched: SearchMatch,

    details_cache: Cell<Option<DetailsCache>>,
}

impl ProcessNode {
    /// Create an empty node (state [`ProcessState::Created`]).
    #[must_use]
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            events: Vec::new(),
            alerts: Vec::new(),
            parent: None,
            children: Vec::new(),
            orphans: Vec::new(),
            expanded_by_search: false,
            expanded_by_jump: false,
            search_matched: SearchMatch::Unset,
            details_cache: Cell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    #[must_use]
    pub fn events(&self) -> &[ProcessEvent] {
        &self.events
    }

    #[must_use]
    pub fn alerts(&self) -> &[ProcessEvent] {
        &self.alerts
    }

    /// Parent identity, once the node has been attached.
    #[must_use]
    pub fn parent(&self) -> Option<&ProcessId> {
        self.parent.as_ref()
    }

    /// Attached children in insertion order (unfiltered, unsorted).
    #[must_use]
    pub fn children(&self) -> &[ProcessId] {
        &self.children
    }

    #[must_use]
    pub fn orphans(&self) -> &[ProcessId] {
        &self.orphans
    }

    #[must_use]
    pub fn search_matched(&self) -> &SearchMatch {
        &self.search_matched
    }

    /// Whether the view should reveal this node's children without user
    /// interaction (it leads to a search match or a jump target).
    #[must_use]
    pub fn auto_expand(&self) -> bool {
        self.expanded_by_search || self.expanded_by_jump
    }

    // =========================================================================
    // LOG MUTATION
    // =========================================================================

    /// Append an event unless one with the same event id is already logged.
    ///
    /// Events without an id cannot be deduplicated and are always appended.
    /// Returns `true` if the event was added.
    pub fn add_event(&mut self, event: ProcessEvent) -> bool {
        if let Some(new_id) = event.event_id() {
            if self.events.iter().any(|e| e.event_id() == Some(new_id)) {
                return false;
            }
        }
        self.events.push(event);
        true
    }

    /// Append an alert. The alert source does not re-deliver alerts.
    pub fn add_alert(&mut self, alert: ProcessEvent) {
        self.alerts.push(alert);
    }

    /// Set the workflow status of every alert with the given uuid.
    ///
    /// Returns the number of alerts updated.
    pub fn update_alert_status(&mut self, alert_uuid: &str, status: AlertStatus) -> usize {
        let mut updated = 0;
        for alert in &mut self.alerts {
            if let Some(info) = alert.alert.as_mut() {
                if info.uuid.as_deref() == Some(alert_uuid) {
                    info.workflow_status = Some(status);
                    updated += 1;
                }
            }
        }
        updated
    }

    pub fn clear_search(&mut self) {
        self.search_matched = SearchMatch::Unset;
    }

    // =========================================================================
    // DERIVED STATE
    // =========================================================================

    fn cache(&self) -> DetailsCache {
        if let Some(cached) = self.details_cache.get() {
            if cached.log_len == self.events.len() {
                return cached;
            }
        }
        let fresh = DetailsCache::compute(&self.events);
        self.details_cache.set(Some(fresh));
        fresh
    }

    /// Most recent lifecycle event: the end event if there is one, else the
    /// latest exec, else the latest fork.
    ///
    /// Ordering is by log position, not timestamp.
    #[must_use]
    pub fn latest_lifecycle_event(&self) -> Option<&ProcessEvent> {
        self.cache().latest_lifecycle.map(|i| &self.events[i])
    }

    /// Event used as the source of this process's current attributes.
    ///
    /// The latest lifecycle event, or for nodes known only through
    /// informational events, the latest event carrying process attributes.
    #[must_use]
    pub fn details_event(&self) -> Option<&ProcessEvent> {
        self.cache().details.map(|i| &self.events[i])
    }

    /// Process attributes from [`Self::details_event`].
    #[must_use]
    pub fn details(&self) -> Option<&ProcessFields> {
        self.details_event()?.process.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> ProcessState {
        match self.latest_lifecycle_event().and_then(ProcessEvent::action) {
            Some(EventAction::End) => ProcessState::Ended,
            Some(_) => ProcessState::Active,
            None => ProcessState::Created,
        }
    }

    /// Start time used for ordering siblings.
    ///
    /// `process.start` of the first lifecycle event, else that event's
    /// timestamp, else the timestamp of the first event of any kind.
    #[must_use]
    pub fn start_time(&self) -> Option<&str> {
        match self.cache().first_lifecycle.map(|i| &self.events[i]) {
            Some(event) => event
                .process
                .as_ref()
                .and_then(|p| p.start.as_deref())
                .or(event.timestamp.as_deref()),
            None => self.events.first().and_then(|e| e.timestamp.as_deref()),
        }
    }

    /// Timestamp of the end event, if the process has exited.
    #[must_use]
    pub fn end_time(&self) -> Option<&str> {
        self.find_event_by_action(EventAction::End)?.timestamp.as_deref()
    }

    fn find_event_by_action(&self, action: EventAction) -> Option<&ProcessEvent> {
        self.events.iter().find(|e| e.action() == Some(action))
    }

    #[must_use]
    pub fn has_output(&self) -> bool {
        self.find_event_by_action(EventAction::Output).is_some()
    }

    #[must_use]
    pub fn has_exec(&self) -> bool {
        self.find_event_by_action(EventAction::Exec).is_some()
    }

    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.find_event_by_action(EventAction::End).is_some()
    }

    #[must_use]
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Returns true if an alert with this uuid is attached. Empty uuids never match.
    #[must_use]
    pub fn has_alert(&self, alert_uuid: &str) -> bool {
        !alert_uuid.is_empty() && self.alerts.iter().any(|a| a.alert_uuid() == Some(alert_uuid))
    }

    /// Returns true if this is the entry leader of its own session.
    #[must_use]
    pub fn is_entry_leader(&self) -> bool {
        self.details()
            .and_then(|p| p.entry_leader.as_ref())
            .and_then(|leader| leader.entity_id.as_deref())
            == Some(self.id.as_str())
    }

    /// Shell-noise heuristic.
    ///
    /// A process whose group leader is the session leader itself (or whose
    /// leader info is missing) is treated as noise: shells fork a lot of these
    /// for completion, prompt rendering and rc-file startup. The entry leader
    /// is never verbose.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        if self.is_entry_leader() {
            return false;
        }

        let Some(process) = self.details() else {
            return true;
        };

        match (&process.group_leader, &process.session_leader) {
            (Some(group_leader), Some(session_leader)) => group_leader.pid == session_leader.pid,
            _ => true,
        }
    }

    /// Best guess at whether a person typed this command.
    ///
    /// In an interactive session (controlling tty present) a shell runs a
    /// typed command by forking, creating a new process group and exec'ing.
    /// So: tty present, parent is the session leader, and the process leads
    /// its own group.
    #[must_use]
    pub fn is_user_entered(&self) -> bool {
        let Some(process) = self.details() else {
            return false;
        };

        let link_pid = |link: &Option<ProcessLink>| link.as_ref().map(|l| l.pid);

        let session_is_interactive = process.tty.is_some();
        let parent_is_session_leader = match (link_pid(&process.parent), link_pid(&process.session_leader)) {
            (Some(parent_pid), Some(session_leader_pid)) => parent_pid == session_leader_pid,
            _ => false,
        };
        let is_group_leader = link_pid(&process.group_leader).is_some_and(|pid| pid == process.pid);

        session_is_interactive && parent_is_session_leader && is_group_leader
    }

    // =========================================================================
    // TREE QUERIES
    // =========================================================================

    /// Walk parent links looking for `candidate`.
    ///
    /// A node is never its own descendant; the root is a descendant of nothing.
    #[must_use]
    pub fn is_descendant_of(&self, candidate: &ProcessId, map: &ProcessMap) -> bool {
        map.ancestors(&self.id).any(|ancestor| ancestor.id() == candidate)
    }

    /// Children plus orphans, filtered for the view and sorted.
    /// See [`crate::view::visible_children`].
    #[must_use]
    pub fn get_children<'a>(&self, map: &'a ProcessMap, verbose_mode: bool) -> Vec<&'a ProcessNode> {
        crate::view::visible_children(map, self, verbose_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_view_common::{AlertInfo, EventKind, EventMeta, Tty};

    fn link(id: &str, pid: u32) -> Option<ProcessLink> {
        Some(ProcessLink { entity_id: Some(id.to_string()), pid: Some(pid), ..Default::default() })
    }

    fn lifecycle(event_id: &str, action: EventAction, ts: &str) -> ProcessEvent {
        ProcessEvent {
            timestamp: Some(ts.to_string()),
            event: Some(EventMeta {
                id: Some(event_id.to_string()),
                kind: Some(EventKind::Event),
                action: Some(action),
            }),
            process: Some(ProcessFields {
                entity_id: Some("A".to_string()),
                pid: Some(20),
                parent: link("S", 10),
                group_leader: link("A", 20),
                session_leader: link("S", 10),
                entry_leader: link("S", 10),
                ..Default::default()
            }),
            alert: None,
        }
    }

    fn alert(uuid: &str) -> ProcessEvent {
        ProcessEvent {
            alert: Some(AlertInfo {
                uuid: Some(uuid.to_string()),
                workflow_status: Some(AlertStatus::Open),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_event_deduplicates_by_event_id() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        assert!(node.add_event(lifecycle("e1", EventAction::Fork, "t1")));
        assert!(!node.add_event(lifecycle("e1", EventAction::Fork, "t1")));
        assert!(node.add_event(lifecycle("e2", EventAction::Exec, "t2")));
        assert_eq!(node.events().len(), 2);
    }

    #[test]
    fn test_events_without_id_always_appended() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        let mut e = lifecycle("x", EventAction::Exec, "t1");
        e.event = None;
        assert!(node.add_event(e.clone()));
        assert!(node.add_event(e));
        assert_eq!(node.events().len(), 2);
    }

    #[test]
    fn test_latest_lifecycle_prefers_exec_over_fork() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        assert!(node.latest_lifecycle_event().is_none());
        assert_eq!(node.state(), ProcessState::Created);

        node.add_event(lifecycle("e1", EventAction::Fork, "t1"));
        assert_eq!(node.latest_lifecycle_event().unwrap().event_id(), Some("e1"));
        assert_eq!(node.state(), ProcessState::Active);

        node.add_event(lifecycle("e2", EventAction::Exec, "t2"));
        node.add_event(lifecycle("e3", EventAction::Output, "t3"));
        assert_eq!(node.latest_lifecycle_event().unwrap().event_id(), Some("e2"));
    }

    #[test]
    fn test_end_event_is_terminal() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_event(lifecycle("e1", EventAction::Fork, "t1"));
        node.add_event(lifecycle("e2", EventAction::End, "t2"));
        assert_eq!(node.state(), ProcessState::Ended);

        // Malformed late records must not displace the end event
        node.add_event(lifecycle("e3", EventAction::Exec, "t3"));
        node.add_event(lifecycle("e4", EventAction::Fork, "t4"));

        assert_eq!(node.latest_lifecycle_event().unwrap().event_id(), Some("e2"));
        assert_eq!(node.state(), ProcessState::Ended);
        assert_eq!(node.end_time(), Some("t2"));
    }

    #[test]
    fn test_details_fall_back_to_informational_event() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        let mut info = lifecycle("e1", EventAction::Other, "t1");
        info.event.as_mut().unwrap().action = None;
        node.add_event(info);

        assert!(node.latest_lifecycle_event().is_none());
        assert_eq!(node.details().unwrap().pid, Some(20));
        assert_eq!(node.start_time(), Some("t1"));
    }

    #[test]
    fn test_start_time_prefers_process_start() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        let mut fork = lifecycle("e1", EventAction::Fork, "t5");
        fork.process.as_mut().unwrap().start = Some("t4".to_string());
        node.add_event(fork);
        assert_eq!(node.start_time(), Some("t4"));
    }

    #[test]
    fn test_non_lifecycle_events_do_not_set_start() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_event(lifecycle("e1", EventAction::Output, "t1"));
        node.add_event(lifecycle("e2", EventAction::Other, "t2"));
        node.add_event(lifecycle("e3", EventAction::Fork, "t3"));

        assert_eq!(node.start_time(), Some("t3"));
        assert_eq!(node.latest_lifecycle_event().and_then(ProcessEvent::event_id), Some("e3"));
    }

    #[test]
    fn test_boolean_derivations() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        assert!(!node.has_exec());
        assert!(!node.has_output());
        assert!(!node.has_exited());

        node.add_event(lifecycle("e1", EventAction::Exec, "t1"));
        node.add_event(lifecycle("e2", EventAction::Output, "t2"));
        assert!(node.has_exec());
        assert!(node.has_output());
        assert!(!node.has_exited());
    }

    #[test]
    fn test_alerts() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        assert!(!node.has_alerts());
        assert!(!node.has_alert(""));

        node.add_alert(alert("al-1"));
        assert!(node.has_alerts());
        assert!(node.has_alert("al-1"));
        assert!(!node.has_alert("al-2"));
        assert!(!node.has_alert(""));
    }

    #[test]
    fn test_update_alert_status() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_alert(alert("al-1"));
        node.add_alert(alert("al-2"));

        assert_eq!(node.update_alert_status("al-2", AlertStatus::Acknowledged), 1);
        assert_eq!(node.update_alert_status("missing", AlertStatus::Closed), 0);

        let statuses: Vec<_> =
            node.alerts().iter().map(|a| a.alert.as_ref().unwrap().workflow_status).collect();
        assert_eq!(statuses, vec![Some(AlertStatus::Open), Some(AlertStatus::Acknowledged)]);
    }

    #[test]
    fn test_is_verbose_group_leader_is_session_leader() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        let mut e = lifecycle("e1", EventAction::Exec, "t1");
        e.process.as_mut().unwrap().group_leader = link("S", 10);
        node.add_event(e);
        assert!(node.is_verbose());
    }

    #[test]
    fn test_is_verbose_own_group() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_event(lifecycle("e1", EventAction::Exec, "t1"));
        assert!(!node.is_verbose());
    }

    #[test]
    fn test_is_verbose_missing_leader_info() {
        let node = ProcessNode::new(ProcessId::from("A"));
        assert!(node.is_verbose());

        let mut node = ProcessNode::new(ProcessId::from("A"));
        let mut e = lifecycle("e1", EventAction::Exec, "t1");
        e.process.as_mut().unwrap().session_leader = None;
        node.add_event(e);
        assert!(node.is_verbose());
    }

    #[test]
    fn test_entry_leader_is_never_verbose() {
        let mut node = ProcessNode::new(ProcessId::from("S"));
        let mut e = lifecycle("e1", EventAction::Exec, "t1");
        let process = e.process.as_mut().unwrap();
        process.entity_id = Some("S".to_string());
        process.group_leader = None;
        node.add_event(e);
        assert!(node.is_entry_leader());
        assert!(!node.is_verbose());
    }

    #[test]
    fn test_is_user_entered() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_event(lifecycle("e1", EventAction::Exec, "t1"));
        // No tty: not interactive
        assert!(!node.is_user_entered());

        let mut e = lifecycle("e2", EventAction::Exec, "t2");
        e.process.as_mut().unwrap().tty = Some(Tty { major: Some(136), minor: Some(0) });
        node.add_event(e);
        assert!(node.is_user_entered());

        let mut e = lifecycle("e3", EventAction::Exec, "t3");
        let process = e.process.as_mut().unwrap();
        process.tty = Some(Tty::default());
        process.group_leader = link("S", 10);
        node.add_event(e);
        assert!(!node.is_user_entered());
    }

    #[test]
    fn test_cache_refreshes_after_append() {
        let mut node = ProcessNode::new(ProcessId::from("A"));
        node.add_event(lifecycle("e1", EventAction::Fork, "t1"));
        assert_eq!(node.state(), ProcessState::Active);
        node.add_event(lifecycle("e2", EventAction::End, "t2"));
        assert_eq!(node.state(), ProcessState::Ended);
    }
}
