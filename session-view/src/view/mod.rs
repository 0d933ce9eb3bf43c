//! View projection: what the renderer shows under each node.
//!
//! # Ordering
//!
//! Siblings are ordered by start time (see [`ProcessNode::start_time`]),
//! nodes without any start time after all timed ones, ties broken by
//! identity. Timestamps are RFC 3339 UTC strings and compare correctly as
//! strings. The comparator is total, and the sort is stable.
//!
//! # Noise Filter
//!
//! With verbose mode off a child is shown only if it auto-expands, has
//! alerts, or has events and is not classified verbose. Alerts and expansion
//! always win: a flagged process is never hidden.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::ProcessId;
use crate::process::{ProcessMap, ProcessNode};

/// Sibling comparator.
#[must_use]
pub fn compare_nodes(a: &ProcessNode, b: &ProcessNode) -> Ordering {
    match (a.start_time(), b.start_time()) {
        (Some(a_start), Some(b_start)) => a_start.cmp(b_start),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id().cmp(b.id()))
}

/// Sort identities by the sibling comparator. Unknown identities go last.
pub fn sort_ids(map: &ProcessMap, ids: &mut [ProcessId]) {
    ids.sort_by(|a, b| match (map.get(a.as_str()), map.get(b.as_str())) {
        (Some(a_node), Some(b_node)) => compare_nodes(a_node, b_node),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// Returns true if `child` survives the non-verbose filter.
#[must_use]
pub fn is_shown(child: &ProcessNode, verbose_mode: bool) -> bool {
    if verbose_mode || child.auto_expand() || child.has_alerts() {
        return true;
    }
    !child.events().is_empty() && !child.is_verbose()
}

/// Children followed by orphans of `node`, filtered and sorted for display.
///
/// Each identity appears at most once.
#[must_use]
pub fn visible_children<'a>(
    map: &'a ProcessMap,
    node: &ProcessNode,
    verbose_mode: bool,
) -> Vec<&'a ProcessNode> {
    let mut seen = HashSet::new();
    let mut children: Vec<&ProcessNode> = node
        .children()
        .iter()
        .chain(node.orphans())
        .filter(|id| seen.insert(*id))
        .filter_map(|id| map.get(id.as_str()))
        .filter(|child| is_shown(child, verbose_mode))
        .collect();

    children.sort_by(|a, b| compare_nodes(a, b));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageDirection;
    use crate::tree::{process_new_events, update_process_map};
    use session_view_common::{
        AlertInfo, EventAction, EventKind, EventMeta, ProcessEvent, ProcessFields, ProcessLink,
    };

    fn link(id: &str, pid: u32) -> Option<ProcessLink> {
        Some(ProcessLink { entity_id: Some(id.to_string()), pid: Some(pid), ..Default::default() })
    }

    /// `group_pid == 1` makes the process noise (group led by the session leader).
    fn fork(id: &str, parent: &str, ts: &str, group_pid: u32) -> ProcessEvent {
        ProcessEvent {
            timestamp: Some(ts.to_string()),
            event: Some(EventMeta {
                id: Some(format!("{id}-fork")),
                kind: Some(EventKind::Event),
                action: Some(EventAction::Fork),
            }),
            process: Some(ProcessFields {
                entity_id: Some(id.to_string()),
                parent: link(parent, 0),
                group_leader: Some(ProcessLink { pid: Some(group_pid), ..Default::default() }),
                session_leader: link("S", 1),
                entry_leader: link("S", 1),
                ..Default::default()
            }),
            alert: None,
        }
    }

    fn ids(nodes: &[&ProcessNode]) -> Vec<String> {
        nodes.iter().map(|n| n.id().to_string()).collect()
    }

    fn root() -> ProcessId {
        ProcessId::from("S")
    }

    #[test]
    fn test_children_sorted_by_start_time_then_id() {
        let mut map = ProcessMap::new(root());
        let events = vec![
            fork("C", "S", "2024-03-01T10:00:03.000Z", 30),
            fork("B", "S", "2024-03-01T10:00:01.000Z", 20),
            fork("A", "S", "2024-03-01T10:00:03.000Z", 10),
        ];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();

        let children = map.root().get_children(&map, true);
        assert_eq!(ids(&children), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_orphans_rendered_inline_under_root() {
        let mut map = ProcessMap::new(root());
        let events = vec![
            fork("A", "S", "2024-03-01T10:00:02.000Z", 10),
            fork("X", "missing", "2024-03-01T10:00:01.000Z", 20),
        ];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();

        let children = map.root().get_children(&map, true);
        assert_eq!(ids(&children), vec!["X", "A"]);
    }

    #[test]
    fn test_non_verbose_filters_noise() {
        let mut map = ProcessMap::new(root());
        let events = vec![
            fork("A", "S", "2024-03-01T10:00:01.000Z", 10),
            fork("N", "S", "2024-03-01T10:00:02.000Z", 1),
        ];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();

        assert_eq!(ids(&map.root().get_children(&map, true)), vec!["A", "N"]);
        assert_eq!(ids(&map.root().get_children(&map, false)), vec!["A"]);
    }

    #[test]
    fn test_alerts_keep_noise_visible() {
        let mut map = ProcessMap::new(root());
        let events = vec![fork("N", "S", "2024-03-01T10:00:02.000Z", 1)];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();
        assert!(map.root().get_children(&map, false).is_empty());

        let mut alert = fork("N", "S", "2024-03-01T10:00:03.000Z", 1);
        alert.alert = Some(AlertInfo { uuid: Some("al-1".to_string()), ..Default::default() });
        update_process_map(&mut map, &[alert], &root()).unwrap();

        assert_eq!(ids(&map.root().get_children(&map, false)), vec!["N"]);
    }

    #[test]
    fn test_auto_expanded_noise_stays_visible() {
        let mut map = ProcessMap::new(root());
        let events = vec![fork("N", "S", "2024-03-01T10:00:02.000Z", 1)];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();

        crate::analysis::auto_expand_process_tree(&mut map, Some(&ProcessId::from("N")));
        assert_eq!(ids(&map.root().get_children(&map, false)), vec!["N"]);
    }

    #[test]
    fn test_get_children_is_stable_and_deduplicated() {
        let mut map = ProcessMap::new(root());
        let events = vec![
            fork("A", "S", "2024-03-01T10:00:01.000Z", 10),
            fork("B", "S", "2024-03-01T10:00:01.000Z", 20),
        ];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();
        // Re-delivery of the same batch in the other direction
        process_new_events(&mut map, &events, &root(), PageDirection::Backward).unwrap();

        let first = ids(&map.root().get_children(&map, false));
        let second = ids(&map.root().get_children(&map, false));
        assert_eq!(first, vec!["A", "B"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_untimed_nodes_sort_last() {
        let mut map = ProcessMap::new(root());
        let mut untimed = fork("A", "S", "", 10);
        untimed.timestamp = None;
        let events = vec![untimed, fork("B", "S", "2024-03-01T10:00:01.000Z", 20)];
        process_new_events(&mut map, &events, &root(), PageDirection::Forward).unwrap();

        assert_eq!(ids(&map.root().get_children(&map, true)), vec!["B", "A"]);
    }
}
