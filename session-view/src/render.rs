//! Headless text rendering of a session tree.
//!
//! One line per visible process, indented two spaces per level:
//!
//! ```text
//! /home/dev bash  [entry leader]
//!   $ /home/dev cargo build --release  (exited 0)
//!     /home/dev rustc --crate-name demo  [alerts: 1]
//!   /tmp curl evil.example  *  [orphan]
//! ```
//!
//! Markers: `$` command typed at the session prompt, `*` search match,
//! `[alerts: N]`, `(running)` / `(exited N)`, `[orphan]` for nodes still
//! waiting for their parent.

use std::collections::HashSet;
use std::fmt;

use crate::analysis::search_text;
use crate::domain::{ProcessId, ProcessState};
use crate::process::{ProcessMap, ProcessNode};

/// Displays the visible tree below the map's root.
pub struct TreeDisplay<'a> {
    map: &'a ProcessMap,
    verbose_mode: bool,
}

impl<'a> TreeDisplay<'a> {
    #[must_use]
    pub fn new(map: &'a ProcessMap, verbose_mode: bool) -> Self {
        Self { map, verbose_mode }
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &'a ProcessNode,
        depth: usize,
        visited: &mut HashSet<&'a ProcessId>,
    ) -> fmt::Result {
        if !visited.insert(node.id()) {
            return Ok(());
        }
        writeln!(f, "{}{}", "  ".repeat(depth), node_label(self.map, node))?;

        for child in node.get_children(self.map, self.verbose_mode) {
            self.write_node(f, child, depth + 1, visited)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visited = HashSet::new();
        self.write_node(f, self.map.root(), 0, &mut visited)
    }
}

/// Render the visible tree below the map's root.
#[must_use]
pub fn render_tree(map: &ProcessMap, verbose_mode: bool) -> String {
    TreeDisplay::new(map, verbose_mode).to_string()
}

/// Single-line label for a node, without indentation.
#[must_use]
pub fn node_label(map: &ProcessMap, node: &ProcessNode) -> String {
    let text = search_text(node);
    let command = match text.trim() {
        "" => node.id().to_string(),
        command => command.to_string(),
    };

    let mut markers = Vec::new();
    if node.search_matched().is_match() {
        markers.push("*".to_string());
    }
    if node.is_entry_leader() {
        markers.push("[entry leader]".to_string());
    } else if map.root().orphans().contains(node.id()) {
        markers.push("[orphan]".to_string());
    }

    match node.state() {
        ProcessState::Ended => match node.details().and_then(|p| p.exit_code) {
            Some(code) => markers.push(format!("(exited {code})")),
            None => markers.push("(exited)".to_string()),
        },
        ProcessState::Active if node.has_exec() => markers.push("(running)".to_string()),
        _ => {}
    }

    if node.has_alerts() {
        markers.push(format!("[alerts: {}]", node.alerts().len()));
    }

    let prompt = if node.is_user_entered() { "$ " } else { "" };
    std::iter::once(format!("{prompt}{command}")).chain(markers).collect::<Vec<_>>().join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageDirection;
    use crate::tree::process_new_events;
    use session_view_common::{EventAction, EventKind, EventMeta, ProcessEvent, ProcessFields, ProcessLink, Tty};

    fn event(event_id: &str, id: &str, parent: &str, action: EventAction, args: &[&str]) -> ProcessEvent {
        ProcessEvent {
            timestamp: Some(format!("2024-03-01T10:00:0{}.000Z", event_id.len())),
            event: Some(EventMeta { id: Some(event_id.to_string()), kind: Some(EventKind::Event), action: Some(action) }),
            process: Some(ProcessFields {
                entity_id: Some(id.to_string()),
                args: args.iter().map(|a| (*a).to_string()).collect(),
                exit_code: (action == EventAction::End).then_some(0),
                parent: Some(ProcessLink { entity_id: Some(parent.to_string()), ..Default::default() }),
                ..Default::default()
            }),
            alert: None,
        }
    }

    #[test]
    fn test_render_indents_children() {
        let root = ProcessId::from("S");
        let mut map = ProcessMap::new(root.clone());
        let events = vec![
            event("e1", "A", "S", EventAction::Exec, &["make"]),
            event("e22", "B", "A", EventAction::Exec, &["cc", "main.c"]),
            event("e333", "A", "S", EventAction::End, &["make"]),
        ];
        process_new_events(&mut map, &events, &root, PageDirection::Forward).unwrap();

        let text = render_tree(&map, true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["S", "  make  (exited 0)", "    cc main.c  (running)"]);
    }

    #[test]
    fn test_render_marks_user_entered_commands() {
        let root = ProcessId::from("S");
        let mut map = ProcessMap::new(root.clone());
        let mut typed = event("e1", "A", "S", EventAction::Exec, &["make"]);
        if let Some(process) = typed.process.as_mut() {
            process.pid = Some(200);
            process.tty = Some(Tty::default());
            process.parent = Some(ProcessLink { entity_id: Some("S".to_string()), pid: Some(100), ..Default::default() });
            process.session_leader = Some(ProcessLink { pid: Some(100), ..Default::default() });
            process.group_leader = Some(ProcessLink { pid: Some(200), ..Default::default() });
        }
        process_new_events(&mut map, &[typed], &root, PageDirection::Forward).unwrap();

        let node = map.get("A").unwrap();
        assert_eq!(node_label(&map, node), "$ make  (running)");
    }

    #[test]
    fn test_render_marks_orphans() {
        let root = ProcessId::from("S");
        let mut map = ProcessMap::new(root.clone());
        let events = vec![event("e1", "X", "gone", EventAction::Exec, &["curl"])];
        process_new_events(&mut map, &events, &root, PageDirection::Forward).unwrap();

        let text = render_tree(&map, true);
        assert!(text.contains("  curl  [orphan]  (running)"));
    }
}
