use std::collections::HashSet;
use std::io::Write;

use serde::Serialize;
use session_view_common::AlertStatus;

use crate::analysis::search_text;
use crate::domain::{ExportError, ProcessId};
use crate::process::{ProcessMap, ProcessNode};
use crate::session::SessionTree;

/// Serializable view of a whole session tree
#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot {
    pub session_entity_id: String,
    /// Map version the snapshot was taken at
    pub version: u64,
    pub process_count: usize,
    pub verbose_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    pub search_results: Vec<String>,
    /// Identities still waiting for their parent
    pub orphans: Vec<String>,
    pub root: SnapshotNode,
}

/// One visible process and its visible descendants
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotNode {
    pub entity_id: String,
    pub command: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    /// Command typed at the session prompt
    pub user_entered: bool,
    pub search_matched: bool,
    pub auto_expand: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<SnapshotAlert>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
}

impl TreeSnapshot {
    /// Capture the session's tree as currently visible.
    #[must_use]
    pub fn from_session(tree: &SessionTree) -> Self {
        let map = tree.process_map();
        let options = tree.options();
        let mut visited = HashSet::new();

        Self {
            session_entity_id: map.root_id().to_string(),
            version: map.version(),
            process_count: map.len(),
            verbose_mode: options.verbose_mode,
            search_query: options.search_query.clone(),
            search_results: tree.search_results().iter().map(ToString::to_string).collect(),
            orphans: map.root().orphans().iter().map(ToString::to_string).collect(),
            root: snapshot_node(map, map.root(), options.verbose_mode, &mut visited),
        }
    }
}

fn snapshot_node<'a>(
    map: &'a ProcessMap,
    node: &'a ProcessNode,
    verbose_mode: bool,
    visited: &mut HashSet<&'a ProcessId>,
) -> SnapshotNode {
    visited.insert(node.id());

    let unvisited: Vec<&ProcessNode> = node
        .get_children(map, verbose_mode)
        .into_iter()
        .filter(|child| !visited.contains(child.id()))
        .collect();
    let children = unvisited
        .into_iter()
        .map(|child| snapshot_node(map, child, verbose_mode, visited))
        .collect();

    let alerts = node
        .alerts()
        .iter()
        .map(|alert| {
            let info = alert.alert.as_ref();
            SnapshotAlert {
                uuid: info.and_then(|a| a.uuid.clone()),
                rule: info.and_then(|a| a.rule.as_ref()).and_then(|r| r.name.clone()),
                status: info.and_then(|a| a.workflow_status),
            }
        })
        .collect();

    SnapshotNode {
        entity_id: node.id().to_string(),
        command: search_text(node).trim().to_string(),
        state: node.state().to_string(),
        start: node.start_time().map(str::to_string),
        end: node.end_time().map(str::to_string),
        exit_code: node.details().and_then(|p| p.exit_code),
        user_entered: node.is_user_entered(),
        search_matched: node.search_matched().is_match(),
        auto_expand: node.auto_expand(),
        alerts,
        children,
    }
}

/// Write a pretty-printed JSON snapshot of `tree` to any writer.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the writer fails.
///
/// # Example
/// ```no_run
/// use session_view::export::export_snapshot;
/// use session_view::session::{SessionTree, ViewOptions};
/// use std::fs::File;
/// use std::io::BufWriter;
///
/// # fn example() -> anyhow::Result<()> {
/// let tree = SessionTree::new("session-1", None, ViewOptions::default());
///
/// let writer = BufWriter::new(File::create("snapshot.json")?);
/// export_snapshot(&tree, writer)?;
///
/// // Or write to a buffer
/// let mut buffer = Vec::new();
/// export_snapshot(&tree, &mut buffer)?;
/// # Ok(())
/// # }
/// ```
pub fn export_snapshot<W: Write>(tree: &SessionTree, mut writer: W) -> Result<(), ExportError> {
    let snapshot = TreeSnapshot::from_session(tree);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::debug!("Exported snapshot of {} processes at v{}", snapshot.process_count, snapshot.version);
    Ok(())
}
