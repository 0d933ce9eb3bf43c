//! # Tree Building
//!
//! Consumes batches of session events and folds them into the [`ProcessMap`].
//!
//! ## Passes
//!
//! Each batch is applied in three passes:
//!
//! 1. **Record** - classify every event, create missing nodes, append the
//!    event to the node's event log (or alert log)
//! 2. **Attach** - link each node without a parent under its declared parent
//!    if that parent is already placed in the tree; otherwise park it in the
//!    root's orphan list. A node known only from an alert is in the map but
//!    not placed, so it never adopts children
//! 3. **Resolve** - retry every orphan against the now larger map
//!
//! Attachment waits until every event of the batch is recorded, so a child
//! that appears before its parent within the same page still attaches
//! directly.
//!
//! ## Paging Direction
//!
//! When paging backward the attach pass visits the batch in reverse and
//! inserts new children at the front of their sibling lists. Set membership
//! is identical in both directions; only the raw insertion order differs, and
//! the view sorts siblings anyway.
//!
//! ## Atomicity
//!
//! The root is validated before anything is touched and nothing after that
//! can fail, so a batch is either fully applied (and the map version bumped)
//! or rejected with the map unchanged.

use log::debug;
use session_view_common::ProcessEvent;

use crate::classification::{classify, EventCategory};
use crate::domain::{PageDirection, ProcessId, TreeError};
use crate::process::{ProcessMap, ProcessNode};

/// What applying one batch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Map version after the batch
    pub version: u64,
    /// Events appended to event logs
    pub events_recorded: usize,
    /// Alerts appended to alert logs
    pub alerts_recorded: usize,
    /// Events dropped because their event id was already logged
    pub duplicates: usize,
    /// Events dropped because they carry no process identity
    pub skipped: usize,
    /// Nodes created by this batch
    pub created: usize,
    /// Nodes linked under their parent in the attach pass
    pub attached: usize,
    /// Nodes newly parked in the orphan list
    pub orphaned: usize,
    /// Orphans re-parented in the resolve pass
    pub resolved: usize,
}

/// Applies one batch of events to a process map.
///
/// Short-lived: created per batch by [`process_new_events`] or
/// [`update_process_map`], which run every pass and bump the version.
struct TreeBuilder<'m> {
    map: &'m mut ProcessMap,
    root: ProcessId,
    direction: PageDirection,
    summary: BatchSummary,
}

impl<'m> TreeBuilder<'m> {
    /// Create a builder for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownRoot`] if `root` has no node in the map.
    fn new(
        map: &'m mut ProcessMap,
        root: &ProcessId,
        direction: PageDirection,
    ) -> Result<Self, TreeError> {
        if !map.contains(root.as_str()) {
            return Err(TreeError::UnknownRoot(root.clone()));
        }
        Ok(Self { map, root: root.clone(), direction, summary: BatchSummary::default() })
    }

    /// Record a single event on its node (pass 1).
    ///
    /// Returns the event's identity and declared parent, or `None` if the
    /// event was malformed.
    fn record_event(&mut self, event: &ProcessEvent) -> Option<(ProcessId, Option<ProcessId>)> {
        let Some(classified) = classify(event) else {
            debug!("Skipping event without process identity (event id {:?})", event.event_id());
            self.summary.skipped += 1;
            return None;
        };

        let (node, created) = self.map.get_or_create(&classified.identity);
        if created {
            self.summary.created += 1;
        }

        match classified.category {
            EventCategory::Alert => {
                node.add_alert(event.clone());
                self.summary.alerts_recorded += 1;
            }
            _ => {
                if node.add_event(event.clone()) {
                    self.summary.events_recorded += 1;
                } else {
                    self.summary.duplicates += 1;
                }
            }
        }

        Some((classified.identity, classified.parent_identity))
    }

    /// Place a node in the tree if it is not placed yet (pass 2).
    fn attach(&mut self, id: &ProcessId, parent_id: Option<&ProcessId>) {
        if *id == self.root {
            return;
        }
        match self.map.get(id.as_str()) {
            Some(node) if node.parent.is_none() => {}
            _ => return,
        }

        match parent_id {
            Some(parent_id) if self.can_attach(id, parent_id) => {
                self.link(id, parent_id, self.direction.is_backward());
                self.summary.attached += 1;
            }
            _ => {
                if self.park_orphan(id) {
                    self.summary.orphaned += 1;
                }
            }
        }
    }

    /// Retry every orphan against the current map (pass 3).
    fn resolve_orphans(&mut self) {
        let orphans = match self.map.get_mut(self.root.as_str()) {
            Some(root) => std::mem::take(&mut root.orphans),
            None => return,
        };

        let mut remaining = Vec::with_capacity(orphans.len());
        for id in orphans {
            let Some(node) = self.map.get(id.as_str()) else {
                continue;
            };
            if node.parent.is_some() {
                // Placed directly by a later event
                continue;
            }

            match declared_parent(node) {
                Some(parent_id) if self.can_attach(&id, &parent_id) => {
                    self.link(&id, &parent_id, false);
                    self.summary.resolved += 1;
                }
                _ => remaining.push(id),
            }
        }

        if let Some(root) = self.map.get_mut(self.root.as_str()) {
            // `link` may have pruned the list meanwhile; keep whatever is left
            for id in remaining {
                if !root.orphans.contains(&id) {
                    root.orphans.push(id);
                }
            }
        }
    }

    /// Finish the batch: bump the map version and return the summary.
    fn finish(mut self) -> BatchSummary {
        self.map.bump_version();
        self.summary.version = self.map.version();
        self.summary
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// A node can be linked under `parent_id` if the parent is placed in the
    /// tree and the link does not close a cycle.
    fn can_attach(&self, id: &ProcessId, parent_id: &ProcessId) -> bool {
        if id == parent_id {
            return false;
        }
        match self.map.get(parent_id.as_str()) {
            Some(parent) if self.is_placed(parent) => {
                !self.map.ancestors(parent_id).any(|ancestor| ancestor.id() == id)
            }
            _ => false,
        }
    }

    /// A node is placed if it is the root, has its own events (so it is
    /// attached or parked as an orphan), or hangs below the root.
    ///
    /// Nodes known only through alerts are not placed; linking under one
    /// would hide the child from the view.
    fn is_placed(&self, node: &ProcessNode) -> bool {
        *node.id() == self.root
            || !node.events().is_empty()
            || self.map.ancestors(node.id()).any(|ancestor| *ancestor.id() == self.root)
    }

    fn link(&mut self, id: &ProcessId, parent_id: &ProcessId, front: bool) {
        if let Some(root) = self.map.get_mut(self.root.as_str()) {
            root.orphans.retain(|orphan| orphan != id);
        }
        if let Some(node) = self.map.get_mut(id.as_str()) {
            node.parent = Some(parent_id.clone());
        }
        if let Some(parent) = self.map.get_mut(parent_id.as_str()) {
            if !parent.children.contains(id) {
                if front {
                    parent.children.insert(0, id.clone());
                } else {
                    parent.children.push(id.clone());
                }
            }
        }
    }

    /// Returns true if the node was not already an orphan.
    fn park_orphan(&mut self, id: &ProcessId) -> bool {
        let Some(root) = self.map.get_mut(self.root.as_str()) else {
            return false;
        };
        if root.orphans.contains(id) {
            return false;
        }
        root.orphans.push(id.clone());
        true
    }
}

/// Parent identity a node claims: from its details, else from the most recent
/// event that names a parent.
fn declared_parent(node: &ProcessNode) -> Option<ProcessId> {
    node.details_event()
        .and_then(ProcessEvent::parent_entity_id)
        .or_else(|| node.events().iter().rev().find_map(ProcessEvent::parent_entity_id))
        .map(ProcessId::from)
}

/// Apply a page of events to the map.
///
/// The root's orphan list carries orphans from batch to batch.
///
/// # Errors
///
/// Returns [`TreeError::UnknownRoot`] if `root` is not in the map; the map is
/// left untouched.
pub fn process_new_events(
    map: &mut ProcessMap,
    events: &[ProcessEvent],
    root: &ProcessId,
    direction: PageDirection,
) -> Result<BatchSummary, TreeError> {
    let mut builder = TreeBuilder::new(map, root, direction)?;
    if events.is_empty() {
        return Ok(BatchSummary { version: builder.map.version(), ..BatchSummary::default() });
    }

    let recorded: Vec<(ProcessId, Option<ProcessId>)> =
        events.iter().filter_map(|event| builder.record_event(event)).collect();

    if direction.is_backward() {
        for (id, parent_id) in recorded.iter().rev() {
            builder.attach(id, parent_id.as_ref());
        }
    } else {
        for (id, parent_id) in &recorded {
            builder.attach(id, parent_id.as_ref());
        }
    }

    builder.resolve_orphans();

    let summary = builder.finish();
    debug!(
        "Applied batch v{}: {} events, {} alerts, {} duplicates, {} skipped, {} new nodes, \
         {} attached, {} orphaned, {} resolved",
        summary.version,
        summary.events_recorded,
        summary.alerts_recorded,
        summary.duplicates,
        summary.skipped,
        summary.created,
        summary.attached,
        summary.orphaned,
        summary.resolved
    );
    Ok(summary)
}

/// Record events on their nodes without placing anything in the tree.
///
/// Used for the alert batch: alerts annotate processes, and a process known
/// only through an alert is placed once its own events arrive.
///
/// # Errors
///
/// Returns [`TreeError::UnknownRoot`] if `root` is not in the map.
pub fn update_process_map(
    map: &mut ProcessMap,
    events: &[ProcessEvent],
    root: &ProcessId,
) -> Result<BatchSummary, TreeError> {
    let mut builder = TreeBuilder::new(map, root, PageDirection::Forward)?;
    for event in events {
        builder.record_event(event);
    }
    Ok(builder.finish())
}
