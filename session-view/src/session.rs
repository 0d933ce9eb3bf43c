//! Session tree: the stateful front of the engine.
//!
//! [`SessionTree`] owns one session's [`ProcessMap`] and everything needed to
//! feed it incrementally from the outside world:
//!
//! - pages of events, deduplicated by cursor, in either paging direction
//! - a single batch of alerts
//! - out-of-band alert status changes
//! - view options (verbose mode, search query, jump target) whose changes
//!   recompute search and expansion flags
//!
//! All mutation goes through `&mut self`; readers borrow `&self` and therefore
//! only ever observe a settled map.

use log::{debug, info};
use session_view_common::{AlertStatusMap, ProcessEvent, ProcessEventsPage};

use crate::analysis::{auto_expand_process_tree, search_process_tree};
use crate::classification::entry_leader_stand_in;
use crate::domain::{PageDirection, ProcessId, TreeError};
use crate::process::{ProcessMap, ProcessNode};
use crate::tree::{process_new_events, update_process_map};

/// View configuration that drives search and expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Show shell-noise processes
    pub verbose_mode: bool,
    /// Plain-text query; `None` or empty clears search
    pub search_query: Option<String>,
    /// Process whose ancestor chain should be expanded
    pub jump_to_entity_id: Option<ProcessId>,
}

/// Process tree of a single session.
#[derive(Debug)]
pub struct SessionTree {
    map: ProcessMap,
    processed_cursors: Vec<String>,
    alerts_processed: bool,
    search_results: Vec<ProcessId>,
    options: ViewOptions,
}

impl SessionTree {
    /// Create the tree for `session_entity_id`.
    ///
    /// The session leader node is seeded from `first_page`: its first
    /// informational event, overlaid with the embedded entry-leader
    /// attributes, stands in for the leader's own record (which is usually
    /// missing when the session is opened from the middle). Without such an
    /// event the leader starts with an empty log.
    #[must_use]
    pub fn new(
        session_entity_id: impl Into<ProcessId>,
        first_page: Option<&ProcessEventsPage>,
        options: ViewOptions,
    ) -> Self {
        let root = session_entity_id.into();
        let mut map = ProcessMap::new(root.clone());

        let stand_in = first_page.and_then(|page| page.events.iter().find_map(entry_leader_stand_in));
        match (stand_in, map.get_mut(root.as_str())) {
            (Some(event), Some(leader)) => {
                leader.add_event(event);
            }
            _ => debug!("No informational event to stand in for session leader {root}"),
        }

        let mut tree =
            Self { map, processed_cursors: Vec::new(), alerts_processed: false, search_results: Vec::new(), options };
        tree.refresh();
        tree
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    /// Apply every page not applied yet.
    ///
    /// `pages` is the caller's full, ordered page list. A new page found at an
    /// index below the number of pages already applied was prepended, i.e.
    /// fetched by paging backward. Pages whose cursor was seen before are
    /// skipped.
    ///
    /// Returns the number of pages applied.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] only on a broken root invariant.
    pub fn apply_pages(&mut self, pages: &[ProcessEventsPage]) -> Result<usize, TreeError> {
        let processed_before = self.processed_cursors.len();
        let mut applied = 0;

        for (i, page) in pages.iter().enumerate() {
            if self.is_processed(&page.cursor) {
                continue;
            }
            let direction = if i < processed_before { PageDirection::Backward } else { PageDirection::Forward };
            self.apply_unprocessed(page, direction)?;
            applied += 1;
        }

        if applied > 0 {
            info!(
                "Applied {applied} page(s); {} processes, {} orphans",
                self.map.len(),
                self.map.root().orphans().len()
            );
            self.refresh();
        }
        Ok(applied)
    }

    /// Apply one page in an explicit direction.
    ///
    /// Returns `false` if the page's cursor was already applied.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] only on a broken root invariant.
    pub fn apply_page(&mut self, page: &ProcessEventsPage, direction: PageDirection) -> Result<bool, TreeError> {
        if self.is_processed(&page.cursor) {
            debug!("Ignoring already applied page {}", page.cursor);
            return Ok(false);
        }
        self.apply_unprocessed(page, direction)?;
        self.refresh();
        Ok(true)
    }

    fn apply_unprocessed(&mut self, page: &ProcessEventsPage, direction: PageDirection) -> Result<(), TreeError> {
        let root = self.map.root_id().clone();
        process_new_events(&mut self.map, &page.events, &root, direction)?;
        self.processed_cursors.push(page.cursor.clone());
        Ok(())
    }

    /// Attach the session's alert batch. Only the first call has an effect.
    ///
    /// Returns `false` if alerts were already processed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] only on a broken root invariant.
    pub fn apply_alerts(&mut self, alerts: &[ProcessEvent]) -> Result<bool, TreeError> {
        if self.alerts_processed {
            return Ok(false);
        }
        let root = self.map.root_id().clone();
        let summary = update_process_map(&mut self.map, alerts, &root)?;
        self.alerts_processed = true;
        debug!("Attached {} alerts", summary.alerts_recorded);
        Ok(true)
    }

    /// Apply alert workflow status changes in place.
    ///
    /// Updates naming a process that is not in the map are ignored. The map
    /// version is bumped if any alert changed. Returns the number of alert
    /// records changed.
    pub fn update_alert_statuses(&mut self, updates: &AlertStatusMap) -> usize {
        let mut changed = 0;
        for (alert_uuid, update) in updates {
            match self.map.get_mut(&update.process_entity_id) {
                Some(node) => changed += node.update_alert_status(alert_uuid, update.status),
                None => debug!("Status update for alert {alert_uuid} names unknown process {}", update.process_entity_id),
            }
        }
        if changed > 0 {
            self.map.bump_version();
        }
        changed
    }

    pub fn set_search_query(&mut self, query: Option<String>) {
        if self.options.search_query != query {
            self.options.search_query = query;
            self.refresh();
        }
    }

    pub fn set_verbose_mode(&mut self, verbose_mode: bool) {
        if self.options.verbose_mode != verbose_mode {
            self.options.verbose_mode = verbose_mode;
            self.refresh();
        }
    }

    pub fn set_jump_to(&mut self, target: Option<ProcessId>) {
        if self.options.jump_to_entity_id != target {
            self.options.jump_to_entity_id = target;
            self.refresh();
        }
    }

    /// Recompute jump expansion and search results.
    fn refresh(&mut self) {
        auto_expand_process_tree(&mut self.map, self.options.jump_to_entity_id.as_ref());
        self.search_results =
            search_process_tree(&mut self.map, self.options.search_query.as_deref(), self.options.verbose_mode);
    }

    fn is_processed(&self, cursor: &str) -> bool {
        self.processed_cursors.iter().any(|c| c == cursor)
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    /// Root of the session's forest.
    #[must_use]
    pub fn session_leader(&self) -> &ProcessNode {
        self.map.root()
    }

    #[must_use]
    pub fn process_map(&self) -> &ProcessMap {
        &self.map
    }

    /// Matches of the current search query, in view order.
    #[must_use]
    pub fn search_results(&self) -> &[ProcessId] {
        &self.search_results
    }

    #[must_use]
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    #[must_use]
    pub fn processed_page_count(&self) -> usize {
        self.processed_cursors.len()
    }

    #[must_use]
    pub fn alerts_processed(&self) -> bool {
        self.alerts_processed
    }

    /// Visible children of `id` under the current verbose mode.
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&ProcessNode> {
        self.map
            .get(id)
            .map(|node| node.get_children(&self.map, self.options.verbose_mode))
            .unwrap_or_default()
    }
}
