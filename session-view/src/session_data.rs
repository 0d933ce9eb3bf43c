//! Recorded session data
//!
//! A session file is a JSON document holding everything a view needs to
//! replay a session offline:
//!
//! ```json
//! {
//!   "session_entity_id": "S",
//!   "pages": [ { "events": [ ... ], "cursor": "..." } ],
//!   "alerts": [ ... ],
//!   "alert_status": { "<alert uuid>": { "process_entity_id": "A", "status": "closed" } }
//! }
//! ```
//!
//! Only `session_entity_id` is required.

use std::path::Path;

use serde::Deserialize;
use session_view_common::{AlertStatusMap, ProcessEvent, ProcessEventsPage};

use crate::domain::LoadError;
use crate::session::{SessionTree, ViewOptions};

/// Session loaded from disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionData {
    pub session_entity_id: String,
    #[serde(default)]
    pub pages: Vec<ProcessEventsPage>,
    #[serde(default)]
    pub alerts: Vec<ProcessEvent>,
    #[serde(default)]
    pub alert_status: AlertStatusMap,
}

impl SessionData {
    /// Parse a session file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read, is not valid JSON,
    /// or names no session.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| LoadError::ReadFailed { path: path.display().to_string(), source })?;
        Self::from_json(&content)
    }

    /// Parse session data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the JSON is malformed or names no session.
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        let data: Self = serde_json::from_str(content)?;
        if data.session_entity_id.is_empty() {
            return Err(LoadError::InvalidSessionData("session_entity_id is empty".to_string()));
        }
        Ok(data)
    }

    /// Total number of events across all pages
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.pages.iter().map(|page| page.events.len()).sum()
    }

    /// Build a session tree and feed it every page, the alerts and the alert
    /// status updates.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::domain::TreeError`] from the builder.
    pub fn build_tree(&self, options: ViewOptions) -> Result<SessionTree, crate::domain::TreeError> {
        let mut tree = SessionTree::new(self.session_entity_id.as_str(), self.pages.first(), options);
        tree.apply_pages(&self.pages)?;
        tree.apply_alerts(&self.alerts)?;
        tree.update_alert_statuses(&self.alert_status);
        Ok(tree)
    }
}
