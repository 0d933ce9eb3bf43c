//! Search and auto-expansion over the process map.
//!
//! Both passes only touch the ephemeral view flags on nodes
//! (`search_matched`, and the search/jump halves of `auto_expand`); they never
//! change tree structure.
//!
//! # Matching
//!
//! A node's searchable text is what the view renders for it: its working
//! directory followed by its command line (`args` joined by spaces), falling
//! back to the executable path, then the process name, when no args were
//! captured. Matching is a case-insensitive substring test.
//!
//! # Determinism
//!
//! Search-driven expansion is cleared and recomputed on every call, and the
//! result list is sorted with the view ordering, so running the same query
//! twice over an unchanged map yields the same flags and the same results.

use crate::domain::{ProcessId, SearchMatch};
use crate::process::{ProcessMap, ProcessNode};
use crate::view::sort_ids;

/// Text a search query is matched against.
#[must_use]
pub fn search_text(node: &ProcessNode) -> String {
    let Some(process) = node.details() else {
        return String::new();
    };

    let command = if process.args.is_empty() {
        process.executable.clone().or_else(|| process.name.clone()).unwrap_or_default()
    } else {
        process.args.join(" ")
    };

    format!("{} {command}", process.working_directory.as_deref().unwrap_or_default())
}

/// Mark nodes matching `query` and expand the path to each match.
///
/// The entry leader is never matched, and neither are verbose (noise)
/// processes unless `verbose_mode` is on, since those are hidden from the
/// view. An absent or empty query clears every search flag.
///
/// Returns the matching identities in view order.
pub fn search_process_tree(
    map: &mut ProcessMap,
    query: Option<&str>,
    verbose_mode: bool,
) -> Vec<ProcessId> {
    for node in map.iter_mut() {
        node.expanded_by_search = false;
    }

    let Some(query) = query.filter(|q| !q.is_empty()) else {
        for node in map.iter_mut() {
            node.clear_search();
        }
        return Vec::new();
    };

    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    for node in map.iter_mut() {
        let eligible = !node.is_entry_leader() && (verbose_mode || !node.is_verbose());
        if eligible && search_text(node).to_lowercase().contains(&needle) {
            node.search_matched = SearchMatch::Matched(query.to_string());
            matches.push(node.id().clone());
        } else {
            node.search_matched = SearchMatch::NotMatched;
        }
    }

    let to_expand: Vec<ProcessId> = matches
        .iter()
        .flat_map(|id| map.ancestors(id).map(|ancestor| ancestor.id().clone()))
        .collect();
    for id in to_expand {
        if let Some(node) = map.get_mut(id.as_str()) {
            node.expanded_by_search = true;
        }
    }

    sort_ids(map, &mut matches);
    log::debug!("Search {query:?} matched {} processes", matches.len());
    matches
}

/// Expand every node from `target` up to the root.
///
/// Replaces the previous jump expansion. Returns `false` (and expands
/// nothing) when there is no target or it is not in the map.
pub fn auto_expand_process_tree(map: &mut ProcessMap, target: Option<&ProcessId>) -> bool {
    for node in map.iter_mut() {
        node.expanded_by_jump = false;
    }

    let Some(target) = target.filter(|t| map.contains(t.as_str())) else {
        return false;
    };

    let mut path = vec![target.clone()];
    path.extend(map.ancestors(target).map(|ancestor| ancestor.id().clone()));

    for id in path {
        if let Some(node) = map.get_mut(id.as_str()) {
            node.expanded_by_jump = true;
        }
    }
    true
}
