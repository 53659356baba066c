//! Critical path analysis over calendar dates.
//!
//! # Overview
//!
//! Slack measures how far an item's `due_date` can slip before some
//! successor (or the project finish) is put at risk. Items with zero slack
//! are on the critical path.
//!
//! # Definitions
//!
//! | Term             | Definition |
//! |------------------|------------|
//! | `project_finish` | Latest `due_date` in the project; `now` when no item has one. |
//! | `late_finish`    | Earliest `start_date` among the item's successors; `project_finish` when none has one. |
//! | `slack_days`     | `max(0, late_finish - due_date)` in whole days. |
//!
//! Items without a `due_date` carry no slack at all (`None`) and are never
//! critical; a deadline-free item cannot be late.
//!
//! # Algorithm
//!
//! One backward pass in reverse topological order over the project's
//! dependency graph. The engine keeps the graph acyclic, so the sort cannot
//! fail; the fallback to raw node order only matters for snapshots built by
//! hand.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use girder_core::{ItemId, ProjectId, Snapshot};

use crate::graph::ScheduleGraph;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Per-item schedule data computed during critical path analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSchedule {
    /// The item's own deadline, copied from the snapshot.
    pub due_date: Option<DateTime<Utc>>,
    /// Latest finish that keeps every successor on time. `None` when the
    /// item has no `due_date` and was excluded from the pass.
    pub late_finish: Option<DateTime<Utc>>,
    /// Whole days of float. `None` when the item has no `due_date`.
    pub slack_days: Option<i64>,
    /// `true` when `slack_days` is zero.
    pub is_critical: bool,
}

/// Result of critical path analysis on one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalPathResult {
    /// Latest deadline in the project, or the caller's `now` when no item
    /// has one.
    pub project_finish: DateTime<Utc>,
    /// Per-item schedule data, one entry per project item.
    pub schedules: HashMap<ItemId, ItemSchedule>,
    /// Ids with zero slack, sorted for deterministic output.
    pub critical_items: Vec<ItemId>,
}

impl CriticalPathResult {
    /// Schedule entry for one item, if it belongs to the project.
    #[must_use]
    pub fn schedule(&self, id: &ItemId) -> Option<&ItemSchedule> {
        self.schedules.get(id)
    }

    /// `true` when the item is on the critical path.
    #[must_use]
    pub fn is_critical(&self, id: &ItemId) -> bool {
        self.schedules.get(id).is_some_and(|s| s.is_critical)
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Compute slack and critical flags for every item in `project`.
///
/// `now` anchors `project_finish` for projects where nothing carries a
/// deadline yet.
#[instrument(skip(snap), fields(project = %project))]
#[must_use]
pub fn compute_critical_path(
    snap: &Snapshot,
    project: &ProjectId,
    now: DateTime<Utc>,
) -> CriticalPathResult {
    let sg = ScheduleGraph::from_snapshot(snap, project);

    let project_finish = sg
        .graph
        .node_weights()
        .filter_map(|id| snap.item(id).and_then(|i| i.due_date))
        .max()
        .unwrap_or(now);

    let topo: Vec<NodeIndex> = toposort(&sg.graph, None)
        .unwrap_or_else(|_| sg.graph.node_indices().collect());

    let mut schedules: HashMap<ItemId, ItemSchedule> = HashMap::with_capacity(topo.len());
    let mut critical_items: Vec<ItemId> = Vec::new();

    for &v in topo.iter().rev() {
        let id = &sg.graph[v];
        let Some(item) = snap.item(id) else {
            continue;
        };

        let Some(due) = item.due_date else {
            schedules.insert(
                id.clone(),
                ItemSchedule {
                    due_date: None,
                    late_finish: None,
                    slack_days: None,
                    is_critical: false,
                },
            );
            continue;
        };

        let late_finish = sg
            .graph
            .edges_directed(v, Direction::Outgoing)
            .filter_map(|e| {
                sg.item_id(e.target())
                    .and_then(|succ| snap.item(succ))
                    .and_then(|succ| succ.start_date)
            })
            .min()
            .unwrap_or(project_finish);

        let slack_days = (late_finish - due).num_days().max(0);
        let is_critical = slack_days == 0;
        if is_critical {
            critical_items.push(id.clone());
        }

        schedules.insert(
            id.clone(),
            ItemSchedule {
                due_date: Some(due),
                late_finish: Some(late_finish),
                slack_days: Some(slack_days),
                is_critical,
            },
        );
    }

    critical_items.sort();

    CriticalPathResult {
        project_finish,
        schedules,
        critical_items,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
