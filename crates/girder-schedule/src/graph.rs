//! Graph construction from an engine snapshot.
//!
//! # Overview
//!
//! Builds a [`petgraph`] directed graph of one project's dependency edges,
//! suitable for schedule computations.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **blocks** B": A must finish before B can
//! complete. This matches the engine's edge orientation, where each
//! dependency names a predecessor and a successor.
//!
//! ## Project Scope
//!
//! Every item of the project becomes a node, including isolated ones, so
//! downstream passes see the full node set. Edges whose other endpoint lies
//! outside the project are skipped.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

use girder_core::{ItemId, ProjectId, Snapshot};

/// A directed dependency graph for one project.
///
/// Nodes are item ids. An edge `A → B` means "A blocks B".
#[derive(Debug)]
pub struct ScheduleGraph {
    /// Directed graph: nodes = item ids, edges = blocking relationships.
    pub graph: DiGraph<ItemId, ()>,
    /// Mapping from item id to petgraph `NodeIndex`.
    pub node_map: HashMap<ItemId, NodeIndex>,
}

impl ScheduleGraph {
    /// Build a [`ScheduleGraph`] from the items and edges of `project`.
    ///
    /// Item ids are added in sorted order so node indices are deterministic
    /// for a given snapshot.
    #[instrument(skip(snap), fields(project = %project))]
    #[must_use]
    pub fn from_snapshot(snap: &Snapshot, project: &ProjectId) -> Self {
        let mut item_ids = snap.project_item_ids(project);
        item_ids.sort();

        let mut graph = DiGraph::<ItemId, ()>::new();
        let mut node_map: HashMap<ItemId, NodeIndex> = HashMap::with_capacity(item_ids.len());

        for id in item_ids {
            let idx = graph.add_node(id.clone());
            node_map.insert(id, idx);
        }

        for edge in snap.graph().edges() {
            let (Some(&pred), Some(&succ)) = (
                node_map.get(&edge.predecessor_id),
                node_map.get(&edge.successor_id),
            ) else {
                continue; // endpoint outside this project
            };
            if !graph.contains_edge(pred, succ) {
                graph.add_edge(pred, succ, ());
            }
        }

        Self { graph, node_map }
    }

    /// Number of nodes (items) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges (blocking relationships) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an item id.
    #[must_use]
    pub fn node_index(&self, id: &ItemId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// The item id label for a node.
    #[must_use]
    pub fn item_id(&self, idx: NodeIndex) -> Option<&ItemId> {
        self.graph.node_weight(idx)
    }
}
