//! Typed dependency graph between work items.
//!
//! # Overview
//!
//! This module maintains the predecessor/successor edge set of an aggregate.
//! Each edge says "the successor is blocked by the predecessor" and carries a
//! [`DependencyType`] and a lag in days. Type and lag feed only the
//! scheduling projection — the completion gate cares about predecessor
//! *status* alone: a predecessor blocks regardless of its dependency type.
//!
//! # Invariant
//!
//! The edge set, viewed as a directed graph over item ids, stays acyclic at
//! all times. [`DependencyGraph::insert`] rejects self-referential edges
//! unconditionally and runs cycle detection before accepting anything else;
//! a rejected insert leaves the graph untouched.
//!
//! # Cross-project edges
//!
//! An item may be blocked by an item in another branch or another project.
//! The graph treats all ids uniformly; a predecessor unknown to the caller's
//! status lookup is treated as still active (it blocks until proven done).

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::HashMap;

use crate::error::EngineError;
use crate::model::edge::{DependencyEdge, DependencyType};
use crate::model::ids::ItemId;
use crate::model::item::Status;

use super::cycles;

/// Predecessor/successor edge set of one aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// successor -> edges pointing at its predecessors.
    blocked_by: HashMap<ItemId, Vec<DependencyEdge>>,
    /// predecessor -> successors it blocks.
    blocks: HashMap<ItemId, Vec<ItemId>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge, or update type/lag in place when the
    /// `(predecessor, successor)` pair already exists.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SelfReference`] when predecessor and successor are
    ///   the same item (rejected before any graph walk).
    /// - [`EngineError::CycleDetected`] when the edge would close a cycle;
    ///   the payload carries the cycle path for diagnostics.
    pub fn insert(&mut self, edge: DependencyEdge) -> Result<(), EngineError> {
        if edge.predecessor_id == edge.successor_id {
            return Err(EngineError::SelfReference(edge.successor_id));
        }

        // Updating an existing pair cannot introduce a cycle.
        if let Some(existing) = self
            .blocked_by
            .get_mut(&edge.successor_id)
            .and_then(|edges| {
                edges
                    .iter_mut()
                    .find(|e| e.predecessor_id == edge.predecessor_id)
            })
        {
            existing.dep_type = edge.dep_type;
            existing.lag_days = edge.lag_days;
            return Ok(());
        }

        if let Some(path) =
            cycles::detect_cycle_on_add(self, &edge.successor_id, &edge.predecessor_id)
        {
            return Err(EngineError::CycleDetected { path });
        }

        self.blocks
            .entry(edge.predecessor_id.clone())
            .or_default()
            .push(edge.successor_id.clone());
        self.blocked_by
            .entry(edge.successor_id.clone())
            .or_default()
            .push(edge);
        Ok(())
    }

    /// Remove the edge for the given pair, returning it if it existed.
    pub fn remove(&mut self, successor: &ItemId, predecessor: &ItemId) -> Option<DependencyEdge> {
        let edges = self.blocked_by.get_mut(successor)?;
        let pos = edges.iter().position(|e| &e.predecessor_id == predecessor)?;
        let edge = edges.remove(pos);
        if edges.is_empty() {
            self.blocked_by.remove(successor);
        }
        if let Some(succs) = self.blocks.get_mut(predecessor) {
            succs.retain(|s| s != successor);
            if succs.is_empty() {
                self.blocks.remove(predecessor);
            }
        }
        Some(edge)
    }

    /// Drop every edge that references `id` as predecessor or successor.
    /// Used when an item is deleted. Returns the number of edges removed.
    pub fn remove_all_for(&mut self, id: &ItemId) -> usize {
        let mut removed = 0;

        if let Some(edges) = self.blocked_by.remove(id) {
            removed += edges.len();
            for edge in edges {
                if let Some(succs) = self.blocks.get_mut(&edge.predecessor_id) {
                    succs.retain(|s| s != id);
                    if succs.is_empty() {
                        self.blocks.remove(&edge.predecessor_id);
                    }
                }
            }
        }

        if let Some(successors) = self.blocks.remove(id) {
            for succ in successors {
                if let Some(edges) = self.blocked_by.get_mut(&succ) {
                    let before = edges.len();
                    edges.retain(|e| &e.predecessor_id != id);
                    removed += before - edges.len();
                    if edges.is_empty() {
                        self.blocked_by.remove(&succ);
                    }
                }
            }
        }

        removed
    }

    /// Edges pointing at the predecessors of `id`.
    pub fn predecessors_of(&self, id: &ItemId) -> impl Iterator<Item = &DependencyEdge> {
        self.blocked_by.get(id).into_iter().flatten()
    }

    /// Ids of the items blocked by `id`.
    pub fn successors_of(&self, id: &ItemId) -> &[ItemId] {
        self.blocks.get(id).map_or(&[], Vec::as_slice)
    }

    /// Look up the stored edge for a pair.
    pub fn edge(&self, successor: &ItemId, predecessor: &ItemId) -> Option<&DependencyEdge> {
        self.blocked_by
            .get(successor)?
            .iter()
            .find(|e| &e.predecessor_id == predecessor)
    }

    /// Predecessor ids of `id` whose status is not `Done`.
    ///
    /// A predecessor the status lookup does not know is treated as active —
    /// an edge to an unloaded item still blocks.
    pub fn active_blockers<F>(&self, id: &ItemId, status_of: F) -> Vec<ItemId>
    where
        F: Fn(&ItemId) -> Option<Status>,
    {
        self.predecessors_of(id)
            .filter(|e| !status_of(&e.predecessor_id).is_some_and(Status::is_done))
            .map(|e| e.predecessor_id.clone())
            .collect()
    }

    /// `true` if `id` has at least one predecessor edge, active or not.
    pub fn is_blocked(&self, id: &ItemId) -> bool {
        self.blocked_by.get(id).is_some_and(|edges| !edges.is_empty())
    }

    /// Iterate all edges in the graph, in unspecified order.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.blocked_by.values().flatten()
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.blocked_by.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_by.is_empty()
    }

    /// Default dependency type and zero lag, for call sites that only care
    /// about the blocking relation.
    #[must_use]
    pub fn plain_edge(predecessor: ItemId, successor: ItemId) -> DependencyEdge {
        DependencyEdge {
            predecessor_id: predecessor,
            successor_id: successor,
            dep_type: DependencyType::default(),
            lag_days: 0,
        }
    }
}
