//! The in-memory aggregate the engine mutates.
//!
//! A [`Snapshot`] holds one or more project trees as an arena of items
//! addressed by id, plus the dependency graph between them. Children are
//! tracked through a `parent -> children` index rather than owning pointers,
//! so re-parenting and deletion are index updates instead of deep
//! restructuring.
//!
//! The snapshot is plain data: loading it from storage and persisting what
//! the engine changed are the host's responsibility. Mutations should go
//! through [`crate::engine`], which keeps the derived state (rollups,
//! progress) consistent; the mutators here are deliberately crate-private.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::graph::blocking::DependencyGraph;
use crate::model::ids::{ItemId, ProjectId};
use crate::model::item::ItemFields;

/// Sibling gap used when appending an item without an explicit sort index.
pub const SORT_INDEX_GAP: i64 = 10;

/// One aggregate's items, tree index, dependency graph, and stored progress.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    items: HashMap<ItemId, ItemFields>,
    /// parent id -> child ids, in insertion order.
    children: HashMap<ItemId, Vec<ItemId>>,
    /// project id -> top-level item ids, in insertion order.
    roots: HashMap<ProjectId, Vec<ItemId>>,
    graph: DependencyGraph,
    /// Stored project progress, as last written by the aggregator.
    progress: HashMap<ProjectId, f64>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- reads ---------------------------------------------------------------

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ItemFields> {
        self.items.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    #[must_use]
    pub fn children_of(&self, id: &ItemId) -> &[ItemId] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Top-level item ids of a project, in insertion order.
    #[must_use]
    pub fn roots_of(&self, project: &ProjectId) -> &[ItemId] {
        self.roots.get(project).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Predecessors of `id` whose status is not `Done`. Predecessors missing
    /// from the arena count as active.
    #[must_use]
    pub fn active_blockers(&self, id: &ItemId) -> Vec<ItemId> {
        self.graph
            .active_blockers(id, |pred| self.items.get(pred).map(|i| i.status))
    }

    /// Stored progress percentage for a project; `0.0` when never written.
    #[must_use]
    pub fn progress_percent(&self, project: &ProjectId) -> f64 {
        self.progress.get(project).copied().unwrap_or(0.0)
    }

    /// Every item id belonging to `project`, in unspecified order.
    #[must_use]
    pub fn project_item_ids(&self, project: &ProjectId) -> Vec<ItemId> {
        self.items
            .values()
            .filter(|item| &item.project_id == project)
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn iter_items(&self) -> impl Iterator<Item = &ItemFields> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sort index that appends after the current siblings (gap of
    /// [`SORT_INDEX_GAP`]).
    #[must_use]
    pub fn next_sort_index(&self, project: &ProjectId, parent: Option<&ItemId>) -> i64 {
        let siblings = match parent {
            Some(parent) => self.children_of(parent),
            None => self.roots_of(project),
        };
        let max = siblings
            .iter()
            .filter_map(|id| self.items.get(id))
            .map(|item| item.sort_index)
            .max()
            .unwrap_or(0);
        max + SORT_INDEX_GAP
    }

    // -- crate-private mutators ----------------------------------------------

    /// Insert a fully-formed item and index it under its parent (or as a
    /// project root).
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateId`] when the id is already present.
    pub(crate) fn insert(&mut self, item: ItemFields) -> Result<(), EngineError> {
        if self.items.contains_key(&item.id) {
            return Err(EngineError::DuplicateId(item.id));
        }

        match &item.parent_id {
            Some(parent) => self
                .children
                .entry(parent.clone())
                .or_default()
                .push(item.id.clone()),
            None => self
                .roots
                .entry(item.project_id.clone())
                .or_default()
                .push(item.id.clone()),
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    pub(crate) fn item_mut(&mut self, id: &ItemId) -> Option<&mut ItemFields> {
        self.items.get_mut(id)
    }

    /// Remove a single item and unlink it from the sibling index. The caller
    /// is responsible for cascading to the subtree and the edge set.
    pub(crate) fn remove(&mut self, id: &ItemId) -> Option<ItemFields> {
        let item = self.items.remove(id)?;
        self.unlink(&item);
        self.children.remove(id);
        Some(item)
    }

    /// Move an item under a new parent (or to top level), keeping both
    /// sibling indexes consistent. Validation happens in the engine.
    pub(crate) fn set_parent(&mut self, id: &ItemId, new_parent: Option<ItemId>) {
        let Some(item) = self.items.get(id).cloned() else {
            return;
        };
        self.unlink(&item);

        match &new_parent {
            Some(parent) => self
                .children
                .entry(parent.clone())
                .or_default()
                .push(id.clone()),
            None => self
                .roots
                .entry(item.project_id.clone())
                .or_default()
                .push(id.clone()),
        }
        if let Some(stored) = self.items.get_mut(id) {
            stored.parent_id = new_parent;
        }
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    pub(crate) fn set_progress(&mut self, project: ProjectId, percent: f64) {
        self.progress.insert(project, percent);
    }

    /// Drop the id from its parent's child list or the project root list.
    fn unlink(&mut self, item: &ItemFields) {
        match &item.parent_id {
            Some(parent) => {
                if let Some(siblings) = self.children.get_mut(parent) {
                    siblings.retain(|c| c != &item.id);
                    if siblings.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
            None => {
                if let Some(roots) = self.roots.get_mut(&item.project_id) {
                    roots.retain(|c| c != &item.id);
                    if roots.is_empty() {
                        self.roots.remove(&item.project_id);
                    }
                }
            }
        }
    }
}
