//! Parent-child containment queries and re-parenting validation.
//!
//! The item tree and the dependency graph are independent relations: this
//! module only walks `parent -> children` links. The invariant it protects is
//! that no item is ever its own ancestor — a re-parent that would place an
//! item inside its own subtree is rejected before anything is moved.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashSet, VecDeque};

use crate::error::EngineError;
use crate::model::ids::{ItemId, ProjectId};
use crate::model::tree::TreeNode;
use crate::snapshot::Snapshot;

/// All item ids in the subtree rooted at `root`, including `root` itself,
/// in BFS order (root first).
///
/// Repeated ids are skipped, so the walk terminates even on a malformed
/// index.
pub fn subtree_ids(snap: &Snapshot, root: &ItemId) -> Vec<ItemId> {
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::new();
    let mut result: Vec<ItemId> = Vec::new();

    queue.push_back(root.clone());
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        for child in snap.children_of(&current) {
            if !visited.contains(child) {
                queue.push_back(child.clone());
            }
        }
        result.push(current);
    }

    result
}

/// Ancestor chain of an item, immediate parent first, root last.
///
/// # Errors
///
/// [`EngineError::NotFound`] when `id` is not in the snapshot. A parent link
/// pointing at a missing item truncates the chain rather than failing —
/// ancestors already collected are still useful for diagnostics.
pub fn ancestors(snap: &Snapshot, id: &ItemId) -> Result<Vec<ItemId>, EngineError> {
    let start = snap.item(id).ok_or_else(|| EngineError::NotFound(id.clone()))?;

    let mut chain: Vec<ItemId> = Vec::new();
    let mut visited: HashSet<ItemId> = HashSet::new();
    visited.insert(id.clone());

    let mut cursor = start.parent_id.clone();
    while let Some(parent_id) = cursor {
        if !visited.insert(parent_id.clone()) {
            break;
        }
        cursor = snap.item(&parent_id).and_then(|p| p.parent_id.clone());
        chain.push(parent_id);
    }

    Ok(chain)
}

/// `true` when `candidate` lies inside the subtree rooted at `subject`
/// (the subject itself counts).
pub fn is_descendant(snap: &Snapshot, candidate: &ItemId, subject: &ItemId) -> bool {
    subtree_ids(snap, subject).contains(candidate)
}

/// Validate that moving `id` under `new_parent` (or to top level) is
/// allowed.
///
/// # Errors
///
/// - [`EngineError::NotFound`] when either item is missing.
/// - [`EngineError::SelfReference`] when the item is its own proposed parent.
/// - [`EngineError::CycleDetected`] when the proposed parent is a descendant
///   of the item; the payload is the ancestor path that would close the loop.
/// - [`EngineError::ProjectMismatch`] when the proposed parent belongs to a
///   different project (`project_id` is immutable).
pub fn validate_reparent(
    snap: &Snapshot,
    id: &ItemId,
    new_parent: Option<&ItemId>,
) -> Result<(), EngineError> {
    let item = snap.item(id).ok_or_else(|| EngineError::NotFound(id.clone()))?;

    let Some(parent_id) = new_parent else {
        return Ok(()); // moving to top level is always shape-safe
    };

    if parent_id == id {
        return Err(EngineError::SelfReference(id.clone()));
    }

    let parent = snap
        .item(parent_id)
        .ok_or_else(|| EngineError::NotFound(parent_id.clone()))?;
    if parent.project_id != item.project_id {
        return Err(EngineError::ProjectMismatch {
            id: id.clone(),
            parent_id: parent_id.clone(),
        });
    }

    if is_descendant(snap, parent_id, id) {
        // Report the containment chain id -> ... -> parent -> id.
        let mut path = vec![id.clone()];
        let mut chain = ancestors(snap, parent_id)?;
        chain.reverse(); // root-most first, down toward the parent
        if let Some(pos) = chain.iter().position(|a| a == id) {
            path.extend(chain.into_iter().skip(pos + 1));
        }
        path.push(parent_id.clone());
        path.push(id.clone());
        return Err(EngineError::CycleDetected { path });
    }

    Ok(())
}

/// Build the nested tree view of a project. Siblings are ordered by
/// `(sort_index, created_at)` at every level; WBS codes are left unassigned.
pub fn build_tree(snap: &Snapshot, project: &ProjectId) -> Vec<TreeNode> {
    let mut roots: Vec<TreeNode> = snap
        .roots_of(project)
        .iter()
        .filter_map(|id| node_for(snap, id))
        .collect();
    sort_siblings(&mut roots);
    roots
}

fn node_for(snap: &Snapshot, id: &ItemId) -> Option<TreeNode> {
    let item = snap.item(id)?.clone();
    let mut children: Vec<TreeNode> = snap
        .children_of(id)
        .iter()
        .filter_map(|child| node_for(snap, child))
        .collect();
    sort_siblings(&mut children);
    Some(TreeNode {
        item,
        wbs_code: None,
        children,
    })
}

fn sort_siblings(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        a.item
            .sort_index
            .cmp(&b.item.sort_index)
            .then(a.item.created_at.cmp(&b.item.created_at))
    });
}
