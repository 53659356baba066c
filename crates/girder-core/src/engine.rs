//! Mutation entry points for the item tree and dependency graph.
//!
//! ## Overview
//!
//! Every operation here takes the snapshot, an [`EngineHooks`] sink, and an
//! explicit `now` timestamp, and returns a [`MutationOutcome`] describing
//! what actually happened. Operations are all-or-nothing: validation runs
//! before the first write, so a returned error means the snapshot is
//! untouched.
//!
//! ## Design
//!
//! After the direct write, three follow-up phases run in order:
//!
//! 1. rollup — derived statuses are recomputed up the affected parent
//!    chains ([`rollup::propagate_from`])
//! 2. reconciliation — items whose `Done`-ness flipped are traversed along
//!    outgoing dependency edges, re-deriving successors and firing
//!    unblock notifications; new flips feed back into the worklist, and
//!    acyclicity of both relations bounds the walk
//! 3. progress — every project touched by the change list has its
//!    aggregate recomputed with the usual write threshold
//!    ([`progress::recompute`]); cross-project edges mean this is not
//!    always just the mutated project

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::EngineError;
use crate::graph::hierarchy;
use crate::hooks::EngineHooks;
use crate::model::edge::DependencyEdge;
use crate::model::ids::{ItemId, ProjectId};
use crate::model::item::{ItemDraft, ItemFields, ItemPatch};
use crate::progress;
use crate::rollup::{self, StatusChange};
use crate::snapshot::Snapshot;

/// What a mutation did, beyond its direct write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// Every status transition, direct and derived, in application order.
    pub status_changes: Vec<StatusChange>,
    /// Ids of items created by this mutation.
    pub created: Vec<ItemId>,
    /// Ids of items removed by this mutation (whole subtree for deletes).
    pub deleted: Vec<ItemId>,
    /// The mutated project's progress after the mutation.
    pub progress: f64,
    /// Recomputed progress per affected project, mutated project first.
    /// Dependency edges may cross projects, so derived status changes can
    /// touch aggregates beyond the mutated one.
    pub progress_by_project: Vec<(ProjectId, f64)>,
}

// ---------------------------------------------------------------------------
// item lifecycle
// ---------------------------------------------------------------------------

/// Create an item under `parent_id` (or at the project's top level).
///
/// The caller supplies the id; the engine never generates identifiers.
/// Unset draft fields fall back to their defaults: status `Todo`, priority
/// `Medium`, and a sort index appended after the last sibling. Creating an
/// item directly in `Done` stamps `completed_at` (the draft's value wins
/// over `now`).
///
/// # Errors
///
/// [`EngineError::NotFound`] for a missing parent,
/// [`EngineError::ProjectMismatch`] when the parent is in another project,
/// and [`EngineError::DuplicateId`] when the id is taken.
#[instrument(skip(snap, hooks, draft), fields(item = %id, project = %project_id))]
pub fn create_item(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: ItemId,
    project_id: ProjectId,
    parent_id: Option<ItemId>,
    draft: ItemDraft,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    if let Some(parent) = &parent_id {
        let parent_item = snap
            .item(parent)
            .ok_or_else(|| EngineError::NotFound(parent.clone()))?;
        if parent_item.project_id != project_id {
            return Err(EngineError::ProjectMismatch {
                id: id.clone(),
                parent_id: parent.clone(),
            });
        }
    }

    let status = draft.status.unwrap_or_default();
    let sort_index = draft
        .sort_index
        .unwrap_or_else(|| snap.next_sort_index(&project_id, parent_id.as_ref()));
    let completed_at = if status.is_done() {
        Some(draft.completed_at.unwrap_or(now))
    } else {
        None
    };

    snap.insert(ItemFields {
        id: id.clone(),
        project_id: project_id.clone(),
        parent_id: parent_id.clone(),
        title: draft.title,
        description: draft.description,
        status,
        priority: draft.priority.unwrap_or_default(),
        tags: draft.tags,
        assignee_ids: draft.assignee_ids,
        start_date: draft.start_date,
        due_date: draft.due_date,
        deadline_at: draft.deadline_at,
        completed_at,
        sort_index,
        is_milestone: draft.is_milestone,
        created_at: now,
        updated_at: now,
    })?;
    info!(status = %status, "item created");

    let mut changes = Vec::new();
    rollup::propagate_from(snap, hooks, parent_id, now, &mut changes);
    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: vec![id],
        deleted: Vec::new(),
        progress,
        progress_by_project,
    })
}

/// Apply a partial update to an item.
///
/// Scalar fields are written as given. A `status` in the patch goes through
/// the full transition path: the `Done` gate against active blockers,
/// `completed_at` stamping, and upward rollup. `completed_at` without a
/// `Done` status (stored or requested) is ignored.
///
/// # Errors
///
/// [`EngineError::NotFound`] for an unknown id and
/// [`EngineError::BlockedTransition`] when the patch moves the item to
/// `Done` past open predecessors. Scalar fields are not written when the
/// transition is rejected.
#[instrument(skip(snap, hooks, patch), fields(item = %id))]
pub fn update_item(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: &ItemId,
    patch: ItemPatch,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    let current = snap
        .item(id)
        .ok_or_else(|| EngineError::NotFound(id.clone()))?
        .clone();
    let project_id = current.project_id.clone();

    // Gate first so a rejected transition leaves scalars untouched too.
    let target_status = patch.status.unwrap_or(current.status);
    let mut changes = rollup::set_status(
        snap,
        hooks,
        id,
        target_status,
        patch.completed_at,
        now,
    )?;

    if let Some(item) = snap.item_mut(id) {
        let mut touched = false;
        if let Some(title) = patch.title {
            item.title = title;
            touched = true;
        }
        if let Some(description) = patch.description {
            item.description = Some(description);
            touched = true;
        }
        if let Some(priority) = patch.priority {
            item.priority = priority;
            touched = true;
        }
        if let Some(tags) = patch.tags {
            item.tags = tags;
            touched = true;
        }
        if let Some(assignees) = patch.assignee_ids {
            item.assignee_ids = assignees;
            touched = true;
        }
        if let Some(start) = patch.start_date {
            item.start_date = Some(start);
            touched = true;
        }
        if let Some(due) = patch.due_date {
            item.due_date = Some(due);
            touched = true;
        }
        if let Some(deadline) = patch.deadline_at {
            item.deadline_at = Some(deadline);
            touched = true;
        }
        if let Some(sort_index) = patch.sort_index {
            item.sort_index = sort_index;
            touched = true;
        }
        if let Some(milestone) = patch.is_milestone {
            item.is_milestone = milestone;
            touched = true;
        }
        if touched {
            item.updated_at = now;
        }
    }

    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: Vec::new(),
        deleted: Vec::new(),
        progress,
        progress_by_project,
    })
}

/// Delete an item and its whole subtree.
///
/// All dependency edges touching deleted items are dropped. Surviving
/// successors that lose their last active blocker get an unblock
/// notification, and both the old parent chain and those successors are
/// re-derived.
///
/// # Errors
///
/// [`EngineError::NotFound`] for an unknown id.
#[instrument(skip(snap, hooks), fields(item = %id))]
pub fn delete_item(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: &ItemId,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    let item = snap
        .item(id)
        .ok_or_else(|| EngineError::NotFound(id.clone()))?;
    let project_id = item.project_id.clone();
    let old_parent = item.parent_id.clone();

    let subtree = hierarchy::subtree_ids(snap, id);
    let doomed: std::collections::HashSet<&ItemId> = subtree.iter().collect();

    // Successors outside the subtree, with their pre-delete blocked state.
    let mut affected: Vec<(ItemId, bool)> = Vec::new();
    for member in &subtree {
        for succ in snap.graph().successors_of(member) {
            if !doomed.contains(succ) && !affected.iter().any(|(s, _)| s == succ) {
                let was_blocked = !snap.active_blockers(succ).is_empty();
                affected.push((succ.clone(), was_blocked));
            }
        }
    }

    for member in &subtree {
        snap.remove(member);
        snap.graph_mut().remove_all_for(member);
    }
    info!(removed = subtree.len(), "subtree deleted");

    let mut changes = Vec::new();
    rollup::propagate_from(snap, hooks, old_parent, now, &mut changes);
    for (succ, was_blocked) in affected {
        if !snap.contains(&succ) {
            continue;
        }
        if was_blocked && snap.active_blockers(&succ).is_empty() {
            if let Some(item) = snap.item(&succ) {
                let item = item.clone();
                hooks.item_unblocked(&item);
            }
        }
        rollup::propagate_from(snap, hooks, Some(succ), now, &mut changes);
    }
    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: Vec::new(),
        deleted: subtree,
        progress,
        progress_by_project,
    })
}

/// Move an item under a new parent (or to the project's top level).
///
/// The move is validated against the containment invariant before anything
/// is written. The item is appended after its new siblings.
///
/// # Errors
///
/// Everything [`hierarchy::validate_reparent`] rejects: unknown items,
/// self-parenting, cross-project moves, and moves into the item's own
/// subtree.
#[instrument(skip(snap, hooks), fields(item = %id))]
pub fn reparent(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: &ItemId,
    new_parent: Option<ItemId>,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    hierarchy::validate_reparent(snap, id, new_parent.as_ref())?;

    let item = snap
        .item(id)
        .ok_or_else(|| EngineError::NotFound(id.clone()))?;
    let project_id = item.project_id.clone();
    let old_parent = item.parent_id.clone();

    if old_parent == new_parent {
        let stored = snap.progress_percent(&project_id);
        return Ok(MutationOutcome {
            progress: stored,
            progress_by_project: vec![(project_id, stored)],
            ..MutationOutcome::default()
        });
    }

    let sort_index = snap.next_sort_index(&project_id, new_parent.as_ref());
    snap.set_parent(id, new_parent.clone());
    if let Some(item) = snap.item_mut(id) {
        item.sort_index = sort_index;
        item.updated_at = now;
    }
    info!(parent = ?new_parent.as_ref().map(ItemId::as_str), "item moved");

    let mut changes = Vec::new();
    rollup::propagate_from(snap, hooks, old_parent, now, &mut changes);
    rollup::propagate_from(snap, hooks, new_parent, now, &mut changes);
    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: Vec::new(),
        deleted: Vec::new(),
        progress,
        progress_by_project,
    })
}

// ---------------------------------------------------------------------------
// dependency edges
// ---------------------------------------------------------------------------

/// Record (or retype) a dependency between two existing items.
///
/// An edge for the same pair is updated in place; otherwise the edge is
/// checked against the acyclicity invariant and inserted. The successor is
/// re-derived afterwards, since a parent that was resting at `Done` may now
/// be held back by the new blocker.
///
/// # Errors
///
/// [`EngineError::NotFound`] for a missing endpoint,
/// [`EngineError::SelfReference`] for a self-edge, and
/// [`EngineError::CycleDetected`] when the edge would close a loop.
#[instrument(skip(snap, hooks), fields(pred = %edge.predecessor_id, succ = %edge.successor_id))]
pub fn set_dependency(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    edge: DependencyEdge,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    for endpoint in [&edge.predecessor_id, &edge.successor_id] {
        if !snap.contains(endpoint) {
            return Err(EngineError::NotFound((*endpoint).clone()));
        }
    }
    let successor = edge.successor_id.clone();
    let project_id = snap
        .item(&successor)
        .ok_or_else(|| EngineError::NotFound(successor.clone()))?
        .project_id
        .clone();

    snap.graph_mut().insert(edge)?;

    let mut changes = Vec::new();
    rollup::propagate_from(snap, hooks, Some(successor), now, &mut changes);
    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: Vec::new(),
        deleted: Vec::new(),
        progress,
        progress_by_project,
    })
}

/// Remove the dependency between a pair of items.
///
/// Fires the unblock notification when this was the successor's last
/// active blocker, then re-derives the successor.
///
/// # Errors
///
/// [`EngineError::NotFound`] for a missing successor and
/// [`EngineError::DependencyNotFound`] when no edge links the pair.
#[instrument(skip(snap, hooks), fields(pred = %predecessor, succ = %successor))]
pub fn remove_dependency(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    predecessor: &ItemId,
    successor: &ItemId,
    now: DateTime<Utc>,
) -> Result<MutationOutcome, EngineError> {
    let project_id = snap
        .item(successor)
        .ok_or_else(|| EngineError::NotFound(successor.clone()))?
        .project_id
        .clone();

    let was_blocked = !snap.active_blockers(successor).is_empty();
    snap.graph_mut()
        .remove(successor, predecessor)
        .ok_or_else(|| EngineError::DependencyNotFound {
            predecessor_id: predecessor.clone(),
            successor_id: successor.clone(),
        })?;

    if was_blocked && snap.active_blockers(successor).is_empty() {
        if let Some(item) = snap.item(successor) {
            let item = item.clone();
            hooks.item_unblocked(&item);
        }
    }

    let mut changes = Vec::new();
    rollup::propagate_from(snap, hooks, Some(successor.clone()), now, &mut changes);
    reconcile_successors(snap, hooks, &mut changes, now);
    let (progress, progress_by_project) = recompute_progress(snap, hooks, project_id, &changes);

    Ok(MutationOutcome {
        status_changes: changes,
        created: Vec::new(),
        deleted: Vec::new(),
        progress,
        progress_by_project,
    })
}

// ---------------------------------------------------------------------------
// reconciliation
// ---------------------------------------------------------------------------

/// Walk the change list as a worklist: whenever an item's `Done`-ness
/// flipped, its successors are notified and re-derived, which may append
/// further changes. Both the tree and the dependency graph are acyclic, so
/// the walk terminates.
fn reconcile_successors(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    changes: &mut Vec<StatusChange>,
    now: DateTime<Utc>,
) {
    let mut cursor = 0;
    while cursor < changes.len() {
        let change = changes[cursor].clone();
        cursor += 1;
        if change.from.is_done() == change.to.is_done() {
            continue;
        }

        let successors: Vec<ItemId> = snap.graph().successors_of(&change.id).to_vec();
        for succ in successors {
            if change.to.is_done() && snap.active_blockers(&succ).is_empty() {
                if let Some(item) = snap.item(&succ) {
                    let item = item.clone();
                    hooks.item_unblocked(&item);
                }
            }
            rollup::propagate_from(snap, hooks, Some(succ), now, changes);
        }
    }
}

/// Recompute stored progress for the mutated project and every other
/// project that owns an item in `changes`. Returns the mutated project's
/// value plus the full per-project list, mutated project first.
fn recompute_progress(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    project_id: ProjectId,
    changes: &[StatusChange],
) -> (f64, Vec<(ProjectId, f64)>) {
    let mut projects = vec![project_id];
    for change in changes {
        if let Some(item) = snap.item(&change.id) {
            if !projects.contains(&item.project_id) {
                projects.push(item.project_id.clone());
            }
        }
    }

    let mut by_project = Vec::with_capacity(projects.len());
    for project in projects {
        let percent = progress::recompute(snap, hooks, &project);
        by_project.push((project, percent));
    }
    let primary = by_project.first().map_or(0.0, |(_, percent)| *percent);
    (primary, by_project)
}
