//! Status derivation for internal items and upward propagation.
//!
//! ## Overview
//!
//! Leaf items carry whatever status was set on them. Internal items derive
//! their status from their children:
//!
//! - every child `Done` -> `Done`, unless the item still has active blockers,
//!   in which case it holds at `InProgress`
//! - any child `Done` or active (`InProgress`, `Review`) -> `InProgress`
//! - otherwise -> `Todo`
//!
//! Derivation only fires when a child set changes; a manual status written
//! to an internal item stays until the next child mutation overwrites it.
//! Propagation walks parent chains and stops at the first ancestor whose
//! derived status comes out unchanged.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{BlockerRef, EngineError};
use crate::hooks::EngineHooks;
use crate::model::ids::ItemId;
use crate::model::item::Status;
use crate::snapshot::Snapshot;

/// One status transition applied during a mutation, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub id: ItemId,
    pub from: Status,
    pub to: Status,
}

/// Status an internal item should carry, given its children and blockers.
/// `None` for leaves and unknown ids; their status is never derived.
pub fn derived_status(snap: &Snapshot, id: &ItemId) -> Option<Status> {
    let children = snap.children_of(id);
    if children.is_empty() {
        return None;
    }

    let mut all_done = true;
    let mut any_started = false;
    for child_id in children {
        let Some(child) = snap.item(child_id) else {
            continue;
        };
        if child.status.is_done() {
            any_started = true;
        } else {
            all_done = false;
            if child.status.is_active() {
                any_started = true;
            }
        }
    }

    let derived = if all_done {
        if snap.active_blockers(id).is_empty() {
            Status::Done
        } else {
            Status::InProgress
        }
    } else if any_started {
        Status::InProgress
    } else {
        Status::Todo
    };
    Some(derived)
}

/// Apply a direct status edit to an item.
///
/// `completed_override` is honored on transitions touching `Done`: into it,
/// where it replaces the engine-stamped completion time, and out of it,
/// where it survives the clear that reopening normally performs. On any
/// other transition it is ignored.
///
/// # Errors
///
/// [`EngineError::NotFound`] for an unknown id, and
/// [`EngineError::BlockedTransition`] when the item is being moved to `Done`
/// while predecessors are still open. The error carries the blockers' ids
/// and titles so callers can surface them verbatim.
pub fn set_status(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: &ItemId,
    new_status: Status,
    completed_override: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Vec<StatusChange>, EngineError> {
    let current = snap
        .item(id)
        .ok_or_else(|| EngineError::NotFound(id.clone()))?
        .status;

    if new_status.is_done() && !current.is_done() {
        let blockers = blocker_refs(snap, id);
        if !blockers.is_empty() {
            return Err(EngineError::BlockedTransition {
                id: id.clone(),
                blockers,
            });
        }
    }

    let mut changes = Vec::new();
    apply_transition(snap, hooks, id, new_status, completed_override, now, &mut changes);

    let parent = snap.item(id).and_then(|i| i.parent_id.clone());
    propagate_from(snap, hooks, parent, now, &mut changes);
    Ok(changes)
}

/// Recompute derived statuses from `parent` up to the root, appending each
/// transition to `changes`. Stops at the first ancestor that comes out
/// unchanged.
pub fn propagate_from(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    parent: Option<ItemId>,
    now: DateTime<Utc>,
    changes: &mut Vec<StatusChange>,
) {
    let mut cursor = parent;
    while let Some(id) = cursor {
        let Some(target) = derived_status(snap, &id) else {
            break; // became a leaf, nothing to derive
        };
        let Some(item) = snap.item(&id) else {
            break;
        };
        if item.status == target {
            debug!(item = %id, status = %target, "rollup settled");
            break;
        }
        apply_transition(snap, hooks, &id, target, None, now, changes);
        cursor = snap.item(&id).and_then(|i| i.parent_id.clone());
    }
}

/// Active predecessors of `id` with their display titles, for error payloads.
pub fn blocker_refs(snap: &Snapshot, id: &ItemId) -> Vec<BlockerRef> {
    snap.active_blockers(id)
        .into_iter()
        .map(|pred| {
            let title = snap
                .item(&pred)
                .map_or_else(String::new, |i| i.title.clone());
            BlockerRef { id: pred, title }
        })
        .collect()
}

/// Write `new_status` onto `id`, stamping timestamps and firing the hook.
/// Assumes the blocked-transition gate has already passed.
fn apply_transition(
    snap: &mut Snapshot,
    hooks: &mut dyn EngineHooks,
    id: &ItemId,
    new_status: Status,
    completed_override: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    changes: &mut Vec<StatusChange>,
) {
    let Some(item) = snap.item_mut(id) else {
        return;
    };
    let previous = item.status;
    if previous == new_status {
        // Still honor an explicit completion time on an already-done item.
        if new_status.is_done() {
            if let Some(at) = completed_override {
                item.completed_at = Some(at);
                item.updated_at = now;
            }
        }
        return;
    }

    item.status = new_status;
    item.updated_at = now;
    if new_status.is_done() {
        item.completed_at = Some(completed_override.unwrap_or(now));
    } else if previous.is_done() {
        // Cleared on reopening, unless the caller supplied a replacement.
        item.completed_at = completed_override;
    }

    let snapshot_item = item.clone();
    debug!(item = %id, from = %previous, to = %new_status, "status transition");
    hooks.status_changed(&snapshot_item, previous);
    changes.push(StatusChange {
        id: id.clone(),
        from: previous,
        to: new_status,
    });
}
