//! Typed failure taxonomy for engine mutations.
//!
//! Every rejected mutation leaves the snapshot unchanged — validation runs
//! before any state is touched, so callers never see partial rollups.

use thiserror::Error;

use crate::model::ids::ItemId;

/// A still-incomplete predecessor reported in a [`EngineError::BlockedTransition`]
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockerRef {
    pub id: ItemId,
    pub title: String,
}

/// Failures surfaced by engine mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An item references itself as parent or predecessor. Rejected before
    /// any graph walk runs.
    #[error("item '{0}' cannot reference itself")]
    SelfReference(ItemId),

    /// Adding an edge or re-parenting would create a cycle. The payload is
    /// the detected cycle path (first node repeated at the end).
    #[error("cycle detected: {}", format_cycle(.path))]
    CycleDetected { path: Vec<ItemId> },

    /// Manual transition to `Done` while active predecessors exist. The
    /// caller may retry once the listed blockers complete.
    #[error("cannot complete '{id}': blocked by {}", format_blockers(.blockers))]
    BlockedTransition {
        id: ItemId,
        blockers: Vec<BlockerRef>,
    },

    /// The referenced item does not exist in the snapshot.
    #[error("item not found: '{0}'")]
    NotFound(ItemId),

    /// The requested parent belongs to a different project. `project_id` is
    /// immutable, so the tree never spans projects.
    #[error("item '{id}' and parent '{parent_id}' belong to different projects")]
    ProjectMismatch { id: ItemId, parent_id: ItemId },

    /// An item with this id already exists in the snapshot.
    #[error("item already exists: '{0}'")]
    DuplicateId(ItemId),

    /// No dependency is recorded between the named pair.
    #[error("no dependency from '{predecessor_id}' to '{successor_id}'")]
    DependencyNotFound {
        predecessor_id: ItemId,
        successor_id: ItemId,
    },
}

fn format_cycle(path: &[ItemId]) -> String {
    path.iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_blockers(blockers: &[BlockerRef]) -> String {
    blockers
        .iter()
        .map(|b| format!("'{}' ({})", b.title, b.id))
        .collect::<Vec<_>>()
        .join(", ")
}
