#![forbid(unsafe_code)]
//! girder-core library.
//!
//! The task hierarchy and dependency engine: an in-memory snapshot of
//! project items plus the mutation operations that keep its invariants
//! (acyclic containment, acyclic dependencies, derived parent statuses,
//! aggregate progress) intact.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`Result<_, EngineError>`];
//!   `anyhow::Result` is for application-level callers.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`,
//!   `trace!`).
//! - **Time**: nothing here reads the clock; callers pass `now` explicitly.

pub mod engine;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod model;
pub mod progress;
pub mod rollup;
pub mod snapshot;

pub use engine::MutationOutcome;
pub use error::{BlockerRef, EngineError};
pub use hooks::{EngineHooks, NoopHooks};
pub use model::{
    DependencyEdge, DependencyType, ItemDraft, ItemFields, ItemId, ItemPatch, Priority, ProjectId,
    Status, TreeNode,
};
pub use rollup::StatusChange;
pub use snapshot::Snapshot;
