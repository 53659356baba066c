//! Graph-level abstractions for item relationships.
//!
//! This module groups the relational functions that operate across multiple
//! items in a snapshot.
//!
//! ## Submodules
//!
//! - [`hierarchy`] — Parent-child containment, tree building, and
//!   re-parenting validation.
//! - [`blocking`] — The typed dependency graph between items.
//! - [`cycles`] — Reachability checks used to keep the dependency graph
//!   acyclic.

pub mod blocking;
pub mod cycles;
pub mod hierarchy;
