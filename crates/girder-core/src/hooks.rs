//! Mutation observer seam.
//!
//! Every engine operation takes a `&mut dyn EngineHooks` and reports the
//! side effects it produced. Hosts implement the trait to emit events,
//! persist audit rows, or notify assignees; the engine itself stays
//! storage-agnostic. All methods default to no-ops so implementors only
//! override what they care about.

use crate::model::ids::ProjectId;
use crate::model::item::{ItemFields, Status};

/// Callbacks fired while a mutation is being applied.
///
/// Calls arrive after the snapshot has already been updated, so the
/// `item` argument reflects the post-change state.
pub trait EngineHooks {
    /// An item's status changed, whether by direct edit or rollup.
    fn status_changed(&mut self, _item: &ItemFields, _previous: Status) {}

    /// An item's set of active blockers just became empty.
    fn item_unblocked(&mut self, _item: &ItemFields) {}

    /// A project's aggregate progress moved by more than the write
    /// threshold.
    fn progress_changed(&mut self, _project: &ProjectId, _percent: f64) {}
}

/// Hook implementation that ignores everything. Useful for hosts that only
/// inspect the returned [`MutationOutcome`](crate::engine::MutationOutcome).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl EngineHooks for NoopHooks {}
