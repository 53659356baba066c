#![forbid(unsafe_code)]
//! girder-schedule library.
//!
//! Read-side projections over a `girder-core` snapshot: the WBS-coded
//! project tree and date-based critical path analysis. Nothing here
//! mutates the snapshot.
//!
//! # Conventions
//!
//! - **Errors**: projections are total over any snapshot the engine can
//!   produce and return values directly.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`,
//!   `trace!`).

pub mod critical_path;
pub mod graph;
pub mod wbs;

pub use critical_path::{compute_critical_path, CriticalPathResult, ItemSchedule};
pub use graph::ScheduleGraph;
pub use wbs::assign_codes;

use girder_core::graph::hierarchy;
use girder_core::{ProjectId, Snapshot, TreeNode};

/// The project's nested tree with WBS codes assigned: siblings ordered by
/// `(sort_index, created_at)`, codes numbered 1-based at every level.
#[must_use]
pub fn project_tree(snap: &Snapshot, project: &ProjectId) -> Vec<TreeNode> {
    let mut tree = hierarchy::build_tree(snap, project);
    wbs::assign_codes(&mut tree);
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use girder_core::engine;
    use girder_core::{ItemDraft, ItemId, NoopHooks};

    #[test]
    fn project_tree_orders_and_codes() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut snap = Snapshot::new();
        let project = ProjectId::from("p");

        for (id, parent, sort_index) in [
            ("t2", None, 20),
            ("t1", None, 10),
            ("s2", Some("t1"), 15),
            ("s1", Some("t1"), 5),
        ] {
            engine::create_item(
                &mut snap,
                &mut NoopHooks,
                ItemId::from(id),
                project.clone(),
                parent.map(ItemId::from),
                ItemDraft {
                    title: id.to_owned(),
                    sort_index: Some(sort_index),
                    ..ItemDraft::default()
                },
                now,
            )
            .expect("create");
        }

        let tree = project_tree(&snap, &project);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].item.id.as_str(), "t1");
        assert_eq!(tree[0].wbs_code.as_deref(), Some("1"));
        assert_eq!(tree[1].item.id.as_str(), "t2");
        assert_eq!(tree[1].wbs_code.as_deref(), Some("2"));
        assert_eq!(tree[0].children[0].item.id.as_str(), "s1");
        assert_eq!(tree[0].children[0].wbs_code.as_deref(), Some("1.1"));
        assert_eq!(tree[0].children[1].item.id.as_str(), "s2");
        assert_eq!(tree[0].children[1].wbs_code.as_deref(), Some("1.2"));
    }
}
