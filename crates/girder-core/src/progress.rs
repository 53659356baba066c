//! Project progress aggregation.
//!
//! Only top-level items count: each contributes a fixed score for its
//! status, and the project's progress is their plain average rounded to
//! two decimal places. Nested items feed in indirectly, through the rollup
//! that derives their top-level ancestor's status. Writes are suppressed
//! when the recomputed value is within `0.01` of the stored one, so
//! repeated recomputation stays quiet.

use tracing::debug;

use crate::hooks::EngineHooks;
use crate::model::ids::ProjectId;
use crate::model::item::Status;
use crate::snapshot::Snapshot;

/// Movement below this is treated as noise and not written back.
pub const WRITE_THRESHOLD: f64 = 0.01;

/// Contribution of a single status toward project progress.
#[must_use]
pub const fn status_score(status: Status) -> f64 {
    match status {
        Status::Done => 100.0,
        Status::Review => 80.0,
        Status::InProgress => 50.0,
        Status::OnHold => 25.0,
        Status::Backlog | Status::Todo => 0.0,
    }
}

/// Average status score over the top-level items of `project`, rounded to
/// two decimals. A project with no top-level items is `0.0`.
#[must_use]
pub fn compute(snap: &Snapshot, project: &ProjectId) -> f64 {
    let roots = snap.roots_of(project);
    if roots.is_empty() {
        return 0.0;
    }
    let total: f64 = roots
        .iter()
        .filter_map(|id| snap.item(id))
        .map(|item| status_score(item.status))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let count = roots.len() as f64;
    round2(total / count)
}

/// Recompute a project's progress and store it when it moved by more than
/// [`WRITE_THRESHOLD`]. Returns the value now on record.
pub fn recompute(snap: &mut Snapshot, hooks: &mut dyn EngineHooks, project: &ProjectId) -> f64 {
    let fresh = compute(snap, project);
    let stored = snap.progress_percent(project);
    if (fresh - stored).abs() <= WRITE_THRESHOLD {
        return stored;
    }
    debug!(project = %project, from = stored, to = fresh, "progress updated");
    snap.set_progress(project.clone(), fresh);
    hooks.progress_changed(project, fresh);
    fresh
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::recording::{Event, RecordingHooks};
    use crate::hooks::NoopHooks;
    use crate::model::ids::ItemId;
    use crate::model::item::{ItemFields, Priority};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn item(id: &str, project: &str, status: Status) -> ItemFields {
        child_item(id, project, None, status)
    }

    fn child_item(id: &str, project: &str, parent: Option<&str>, status: Status) -> ItemFields {
        ItemFields {
            id: ItemId::from(id),
            project_id: ProjectId::from(project),
            parent_id: parent.map(ItemId::from),
            title: format!("Item {id}"),
            description: None,
            status,
            priority: Priority::Medium,
            tags: Vec::new(),
            assignee_ids: Vec::new(),
            start_date: None,
            due_date: None,
            deadline_at: None,
            completed_at: None,
            sort_index: 10,
            is_milestone: false,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn snap_with(items: Vec<ItemFields>) -> Snapshot {
        let mut snap = Snapshot::new();
        for it in items {
            snap.insert(it).expect("unique ids");
        }
        snap
    }

    #[test]
    fn scores_fixed_per_status() {
        assert_eq!(status_score(Status::Done), 100.0);
        assert_eq!(status_score(Status::Review), 80.0);
        assert_eq!(status_score(Status::InProgress), 50.0);
        assert_eq!(status_score(Status::OnHold), 25.0);
        assert_eq!(status_score(Status::Todo), 0.0);
        assert_eq!(status_score(Status::Backlog), 0.0);
    }

    #[test]
    fn empty_project_is_zero() {
        let snap = Snapshot::new();
        assert_eq!(compute(&snap, &ProjectId::from("p")), 0.0);
    }

    #[test]
    fn average_over_mixed_statuses() {
        // (100 + 80 + 50 + 0) / 4 = 57.5
        let snap = snap_with(vec![
            item("a", "p", Status::Done),
            item("b", "p", Status::Review),
            item("c", "p", Status::InProgress),
            item("d", "p", Status::Todo),
        ]);
        assert_eq!(compute(&snap, &ProjectId::from("p")), 57.5);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // (100 + 0 + 0) / 3 = 33.333... -> 33.33
        let snap = snap_with(vec![
            item("a", "p", Status::Done),
            item("b", "p", Status::Todo),
            item("c", "p", Status::Todo),
        ]);
        assert_eq!(compute(&snap, &ProjectId::from("p")), 33.33);
    }

    #[test]
    fn nested_items_do_not_contribute_directly() {
        let snap = snap_with(vec![
            item("top", "p", Status::Done),
            child_item("nested", "p", Some("top"), Status::Todo),
        ]);
        assert_eq!(compute(&snap, &ProjectId::from("p")), 100.0);
    }

    #[test]
    fn other_projects_do_not_contribute() {
        let snap = snap_with(vec![
            item("a", "p", Status::Done),
            item("x", "other", Status::Todo),
        ]);
        assert_eq!(compute(&snap, &ProjectId::from("p")), 100.0);
    }

    #[test]
    fn recompute_writes_and_notifies_on_movement() {
        let mut snap = snap_with(vec![item("a", "p", Status::Done)]);
        let mut hooks = RecordingHooks::default();
        let project = ProjectId::from("p");

        let value = recompute(&mut snap, &mut hooks, &project);
        assert_eq!(value, 100.0);
        assert_eq!(snap.progress_percent(&project), 100.0);
        assert_eq!(
            hooks.events,
            vec![Event::ProgressChanged {
                project: "p".to_owned(),
                percent: 100.0
            }]
        );
    }

    #[test]
    fn recompute_suppresses_sub_threshold_movement() {
        let mut snap = snap_with(vec![item("a", "p", Status::Done)]);
        let project = ProjectId::from("p");
        snap.set_progress(project.clone(), 100.0);

        let mut hooks = RecordingHooks::default();
        let value = recompute(&mut snap, &mut hooks, &project);
        assert_eq!(value, 100.0);
        assert!(hooks.events.is_empty(), "no movement, no notification");
    }

    #[test]
    fn unstored_project_reads_zero() {
        let snap = Snapshot::new();
        assert_eq!(snap.progress_percent(&ProjectId::from("p")), 0.0);
    }

    #[test]
    fn recompute_handles_empty_project_after_deletes() {
        let mut snap = snap_with(vec![item("a", "p", Status::Done)]);
        let project = ProjectId::from("p");
        recompute(&mut snap, &mut NoopHooks, &project);
        snap.remove(&ItemId::from("a"));

        let value = recompute(&mut snap, &mut NoopHooks, &project);
        assert_eq!(value, 0.0);
        assert_eq!(snap.progress_percent(&project), 0.0);
    }
}
