//! End-to-end projection tests: drive the engine through a realistic
//! project lifecycle, then check what the tree and schedule views report.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use girder_core::engine;
use girder_core::graph::blocking::DependencyGraph;
use girder_core::{ItemDraft, ItemId, ItemPatch, NoopHooks, ProjectId, Snapshot, Status, TreeNode};
use girder_schedule::{compute_critical_path, project_tree};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn create(
    snap: &mut Snapshot,
    id: &str,
    parent: Option<&str>,
    due: Option<DateTime<Utc>>,
) -> Result<()> {
    engine::create_item(
        snap,
        &mut NoopHooks,
        ItemId::from(id),
        ProjectId::from("p"),
        parent.map(ItemId::from),
        ItemDraft {
            title: format!("Task {id}"),
            due_date: due,
            ..ItemDraft::default()
        },
        now(),
    )?;
    Ok(())
}

#[test]
fn lifecycle_tree_and_schedule() -> Result<()> {
    let mut snap = Snapshot::new();
    let project = ProjectId::from("p");

    // Phase 1 feeds phase 2; each phase has two leaves.
    create(&mut snap, "phase1", None, Some(now() + Duration::days(5)))?;
    create(&mut snap, "phase2", None, Some(now() + Duration::days(10)))?;
    create(&mut snap, "p1-a", Some("phase1"), None)?;
    create(&mut snap, "p1-b", Some("phase1"), None)?;
    create(&mut snap, "p2-a", Some("phase2"), None)?;
    create(&mut snap, "p2-b", Some("phase2"), None)?;
    engine::set_dependency(
        &mut snap,
        &mut NoopHooks,
        DependencyGraph::plain_edge(ItemId::from("phase1"), ItemId::from("phase2")),
        now(),
    )?;

    // Finish phase 1's leaves; the phase rolls up to Done on its own.
    for (minute, id) in [(1, "p1-a"), (2, "p1-b")] {
        engine::update_item(
            &mut snap,
            &mut NoopHooks,
            &ItemId::from(id),
            ItemPatch {
                status: Some(Status::Done),
                ..ItemPatch::default()
            },
            now() + Duration::minutes(minute),
        )?;
    }
    assert!(snap.item(&ItemId::from("phase1")).unwrap().status.is_done());
    // Top-level view: phase1 Done (100) and phase2 Todo (0).
    assert_eq!(snap.progress_percent(&project), 50.0);

    let tree = project_tree(&snap, &project);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].wbs_code.as_deref(), Some("1"));
    assert_eq!(tree[0].children[0].wbs_code.as_deref(), Some("1.1"));
    assert_eq!(tree[1].children[1].wbs_code.as_deref(), Some("2.2"));

    // Wire shape: item fields are flattened into the node object.
    let json = serde_json::to_value(&tree[0])?;
    assert_eq!(json["id"], "phase1");
    assert_eq!(json["status"], "Done");
    assert_eq!(json["wbs_code"], "1");
    assert_eq!(json["children"][0]["id"], "p1-a");

    // phase2 sets the project deadline, so it is the critical item.
    let schedule = compute_critical_path(&snap, &project, now());
    assert_eq!(schedule.project_finish, now() + Duration::days(10));
    assert!(schedule.is_critical(&ItemId::from("phase2")));
    assert_eq!(
        schedule
            .schedule(&ItemId::from("phase1"))
            .and_then(|s| s.slack_days),
        Some(5)
    );
    assert!(!schedule.is_critical(&ItemId::from("p1-a")), "undated leaf");

    Ok(())
}

// ---------------------------------------------------------------------------
// WBS properties
// ---------------------------------------------------------------------------

fn collect_codes(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        out.push(node.wbs_code.clone().expect("assigned"));
        collect_codes(&node.children, out);
    }
}

fn check_children(nodes: &[TreeNode]) {
    for node in nodes {
        let code = node.wbs_code.as_deref().expect("assigned");
        for (position, child) in node.children.iter().enumerate() {
            let child_code = child.wbs_code.as_deref().expect("assigned");
            assert_eq!(child_code, format!("{code}.{}", position + 1));
        }
        check_children(&node.children);
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    /// Random forests always get one unique, parent-prefixed code per item.
    #[test]
    fn wbs_codes_are_unique_and_prefixed(
        parents in prop::collection::vec(prop::option::of(0u8..12), 1..12),
        sorts in prop::collection::vec(0i64..50, 12),
    ) {
        let mut snap = Snapshot::new();
        let project = ProjectId::from("p");

        for (slot, parent) in parents.iter().enumerate() {
            // Only earlier slots can be parents, which keeps the forest
            // acyclic by construction.
            let parent_id = parent
                .map(usize::from)
                .filter(|p| *p < slot)
                .map(|p| ItemId::from(format!("i{p}")));
            let _ = engine::create_item(
                &mut snap,
                &mut NoopHooks,
                ItemId::from(format!("i{slot}")),
                project.clone(),
                parent_id,
                ItemDraft {
                    title: format!("item {slot}"),
                    sort_index: Some(sorts[slot]),
                    ..ItemDraft::default()
                },
                now() + Duration::seconds(slot as i64),
            );
        }

        let tree = project_tree(&snap, &project);

        let mut codes = Vec::new();
        collect_codes(&tree, &mut codes);
        prop_assert_eq!(codes.len(), snap.len());
        let unique: HashSet<&String> = codes.iter().collect();
        prop_assert_eq!(unique.len(), codes.len());

        check_children(&tree);
    }
}
