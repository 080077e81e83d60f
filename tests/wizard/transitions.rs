//! Transition mechanics: branching, resume, back navigation.

use anyhow::Result;
use stepflow::{
    MemorySnapshotStore, MountOptions, Phase, SnapshotStore, Transition, WorkflowController,
};

use crate::support::init_test_tracing;
use crate::support::job_posting::{definition, fill_to_confirm, mount, set, SNAPSHOT_KEY};

#[test]
fn full_walk_reaches_confirm() {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);

    fill_to_confirm(&mut controller);

    assert_eq!(controller.state().step_index(), 4);
    assert_eq!(controller.current_step().id().as_str(), "confirm");
    assert_eq!(controller.state().history(), &[0, 1, 2, 3, 4]);
}

#[test]
fn commercial_category_redirects_to_vacancy_workflow() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);

    set(&mut controller, "category", "commercial");
    let transition = controller.go_next()?;

    assert_eq!(
        transition,
        Transition::Redirected {
            target: "/vacancies/new".into()
        }
    );
    assert_eq!(controller.phase(), &Phase::Terminated("/vacancies/new".into()));
    Ok(())
}

#[test]
fn urgent_job_skips_the_extras_screen() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);

    set(&mut controller, "category", "residential");
    controller.go_next()?;
    set(&mut controller, "title", "Burst pipe in bathroom");
    set(&mut controller, "description", "Water everywhere, need someone today.");
    set(&mut controller, "urgent", true);
    controller.go_next()?;
    set(
        &mut controller,
        "location",
        stepflow::Coordinates::new(51.92, 4.48),
    );

    let transition = controller.go_next()?;
    assert_eq!(transition, Transition::Jumped { from: 2, to: 4 });
    assert_eq!(controller.current_step().id().as_str(), "confirm");
    // The jump records both endpoints, so "back" lands on the location
    // screen rather than re-running the skip rule.
    assert_eq!(controller.state().history(), &[0, 1, 2, 4]);
    controller.go_back()?;
    assert_eq!(controller.state().step_index(), 2);
    Ok(())
}

#[test]
fn rejected_step_leaves_snapshot_untouched() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);

    set(&mut controller, "category", "residential");
    controller.go_next()?;
    let snapshot_before = store.get(SNAPSHOT_KEY)?.unwrap();

    // Title too short: the details validator rejects it.
    set(&mut controller, "title", "Tap");
    set(&mut controller, "description", "Drips.");
    let transition = controller.go_next()?;

    let Transition::Rejected(errors) = transition else {
        panic!("expected rejection, got {transition:?}");
    };
    assert_eq!(errors[0].field, "title");
    assert_eq!(controller.state().step_index(), 1);
    assert_eq!(store.get(SNAPSHOT_KEY)?.unwrap(), snapshot_before);
    Ok(())
}

#[test]
fn forward_then_back_preserves_all_fields() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);

    set(&mut controller, "category", "residential");
    controller.go_next()?;
    set(&mut controller, "title", "Paint the garden fence");
    set(&mut controller, "description", "Roughly 20 meters of fencing.");
    controller.go_next()?;

    let fields_before = controller.fields().clone();
    controller.go_back()?;

    assert_eq!(controller.state().step_index(), 1);
    assert_eq!(controller.fields(), &fields_before);
    Ok(())
}

#[test]
fn abandoned_run_resumes_from_snapshot() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    {
        let mut controller = mount(&store);
        set(&mut controller, "category", "residential");
        controller.go_next()?;
        set(&mut controller, "title", "Replace broken roof tiles");
        set(&mut controller, "description", "Three tiles cracked after the storm.");
        controller.go_next()?;
        // Browser tab closed here.
    }

    let resumed = mount(&store);
    assert_eq!(resumed.state().step_index(), 2);
    assert_eq!(resumed.fields().text("title"), Some("Replace broken roof tiles"));
    assert_eq!(resumed.state().history(), &[0, 1, 2]);
    Ok(())
}

#[test]
fn preselected_branch_starts_past_category() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = WorkflowController::mount(
        definition(),
        store.clone(),
        SNAPSHOT_KEY,
        MountOptions {
            initial_state: None,
            start_step: 1,
            min_reachable_step: 1,
        },
    )?;

    assert_eq!(controller.current_step().id().as_str(), "details");
    // The category screen was answered by the pre-selection; "back" may
    // not reach it.
    controller.go_back()?;
    assert_eq!(controller.state().step_index(), 1);
    Ok(())
}

#[test]
fn reset_starts_over_and_clears_the_snapshot() -> Result<()> {
    init_test_tracing();
    let store = MemorySnapshotStore::new();
    let mut controller = mount(&store);
    set(&mut controller, "category", "residential");
    controller.go_next()?;

    controller.reset()?;

    assert_eq!(controller.state().step_index(), 0);
    assert!(controller.fields().is_empty());
    assert_eq!(store.get(SNAPSHOT_KEY)?, None);
    Ok(())
}
