//! A realistic job-posting wizard definition.
//!
//! Five screens: category → details → location → extras → confirm.
//! Commercial work redirects to the vacancy workflow; urgent jobs skip
//! the extras screen entirely.

use std::sync::Arc;

use stepflow::{
    Coordinates, FieldValue, Fields, MemorySnapshotStore, MountOptions, SkipTarget, StepSpec,
    Transition, ValidationResult, WorkflowController, WorkflowDefinition,
};

pub const SNAPSHOT_KEY: &str = "wizard:job_posting:user-1";

pub fn definition() -> Arc<WorkflowDefinition> {
    Arc::new(
        WorkflowDefinition::builder("job_posting")
            .step(
                StepSpec::new("category")
                    .requires(["category"])
                    .skip_when(|fields| {
                        (fields.text("category") == Some("commercial"))
                            .then(|| SkipTarget::redirect("/vacancies/new"))
                    }),
            )
            .step(
                StepSpec::new("details")
                    .requires(["title", "description"])
                    .validate(|fields| {
                        if fields.text("title").is_some_and(|t| t.len() >= 5) {
                            ValidationResult::ok()
                        } else {
                            ValidationResult::invalid("title", "must be at least 5 characters")
                        }
                    }),
            )
            .step(
                StepSpec::new("location")
                    .requires(["location"])
                    .skip_when(|fields| {
                        (fields.flag("urgent") == Some(true))
                            .then(|| SkipTarget::step("confirm"))
                    }),
            )
            .step(StepSpec::new("extras").requires(["duration"]))
            .step(StepSpec::new("confirm").validate(|fields| {
                if fields.flag("accepted_terms") == Some(true) {
                    ValidationResult::ok()
                } else {
                    ValidationResult::invalid("accepted_terms", "must be accepted")
                }
            }))
            .build()
            .expect("job posting definition is valid"),
    )
}

pub fn mount(store: &MemorySnapshotStore) -> WorkflowController<MemorySnapshotStore> {
    WorkflowController::mount(
        definition(),
        store.clone(),
        SNAPSHOT_KEY,
        MountOptions::default(),
    )
    .expect("mount succeeds")
}

pub fn set(
    controller: &mut WorkflowController<MemorySnapshotStore>,
    name: &str,
    value: impl Into<FieldValue>,
) {
    let fields: Fields = [(name, value.into())].into_iter().collect();
    controller.update_fields(fields).expect("workflow is editable");
}

/// Walk a controller through every screen to the confirm step.
pub fn fill_to_confirm(controller: &mut WorkflowController<MemorySnapshotStore>) {
    set(controller, "category", "residential");
    assert_eq!(controller.go_next().unwrap(), Transition::Advanced { to: 1 });

    set(controller, "title", "Fix leaking kitchen tap");
    set(controller, "description", "Tap drips constantly, needs a new washer.");
    assert_eq!(controller.go_next().unwrap(), Transition::Advanced { to: 2 });

    set(controller, "location", Coordinates::new(52.37, 4.89));
    assert_eq!(controller.go_next().unwrap(), Transition::Advanced { to: 3 });

    set(controller, "duration", "2_weeks");
    assert_eq!(controller.go_next().unwrap(), Transition::Advanced { to: 4 });

    set(controller, "accepted_terms", true);
}
