//! Step transition control: advance, retreat, branch, submit.
//!
//! The controller is the only component that mutates [`WorkflowState`].
//! Every successful transition persists the snapshot before the in-memory
//! state is committed, so a storage fault can never leave the snapshot
//! ahead of or behind the live state.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::field::Fields;
use crate::pipeline::{CompletionNotice, SubmissionPipeline, SubmitError, SubmitRequest};
use crate::state::{Phase, WorkflowState};
use crate::step::{FieldError, SkipTarget, StepSpec, ValidationResult, WorkflowDefinition};
use crate::store::{load_snapshot, save_snapshot, SnapshotStore};

/// Outcome of a forward transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Advanced to the next sequential step.
    Advanced { to: usize },
    /// A skip rule jumped over one or more steps.
    Jumped { from: usize, to: usize },
    /// A skip rule handed the session to another workflow; this run is
    /// over and no record will be built.
    Redirected { target: String },
    /// The final step validated cleanly; the next move is
    /// [`submit`](WorkflowController::submit), which runs the pipeline.
    ReadyToSubmit,
    /// Validation failed; the step and snapshot are unchanged.
    Rejected(Vec<FieldError>),
}

/// How to position a workflow at mount time.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Explicit starting state. When set, any stored snapshot is ignored
    /// (but left in place).
    pub initial_state: Option<WorkflowState>,
    /// Step to start on when there is no snapshot and no explicit state.
    /// Non-zero when the workflow is launched with a pre-selected branch.
    pub start_step: usize,
    /// Lower bound for "back" navigation. A workflow launched past step 0
    /// should usually set this to `start_step` so the user cannot back
    /// into steps the pre-selection already answered.
    pub min_reachable_step: usize,
}

/// Drives one workflow instance through its steps.
///
/// Dropping the controller abandons the run: in-memory state is discarded
/// but the persisted snapshot stays, so a later mount resumes where the
/// user left off. Use [`reset`](WorkflowController::reset) for an explicit
/// "start over" that also clears the snapshot.
pub struct WorkflowController<S: SnapshotStore> {
    definition: Arc<WorkflowDefinition>,
    snapshots: S,
    snapshot_key: String,
    state: WorkflowState,
    phase: Phase,
    start_step: usize,
    min_reachable_step: usize,
}

impl<S: SnapshotStore> WorkflowController<S> {
    /// Mount a workflow instance.
    ///
    /// Position resolution: an explicit `options.initial_state` wins; next
    /// a stored snapshot under `snapshot_key`; otherwise a fresh state at
    /// `options.start_step`. A stored snapshot whose index falls past the
    /// definition (written against an older, longer workflow) is logged and
    /// discarded like a corrupt one; only an explicit out-of-range
    /// `initial_state` or `start_step` is an error.
    pub fn mount(
        definition: Arc<WorkflowDefinition>,
        snapshots: S,
        snapshot_key: impl Into<String>,
        options: MountOptions,
    ) -> Result<Self> {
        let snapshot_key = snapshot_key.into();

        let state = match options.initial_state {
            Some(state) => state,
            None => match load_snapshot(&snapshots, &snapshot_key)? {
                Some(state) if state.step_index() < definition.len() => state,
                // A snapshot written against an older, longer definition
                // is as unusable as a corrupt one: discard and mount fresh.
                Some(state) => {
                    tracing::warn!(
                        key = %snapshot_key,
                        index = state.step_index(),
                        steps = definition.len(),
                        "stored snapshot points past the definition; starting fresh"
                    );
                    WorkflowState::new(options.start_step)
                }
                None => WorkflowState::new(options.start_step),
            },
        };

        if state.step_index() >= definition.len() {
            return Err(Error::StepOutOfRange {
                index: state.step_index(),
                steps: definition.len(),
            });
        }

        let phase = Phase::Editing(state.step_index());
        Ok(Self {
            definition,
            snapshots,
            snapshot_key,
            state,
            phase,
            start_step: options.start_step,
            min_reachable_step: options.min_reachable_step,
        })
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The current state (position, fields, history).
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The collected field values.
    pub fn fields(&self) -> &Fields {
        self.state.fields()
    }

    /// The step the workflow is currently on.
    pub fn current_step(&self) -> &StepSpec {
        self.definition
            .step(self.state.step_index())
            .expect("step index is validated at mount and on every transition")
    }

    /// Merge newly collected values into the state.
    ///
    /// Values only grow or overwrite; nothing is removed. The snapshot is
    /// not written here — it is written on the next successful transition.
    pub fn update_fields(&mut self, values: Fields) -> Result<()> {
        self.ensure_editing()?;
        self.state.merge_fields(values);
        Ok(())
    }

    /// Validate the active step and move forward.
    ///
    /// On validation failure returns [`Transition::Rejected`] with the
    /// state and snapshot untouched. On success the step's skip rule is
    /// evaluated once: a redirect terminates the workflow, a step target
    /// jumps there, otherwise the next sequential step is entered. The
    /// snapshot is persisted before the in-memory state changes hands.
    ///
    /// On the final step a clean validation returns
    /// [`Transition::ReadyToSubmit`] without moving; the final step's
    /// "next" is [`submit`](WorkflowController::submit).
    pub fn go_next(&mut self) -> Result<Transition> {
        self.ensure_editing()?;

        let from = self.state.step_index();
        let step = self
            .definition
            .step(from)
            .expect("step index is validated at mount and on every transition");

        if let ValidationResult::Invalid(errors) = step.run_validation(self.state.fields()) {
            debug!(workflow = self.definition.name(), step = %step.id(), "step rejected");
            return Ok(Transition::Rejected(errors));
        }

        if let Some(target) = step.skip_target(self.state.fields()) {
            match target {
                SkipTarget::Redirect(target) => {
                    debug!(workflow = self.definition.name(), %target, "workflow redirected");
                    self.phase = Phase::Terminated(target.clone());
                    return Ok(Transition::Redirected { target });
                }
                SkipTarget::Step(id) => {
                    let to = self
                        .definition
                        .index_of(&id)
                        .ok_or_else(|| Error::UnknownSkipTarget {
                            from: step.id().to_string(),
                            to: id.to_string(),
                        })?;
                    self.commit_move(to)?;
                    debug!(workflow = self.definition.name(), from, to, "skip rule jumped");
                    return Ok(Transition::Jumped { from, to });
                }
            }
        }

        if from == self.definition.last_index() {
            debug!(workflow = self.definition.name(), "final step validated; ready to submit");
            return Ok(Transition::ReadyToSubmit);
        }

        let to = from + 1;
        self.commit_move(to)?;
        debug!(workflow = self.definition.name(), from, to, "advanced");
        Ok(Transition::Advanced { to })
    }

    /// Return to the previously visited step.
    ///
    /// Pops history without re-running skip rules and without clearing any
    /// field values. Silent no-op when already at the first reachable step.
    pub fn go_back(&mut self) -> Result<()> {
        self.ensure_editing()?;

        let mut next = self.state.clone();
        let Some(to) = next.back(self.min_reachable_step) else {
            return Ok(());
        };

        save_snapshot(&self.snapshots, &self.snapshot_key, &next)?;
        self.state = next;
        self.phase = Phase::Editing(to);
        debug!(workflow = self.definition.name(), to, "went back");
        Ok(())
    }

    /// Validate the final step and run the submission pipeline.
    ///
    /// While the pipeline is in flight the phase is `Submitting` and all
    /// further calls are rejected, so a double-click cannot create two
    /// records. On success the snapshot is cleared and the phase becomes
    /// `Completed`. On any fatal error the phase returns to editing the
    /// final step with all entered data and the snapshot intact.
    pub async fn submit(
        &mut self,
        pipeline: &SubmissionPipeline,
        request: SubmitRequest,
    ) -> std::result::Result<CompletionNotice, SubmitError> {
        match &self.phase {
            Phase::Editing(_) => {}
            // `&mut self` already serializes direct callers across the
            // await; this arm rejects wrappers that hand out reentrant
            // access to one controller.
            Phase::Submitting => return Err(Error::SubmissionInFlight.into()),
            Phase::Completed | Phase::Terminated(_) => return Err(Error::WorkflowFinished.into()),
        }

        let current = self.state.step_index();
        if current != self.definition.last_index() {
            return Err(Error::NotAtFinalStep { current }.into());
        }

        let step = self
            .definition
            .step(current)
            .expect("step index is validated at mount and on every transition");
        if let ValidationResult::Invalid(errors) = step.run_validation(self.state.fields()) {
            return Err(SubmitError::Validation(errors));
        }

        self.phase = Phase::Submitting;
        let outcome = pipeline.run(self.state.fields(), &request).await;

        match outcome {
            Ok(notice) => {
                // Clearing the snapshot is best-effort; the record exists
                // either way and a stale snapshot only resurfaces a form.
                if let Err(error) = self.snapshots.delete(&self.snapshot_key) {
                    tracing::warn!(key = %self.snapshot_key, %error, "failed to clear snapshot");
                }
                self.phase = Phase::Completed;
                Ok(notice)
            }
            Err(error) => {
                self.phase = Phase::Editing(current);
                Err(error)
            }
        }
    }

    /// Explicit "start over": fresh state at the start step, snapshot gone.
    pub fn reset(&mut self) -> Result<()> {
        if self.phase == Phase::Submitting {
            return Err(Error::SubmissionInFlight);
        }
        self.snapshots.delete(&self.snapshot_key)?;
        self.state = WorkflowState::new(self.start_step);
        self.phase = Phase::Editing(self.start_step);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn ensure_editing(&self) -> Result<()> {
        match &self.phase {
            Phase::Editing(_) => Ok(()),
            Phase::Submitting => Err(Error::SubmissionInFlight),
            Phase::Completed | Phase::Terminated(_) => Err(Error::WorkflowFinished),
        }
    }

    /// Persist a candidate state, then commit it in memory.
    fn commit_move(&mut self, to: usize) -> Result<()> {
        let mut next = self.state.clone();
        next.advance_to(to);
        save_snapshot(&self.snapshots, &self.snapshot_key, &next)?;
        self.state = next;
        self.phase = Phase::Editing(to);
        Ok(())
    }
}
