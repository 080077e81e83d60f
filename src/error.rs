//! Error types for stepflow.

use thiserror::Error;

/// A `Result` alias with [`enum@Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by an external collaborator (snapshot storage, asset
/// upload, eligibility transport, record persistence, usage counter).
///
/// Collaborators own their error types; the engine only needs `Display`
/// so the underlying reason can be surfaced verbatim to the user.
pub type BoundaryError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in stepflow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to serialize or deserialize a workflow snapshot.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot store rejected a read, write, or delete.
    #[error("snapshot store: {0}")]
    Snapshot(#[source] BoundaryError),

    /// A workflow definition was built without any steps.
    #[error("workflow {0} has no steps")]
    EmptyWorkflow(String),

    /// The same step id was registered twice in one definition.
    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    /// A skip rule produced a step id that is not in the definition.
    ///
    /// Skip rules are closures over field values, so their targets can only
    /// be checked when the rule fires.
    #[error("skip rule on step {from} targets unknown step id: {to}")]
    UnknownSkipTarget { from: String, to: String },

    /// A step index fell outside the definition.
    #[error("step index {index} out of range for workflow with {steps} steps")]
    StepOutOfRange { index: usize, steps: usize },

    /// `submit` was called before the workflow reached the final step.
    #[error("cannot submit from step {current}; the workflow has not reached its final step")]
    NotAtFinalStep { current: usize },

    /// A mutation was attempted while the submission pipeline is in flight.
    #[error("submission already in flight; wait for the pipeline to settle")]
    SubmissionInFlight,

    /// A mutation was attempted after the workflow completed or terminated.
    #[error("workflow has already finished")]
    WorkflowFinished,
}

impl Error {
    /// Wrap a snapshot-store failure.
    pub fn snapshot(source: impl Into<BoundaryError>) -> Self {
        Error::Snapshot(source.into())
    }
}
