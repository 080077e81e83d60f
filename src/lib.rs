//! Stepped workflow engine for resumable, conditionally-branching forms.
//!
//! Stepflow provides the control and data model behind multi-step input
//! processes (onboarding flows, posting wizards, extension forms):
//!
//! - **Static step table** — each [`StepSpec`] names its required fields,
//!   a validator, and an optional skip rule that can jump past later steps
//!   or redirect to a different workflow entirely
//! - **Resumable state** — every successful transition persists a
//!   [`WorkflowState`] snapshot behind an injected [`SnapshotStore`]
//! - **Pure derived values** — expiration dates and adjusted prices are
//!   computed from injected inputs, never from ambient clocks or cached
//!   configuration
//! - **Staged submission** — the final step runs a [`SubmissionPipeline`]
//!   with an explicit fatal/non-fatal policy per stage, gated by a
//!   just-in-time eligibility check
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     WorkflowController<S>                           │
//! │                                                                     │
//! │   go_next:  validate step → evaluate skip rule → persist snapshot   │
//! │   go_back:  pop history (no skip rules, no field loss)              │
//! │   submit:   validate final step → SubmissionPipeline                │
//! │                1. asset upload        (best-effort)                 │
//! │                2. eligibility gate    (fatal)                       │
//! │                3. record construction                               │
//! │                4. persistence         (fatal, verbatim reason)      │
//! │                5. usage counter       (best-effort)                 │
//! │                6. clear snapshot, completion notice                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stepflow::{
//!     Fields, MemorySnapshotStore, MountOptions, StepSpec, Transition,
//!     WorkflowController, WorkflowDefinition,
//! };
//!
//! let definition = Arc::new(
//!     WorkflowDefinition::builder("job_posting")
//!         .step(StepSpec::new("details").requires(["title"]))
//!         .step(StepSpec::new("confirm"))
//!         .build()?,
//! );
//!
//! let mut controller = WorkflowController::mount(
//!     definition,
//!     MemorySnapshotStore::new(),
//!     "wizard:job_posting:user-1",
//!     MountOptions::default(),
//! )?;
//!
//! let fields: Fields = [("title", "Fix leaking tap")].into_iter().collect();
//! controller.update_fields(fields)?;
//! assert_eq!(controller.go_next()?, Transition::Advanced { to: 1 });
//! # Ok::<(), stepflow::Error>(())
//! ```
//!
//! One workflow instance is driven by one session at a time; the engine is
//! single-writer by design. While a submission is in flight the phase is
//! `Submitting` and all further calls are rejected until the pipeline
//! settles, which is what makes double-submit impossible.

mod controller;
mod derived;
mod eligibility;
mod error;
mod field;
mod pipeline;
mod state;
mod step;
mod store;

pub use controller::{MountOptions, Transition, WorkflowController};
pub use derived::{
    compute_expiration, compute_price, expiration_after_days, DerivedPricing, DurationCode,
    PriceOverride, PricingPolicy, MAX_LISTING_DAYS,
};
pub use eligibility::{
    DenialReason, EligibilityDecision, EligibilityDenial, EligibilityGate, IdentityToken,
    RecordKind,
};
pub use error::{BoundaryError, Error, Result};
pub use field::{Coordinates, FieldValue, Fields};
pub use nonempty::NonEmpty;
pub use pipeline::{
    AssetStore, AssetUpload, CompletionNotice, PricingRequest, RecordStore, StoredRecord,
    SubmissionPipeline, SubmissionRecord, SubmitError, SubmitRequest, UsageCounter,
};
pub use state::{Phase, WorkflowState};
pub use step::{
    FieldError, SkipTarget, StepId, StepSpec, ValidationResult, WorkflowDefinition,
    WorkflowDefinitionBuilder,
};
pub use store::{MemorySnapshotStore, SnapshotStore};
