//! Step definitions: the static per-workflow table of screens.
//!
//! A [`WorkflowDefinition`] is an ordered, non-empty sequence of
//! [`StepSpec`]s. Each step names the fields it is responsible for
//! collecting, an optional validator over the full field map, and an
//! optional skip rule that can jump past later steps or hand the session
//! to a different workflow entirely.
//!
//! # Example
//!
//! ```
//! use stepflow::{SkipTarget, StepSpec, ValidationResult, WorkflowDefinition};
//!
//! let definition = WorkflowDefinition::builder("job_posting")
//!     .step(
//!         StepSpec::new("category")
//!             .requires(["category"])
//!             .skip_when(|fields| {
//!                 // Commercial work belongs in the vacancy workflow.
//!                 (fields.text("category") == Some("commercial"))
//!                     .then(|| SkipTarget::redirect("/vacancies/new"))
//!             }),
//!     )
//!     .step(StepSpec::new("details").requires(["title", "description"]))
//!     .step(StepSpec::new("confirm"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(definition.len(), 3);
//! ```

use std::panic::{self, AssertUnwindSafe};

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::field::Fields;

/// A step identifier, unique within one workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Create a new step ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Where a skip rule sends the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipTarget {
    /// Jump directly to the named step in the same workflow.
    Step(StepId),
    /// Leave this workflow; the caller decides how to navigate to `target`.
    Redirect(String),
}

impl SkipTarget {
    /// Skip to another step in the same workflow.
    pub fn step(id: impl Into<StepId>) -> Self {
        SkipTarget::Step(id.into())
    }

    /// Terminate this workflow and hand navigation to the caller.
    pub fn redirect(target: impl Into<String>) -> Self {
        SkipTarget::Redirect(target.into())
    }
}

/// A single validation failure attributed to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    /// Create a field-level error.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Outcome of validating one step: either clean, or a list of per-field
/// reasons. There is no partial-success state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        ValidationResult::Valid
    }

    /// A failing result with a single field reason.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationResult::Invalid(vec![FieldError::new(field, reason)])
    }

    /// Returns true for [`ValidationResult::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

type Validator = Box<dyn Fn(&Fields) -> ValidationResult + Send + Sync>;
type SkipRule = Box<dyn Fn(&Fields) -> Option<SkipTarget> + Send + Sync>;

/// One screen's worth of fields plus its validator and skip rule.
pub struct StepSpec {
    id: StepId,
    fields: Vec<String>,
    validator: Option<Validator>,
    skip: Option<SkipRule>,
}

impl StepSpec {
    /// Create a step with the given id and no fields, validator, or skip rule.
    pub fn new(id: impl Into<StepId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            validator: None,
            skip: None,
        }
    }

    /// Name the fields this step must have collected before advancing.
    ///
    /// A missing required field fails validation before the custom
    /// validator runs.
    pub fn requires<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Attach a validator over the full field map.
    pub fn validate(mut self, validator: impl Fn(&Fields) -> ValidationResult + Send + Sync + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Attach a skip rule, evaluated once per successful validation.
    ///
    /// Returning `None` means the workflow advances sequentially.
    pub fn skip_when(mut self, rule: impl Fn(&Fields) -> Option<SkipTarget> + Send + Sync + 'static) -> Self {
        self.skip = Some(Box::new(rule));
        self
    }

    /// The step's identifier.
    pub fn id(&self) -> &StepId {
        &self.id
    }

    /// The fields this step is responsible for collecting.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Run the required-field check and the custom validator.
    ///
    /// A panicking validator is reported as a failure of the whole step,
    /// attributed to the step id, never propagated as a crash.
    pub(crate) fn run_validation(&self, fields: &Fields) -> ValidationResult {
        let missing: Vec<FieldError> = self
            .fields
            .iter()
            .filter(|name| !fields.contains(name))
            .map(|name| FieldError::new(name.clone(), "is required"))
            .collect();
        if !missing.is_empty() {
            return ValidationResult::Invalid(missing);
        }

        let Some(validator) = &self.validator else {
            return ValidationResult::Valid;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| validator(fields))) {
            Ok(result) => result,
            Err(_) => {
                warn!(step = %self.id, "validator panicked; treating as step-level failure");
                ValidationResult::invalid(self.id.as_str(), "validation failed")
            }
        }
    }

    /// Evaluate the skip rule against the current field values.
    pub(crate) fn skip_target(&self, fields: &Fields) -> Option<SkipTarget> {
        self.skip.as_ref().and_then(|rule| rule(fields))
    }
}

impl std::fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSpec")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("has_validator", &self.validator.is_some())
            .field("has_skip_rule", &self.skip.is_some())
            .finish()
    }
}

/// The ordered step table for one workflow.
///
/// Step ids are unique (checked at build time). The step list is non-empty
/// by construction ([`NonEmpty`]).
#[derive(Debug)]
pub struct WorkflowDefinition {
    name: String,
    steps: NonEmpty<StepSpec>,
}

impl WorkflowDefinition {
    /// Start building a definition.
    pub fn builder(name: impl Into<String>) -> WorkflowDefinitionBuilder {
        WorkflowDefinitionBuilder {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// The workflow's name ("job_posting", "onboarding", ...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; the step list is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the final step.
    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Look up a step by position.
    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.steps.get(index)
    }

    /// Find the position of a step id.
    pub fn index_of(&self, id: &StepId) -> Option<usize> {
        self.steps.iter().position(|step| step.id() == id)
    }

    /// Iterate over steps in order.
    pub fn steps(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter()
    }
}

/// Builder for [`WorkflowDefinition`].
#[derive(Debug)]
pub struct WorkflowDefinitionBuilder {
    name: String,
    steps: Vec<StepSpec>,
}

impl WorkflowDefinitionBuilder {
    /// Append a step.
    pub fn step(mut self, spec: StepSpec) -> Self {
        self.steps.push(spec);
        self
    }

    /// Validate and build the definition.
    ///
    /// Fails on an empty step list or duplicate step ids. Skip targets are
    /// produced by closures and are checked at transition time instead.
    pub fn build(self) -> Result<WorkflowDefinition> {
        for (i, step) in self.steps.iter().enumerate() {
            if self.steps[..i].iter().any(|other| other.id() == step.id()) {
                return Err(Error::DuplicateStepId(step.id().to_string()));
            }
        }

        let steps =
            NonEmpty::from_vec(self.steps).ok_or_else(|| Error::EmptyWorkflow(self.name.clone()))?;

        Ok(WorkflowDefinition {
            name: self.name,
            steps,
        })
    }
}
