//! Workflow state: the mutable position and collected values of one run.
//!
//! [`WorkflowState`] is the resumability snapshot payload — it serializes
//! to `{ "stepIndex": .., "fields": .., "history": .. }` and must
//! round-trip exactly. [`Phase`] is the in-memory lifecycle and is never
//! persisted: a rehydrated workflow always resumes in `Editing`.

use serde::{Deserialize, Serialize};

use crate::field::Fields;

/// Where the workflow currently stands.
///
/// Transitions:
///
/// ```text
/// Editing(i) --validate ok--> Editing(i+1 or skip target)
/// Editing(last) --submit-----> Submitting
/// Submitting --pipeline ok---> Completed
/// Submitting --fatal error---> Editing(last)        (user may retry)
/// Editing(i) --back----------> Editing(history.pop())
/// Editing(i) --redirect------> Terminated(target)
/// ```
///
/// `Completed` and `Terminated` are terminal; no further mutation is
/// permitted once either is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Collecting input on the given step.
    Editing(usize),
    /// The submission pipeline is in flight; all mutations are rejected.
    Submitting,
    /// The submission pipeline finished successfully.
    Completed,
    /// A skip rule redirected the session elsewhere; no record was built.
    Terminated(String),
}

impl Phase {
    /// Returns true once the workflow can no longer be mutated.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Terminated(_))
    }
}

/// The mutable state of one workflow run.
///
/// `history` is the full sequence of visited step indices; its last entry
/// is always the current index. A skip jump therefore records both the
/// origin and the target, and "back" is a pure pop that never re-runs
/// skip rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    step_index: usize,
    fields: Fields,
    history: Vec<usize>,
}

impl WorkflowState {
    /// Fresh state positioned at `start`.
    pub fn new(start: usize) -> Self {
        Self {
            step_index: start,
            fields: Fields::new(),
            history: vec![start],
        }
    }

    /// The current step index.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// The collected field values.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Visited step indices, oldest first; last entry is the current step.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Merge new values into the field map (grow-or-overwrite only).
    pub(crate) fn merge_fields(&mut self, values: Fields) {
        self.fields.merge(values);
    }

    /// Move to `index`, recording it in history.
    pub(crate) fn advance_to(&mut self, index: usize) {
        self.history.push(index);
        self.step_index = index;
    }

    /// Pop back to the previously visited step.
    ///
    /// Returns the restored index, or `None` (leaving state untouched) when
    /// already at the first entry or when the restore target would fall
    /// below `min_reachable`.
    pub(crate) fn back(&mut self, min_reachable: usize) -> Option<usize> {
        if self.history.len() < 2 {
            return None;
        }
        let target = self.history[self.history.len() - 2];
        if target < min_reachable {
            return None;
        }
        self.history.pop();
        self.step_index = target;
        Some(target)
    }
}
