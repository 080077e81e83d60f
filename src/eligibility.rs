//! Pre-submission eligibility checks against quota/subscription state.
//!
//! The gate is consulted exactly once, immediately before the submission
//! record is built. A check performed earlier (say, when the wizard opens)
//! is advisory only — quota or subscription state may change while the
//! user fills the form, so the pipeline always re-verifies.
//!
//! A denial is data, not an error: it carries a categorized reason plus
//! the numeric usage and limit so the caller can render a specific,
//! actionable message. Only transport failures surface as errors, and
//! those are fatal to the submission.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BoundaryError;

/// Opaque identity token for the submitting user/session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentityToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The kind of record a workflow intends to create ("job", "vacancy", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKind(String);

impl RecordKind {
    /// Wrap a record kind name.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Borrow the kind as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for RecordKind {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Why a submission was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NoSubscription,
    QuotaExceeded,
    Unauthorized,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DenialReason::NoSubscription => "no active subscription",
            DenialReason::QuotaExceeded => "posting quota exceeded",
            DenialReason::Unauthorized => "not authorized for this record kind",
        };
        f.write_str(text)
    }
}

/// A categorized denial with enough detail to render a specific message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityDenial {
    pub reason: DenialReason,
    pub current_usage: u32,
    pub limit: u32,
}

impl std::fmt::Display for EligibilityDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} of {} used)",
            self.reason, self.current_usage, self.limit
        )
    }
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityDecision {
    Allowed,
    Denied(EligibilityDenial),
}

/// External quota/subscription check.
///
/// Implementations call the managed backend; tests substitute a canned
/// decision. Transport failures (`Err`) abort the submission pipeline;
/// denials (`Ok(Denied)`) are surfaced to the user with state preserved
/// for retry.
#[async_trait]
pub trait EligibilityGate: Send + Sync {
    /// Check whether `token` may create a record of `kind`.
    async fn check(
        &self,
        token: &IdentityToken,
        kind: &RecordKind,
    ) -> std::result::Result<EligibilityDecision, BoundaryError>;
}
