//! Submission pipeline: staged side effects with explicit failure policy.
//!
//! The pipeline runs its stages strictly in sequence — later stages depend
//! on earlier outcomes (the asset URL must be known before the record is
//! built), and the fatal/non-fatal split requires the ordering:
//!
//! | Stage                    | Failure policy                              |
//! |--------------------------|---------------------------------------------|
//! | 1. asset upload          | non-fatal — log, continue with empty asset  |
//! | 2. eligibility check     | fatal — nothing persisted                   |
//! | 3. record construction   | pure, cannot fail                           |
//! | 4. persistence           | fatal — underlying reason surfaced verbatim |
//! | 5. usage counter         | non-fatal — record stays, log only          |
//! | 6. completion            | snapshot cleared, notice returned           |
//!
//! A fatal persistence failure after a successful asset upload leaves the
//! asset orphaned; the pipeline deliberately issues no compensating delete.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::derived::{compute_expiration, compute_price, DurationCode, PricingPolicy};
use crate::eligibility::{
    EligibilityDecision, EligibilityDenial, EligibilityGate, IdentityToken, RecordKind,
};
use crate::error::{BoundaryError, Error};
use crate::field::Fields;
use crate::step::FieldError;

/// Binary content queued for best-effort upload alongside a submission.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub content: Vec<u8>,
    pub target_path: String,
}

impl AssetUpload {
    /// Create an upload request.
    pub fn new(content: Vec<u8>, target_path: impl Into<String>) -> Self {
        Self {
            content,
            target_path: target_path.into(),
        }
    }
}

/// External binary storage. Errors here never abort the pipeline.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `content` at `target_path` and return a public URL.
    async fn upload(
        &self,
        content: &[u8],
        target_path: &str,
    ) -> std::result::Result<String, BoundaryError>;
}

/// External row persistence. Errors here are fatal and shown verbatim.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist the fully-built record, returning its generated identifier.
    async fn insert(&self, record: &SubmissionRecord)
        -> std::result::Result<StoredRecord, BoundaryError>;
}

/// Fire-and-forget usage accounting keyed by identity and record kind.
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Increment the usage counter. Failure is logged, never surfaced.
    async fn increment(
        &self,
        token: &IdentityToken,
        kind: &RecordKind,
    ) -> std::result::Result<(), BoundaryError>;
}

/// The flattened submission: final field values plus computed fields.
///
/// Built only after the eligibility gate passes — the record is never
/// partially constructed and submitted.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub kind: RecordKind,
    pub fields: Fields,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub final_price: Option<f64>,
    pub asset_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The persisted record as acknowledged by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
}

/// Pricing input for a submission: which option was chosen, at what base
/// price, under which (freshly fetched) policy.
#[derive(Debug, Clone)]
pub struct PricingRequest {
    pub option_id: String,
    pub base_price: f64,
    pub policy: PricingPolicy,
}

/// Everything the caller supplies when the final step is submitted.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub identity: IdentityToken,
    pub kind: RecordKind,
    pub duration: DurationCode,
    pub pricing: Option<PricingRequest>,
    pub asset: Option<AssetUpload>,
    /// Injected reference time for expiration and creation timestamps.
    pub now: OffsetDateTime,
}

/// Success payload: enough for a notification and navigation.
#[derive(Debug, Clone)]
pub struct CompletionNotice {
    pub record_id: String,
    /// Human-readable summary including the computed expiration date.
    pub summary: String,
    pub expires_at: OffsetDateTime,
    pub asset_url: Option<String>,
}

/// Why a submission did not complete.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The final step failed validation; nothing was attempted.
    #[error("step validation failed")]
    Validation(Vec<FieldError>),

    /// The eligibility gate denied the submission. State is preserved so
    /// the user can act on the reason (upgrade, wait) and retry.
    #[error("{0}")]
    Denied(EligibilityDenial),

    /// The eligibility check itself could not be performed.
    #[error("eligibility check failed: {0}")]
    Gate(BoundaryError),

    /// The persistence call failed; the store's reason is shown verbatim.
    #[error("{0}")]
    Persist(BoundaryError),

    /// Engine-level fault (snapshot storage, phase misuse).
    #[error(transparent)]
    Engine(#[from] Error),
}

/// Orchestrates the staged submission against the external collaborators.
///
/// See the module docs for the stage table. The pipeline holds no mutable
/// state of its own and can be shared across workflow instances.
#[derive(Clone)]
pub struct SubmissionPipeline {
    assets: Arc<dyn AssetStore>,
    gate: Arc<dyn EligibilityGate>,
    records: Arc<dyn RecordStore>,
    usage: Arc<dyn UsageCounter>,
}

impl SubmissionPipeline {
    /// Bundle the four external collaborators.
    pub fn new(
        assets: Arc<dyn AssetStore>,
        gate: Arc<dyn EligibilityGate>,
        records: Arc<dyn RecordStore>,
        usage: Arc<dyn UsageCounter>,
    ) -> Self {
        Self {
            assets,
            gate,
            records,
            usage,
        }
    }

    /// Run the pipeline for the given fields and request.
    ///
    /// Returns a [`CompletionNotice`] on success. On any fatal error the
    /// caller's state is untouched: nothing was persisted on a gate
    /// failure, and a persistence failure surfaces the store's reason.
    pub async fn run(
        &self,
        fields: &Fields,
        request: &SubmitRequest,
    ) -> std::result::Result<CompletionNotice, SubmitError> {
        let run_id = Uuid::new_v4();
        debug!(%run_id, kind = %request.kind, "submission pipeline started");

        // Stage 1: best-effort asset upload.
        let asset_url = match &request.asset {
            Some(asset) => match self.assets.upload(&asset.content, &asset.target_path).await {
                Ok(url) => Some(url),
                Err(error) => {
                    warn!(%run_id, %error, "asset upload failed; continuing without asset");
                    None
                }
            },
            None => None,
        };

        // Stage 2: eligibility re-check, fatal on denial or transport failure.
        match self.gate.check(&request.identity, &request.kind).await {
            Ok(EligibilityDecision::Allowed) => {}
            Ok(EligibilityDecision::Denied(denial)) => {
                debug!(%run_id, %denial, "submission denied by eligibility gate");
                return Err(SubmitError::Denied(denial));
            }
            Err(error) => return Err(SubmitError::Gate(error)),
        }

        // Stage 3: record construction from fields plus derived values.
        let expires_at = compute_expiration(request.duration, request.now);
        let final_price = request
            .pricing
            .as_ref()
            .map(|p| compute_price(&p.option_id, p.base_price, &p.policy).final_price);
        let record = SubmissionRecord {
            kind: request.kind.clone(),
            fields: fields.clone(),
            expires_at,
            final_price,
            asset_url,
            created_at: request.now,
        };

        // Stage 4: persistence, fatal with the store's reason verbatim.
        let stored = self
            .records
            .insert(&record)
            .await
            .map_err(SubmitError::Persist)?;

        // Stage 5: best-effort usage counter; the record is already
        // persisted and is not rolled back.
        if let Err(error) = self.usage.increment(&request.identity, &request.kind).await {
            warn!(%run_id, %error, "usage counter increment failed");
        }

        debug!(%run_id, record_id = %stored.id, "submission pipeline completed");
        Ok(CompletionNotice {
            record_id: stored.id,
            summary: format!(
                "{} published, visible until {}",
                request.kind,
                expires_at.date()
            ),
            expires_at,
            asset_url: record.asset_url,
        })
    }
}
