//! In-memory external collaborators with configurable failure modes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stepflow::{
    AssetStore, BoundaryError, DenialReason, EligibilityDecision, EligibilityDenial,
    EligibilityGate, IdentityToken, RecordKind, RecordStore, StoredRecord, SubmissionPipeline,
    SubmissionRecord, UsageCounter,
};

/// Gate with a canned decision and a call counter.
pub struct FakeGate {
    decision: Mutex<Result<EligibilityDecision, String>>,
    pub calls: AtomicU32,
}

impl FakeGate {
    pub fn allowing() -> Arc<Self> {
        Arc::new(Self {
            decision: Mutex::new(Ok(EligibilityDecision::Allowed)),
            calls: AtomicU32::new(0),
        })
    }

    pub fn denying(reason: DenialReason, current_usage: u32, limit: u32) -> Arc<Self> {
        Arc::new(Self {
            decision: Mutex::new(Ok(EligibilityDecision::Denied(EligibilityDenial {
                reason,
                current_usage,
                limit,
            }))),
            calls: AtomicU32::new(0),
        })
    }

    pub fn unreachable_backend() -> Arc<Self> {
        Arc::new(Self {
            decision: Mutex::new(Err("eligibility service timed out".to_string())),
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EligibilityGate for FakeGate {
    async fn check(
        &self,
        _token: &IdentityToken,
        _kind: &RecordKind,
    ) -> Result<EligibilityDecision, BoundaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.decision.lock().unwrap() {
            Ok(decision) => Ok(decision.clone()),
            Err(message) => Err(message.clone().into()),
        }
    }
}

/// Asset store that either stores uploads under a fake public URL or fails.
pub struct FakeAssetStore {
    fail: bool,
    pub uploads: AtomicU32,
}

impl FakeAssetStore {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            uploads: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            uploads: AtomicU32::new(0),
        })
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload(&self, _content: &[u8], target_path: &str) -> Result<String, BoundaryError> {
        if self.fail {
            return Err("bucket unavailable".into());
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.example.test/{target_path}"))
    }
}

/// Record store that captures inserted records, or fails verbatim.
pub struct FakeRecordStore {
    failure: Option<String>,
    pub inserted: Mutex<Vec<SubmissionRecord>>,
}

impl FakeRecordStore {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            inserted: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            inserted: Mutex::new(Vec::new()),
        })
    }

    pub fn insert_count(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }

    pub fn last_record(&self) -> SubmissionRecord {
        self.inserted
            .lock()
            .unwrap()
            .last()
            .expect("no record was inserted")
            .clone()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn insert(&self, record: &SubmissionRecord) -> Result<StoredRecord, BoundaryError> {
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(record.clone());
        Ok(StoredRecord {
            id: format!("rec-{}", inserted.len()),
        })
    }
}

/// Usage counter with a call counter and an optional failure mode.
pub struct FakeUsageCounter {
    fail: bool,
    pub increments: AtomicU32,
}

impl FakeUsageCounter {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            increments: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            increments: AtomicU32::new(0),
        })
    }

    pub fn increment_count(&self) -> u32 {
        self.increments.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageCounter for FakeUsageCounter {
    async fn increment(
        &self,
        _token: &IdentityToken,
        _kind: &RecordKind,
    ) -> Result<(), BoundaryError> {
        if self.fail {
            return Err("usage service rejected the increment".into());
        }
        self.increments.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Bundle of collaborators plus the pipeline wired over them.
pub struct TestCollaborators {
    pub assets: Arc<FakeAssetStore>,
    pub gate: Arc<FakeGate>,
    pub records: Arc<FakeRecordStore>,
    pub usage: Arc<FakeUsageCounter>,
}

impl TestCollaborators {
    pub fn all_working() -> Self {
        Self {
            assets: FakeAssetStore::working(),
            gate: FakeGate::allowing(),
            records: FakeRecordStore::working(),
            usage: FakeUsageCounter::working(),
        }
    }

    pub fn pipeline(&self) -> SubmissionPipeline {
        SubmissionPipeline::new(
            self.assets.clone(),
            self.gate.clone(),
            self.records.clone(),
            self.usage.clone(),
        )
    }
}
