use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agent_logging::{agent_debug, agent_info};
use capture_core::{
    normalize_url_for_dedup, CapturedRecord, RecordKind, ReviewVerdict, SessionState, UsageReport,
};

use crate::probe::ProbesAuthentication;
use crate::storage::{tier_usage, TierKind, TierStore};
use crate::types::{Admission, StorageError};

/// Injected wall clock; keeps the engine free of direct system-time calls.
pub type UtcClock = Arc<dyn Fn() -> String + Send + Sync>;

/// Record lifecycle over the two storage tiers: admission, review
/// transitions, removal, bulk operations. The sole writer of the tiers.
pub struct CaptureStore {
    compact: Box<dyn TierStore>,
    bulk: Box<dyn TierStore>,
    next_seq: AtomicU64,
    now_utc: UtcClock,
}

impl CaptureStore {
    /// Opens the store over two tiers, resuming the admission sequence from
    /// the highest persisted value.
    pub async fn open(
        compact: Box<dyn TierStore>,
        bulk: Box<dyn TierStore>,
        now_utc: UtcClock,
    ) -> Result<Self, StorageError> {
        let mut max_seq = 0;
        for record in compact.all().await?.iter().chain(bulk.all().await?.iter()) {
            max_seq = max_seq.max(record.seq);
        }
        Ok(Self {
            compact,
            bulk,
            next_seq: AtomicU64::new(max_seq + 1),
            now_utc,
        })
    }

    /// Admission: tracking gate, dedup check, auth probe, tier placement.
    ///
    /// The dedup check and the write are not atomic with respect to other
    /// stores over the same tiers; callers are expected to funnel admissions
    /// through a single store instance.
    pub async fn admit(
        &self,
        url: &str,
        html: Option<String>,
        session: &SessionState,
        probe: &dyn ProbesAuthentication,
    ) -> Result<Admission, StorageError> {
        if !session.tracking_enabled {
            agent_debug!("admission skipped, tracking disabled: {url}");
            return Ok(Admission::TrackingDisabled);
        }

        let key = normalize_url_for_dedup(url);
        if self.find(&key).await?.is_some() {
            agent_debug!("admission no-op, record exists: {key}");
            return Ok(Admission::AlreadyPresent);
        }

        if html.is_none() {
            if session.force_html_storage {
                return Ok(Admission::SnapshotRequired);
            }
            if probe.requires_auth(url).await {
                agent_info!("page appears auth-gated, requesting snapshot: {url}");
                return Ok(Admission::SnapshotRequired);
            }
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let captured_utc = (self.now_utc)();
        let record = match html {
            Some(payload) => CapturedRecord::html_snapshot(url.trim(), payload, seq, captured_utc),
            None => CapturedRecord::url_only(url.trim(), seq, captured_utc),
        };
        let kind = record.kind;
        self.tier_for(kind).put(&key, record).await?;
        agent_info!("admitted {kind:?} record seq={seq} for {key}");
        Ok(Admission::Admitted(kind))
    }

    /// All records, both tiers merged, newest first.
    pub async fn records(&self) -> Result<Vec<CapturedRecord>, StorageError> {
        let mut records = self.compact.all().await?;
        records.extend(self.bulk.all().await?);
        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(records)
    }

    /// Validated records in stored (admission) order.
    pub async fn validated_records(&self) -> Result<Vec<CapturedRecord>, StorageError> {
        let mut records = self.records().await?;
        records.retain(CapturedRecord::is_validated);
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    /// Applies a reviewer verdict. False when the URL is unknown.
    pub async fn update_validation(
        &self,
        url: &str,
        verdict: ReviewVerdict,
    ) -> Result<bool, StorageError> {
        let key = normalize_url_for_dedup(url);
        let Some((tier, mut record)) = self.find(&key).await? else {
            return Ok(false);
        };
        if record.apply_review(verdict) {
            self.tier_of(tier).put(&key, record).await?;
        }
        Ok(true)
    }

    /// Removes a record from whichever tier holds it.
    pub async fn remove(&self, url: &str) -> Result<bool, StorageError> {
        let key = normalize_url_for_dedup(url);
        if self.compact.remove(&key).await? {
            return Ok(true);
        }
        self.bulk.remove(&key).await
    }

    pub async fn remove_all(&self) -> Result<(), StorageError> {
        self.compact.clear().await?;
        self.bulk.clear().await?;
        agent_info!("cleared both storage tiers");
        Ok(())
    }

    /// Advances every pending record to validated; others are untouched.
    pub async fn validate_all_pending(&self) -> Result<usize, StorageError> {
        let mut advanced = 0;
        for tier in [TierKind::Compact, TierKind::Bulk] {
            let store = self.tier_of(tier);
            for mut record in store.all().await? {
                if record.is_pending() {
                    record.apply_review(ReviewVerdict::Validated);
                    let key = normalize_url_for_dedup(&record.url);
                    store.put(&key, record).await?;
                    advanced += 1;
                }
            }
        }
        agent_info!("bulk-validated {advanced} pending records");
        Ok(advanced)
    }

    pub async fn usage(&self) -> Result<UsageReport, StorageError> {
        let compact = tier_usage(self.compact.as_ref()).await?;
        let bulk = tier_usage(self.bulk.as_ref()).await?;
        Ok(UsageReport::new(compact, bulk))
    }

    async fn find(&self, key: &str) -> Result<Option<(TierKind, CapturedRecord)>, StorageError> {
        if let Some(record) = self.compact.get(key).await? {
            return Ok(Some((TierKind::Compact, record)));
        }
        if let Some(record) = self.bulk.get(key).await? {
            return Ok(Some((TierKind::Bulk, record)));
        }
        Ok(None)
    }

    fn tier_for(&self, kind: RecordKind) -> &dyn TierStore {
        self.tier_of(TierKind::for_record(kind))
    }

    fn tier_of(&self, tier: TierKind) -> &dyn TierStore {
        match tier {
            TierKind::Compact => self.compact.as_ref(),
            TierKind::Bulk => self.bulk.as_ref(),
        }
    }
}
