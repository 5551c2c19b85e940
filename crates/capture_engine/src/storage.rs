use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use capture_core::{CapturedRecord, RecordKind, TierUsage};

use crate::persist::AtomicFileWriter;
use crate::types::StorageError;

/// Quota of the compact tier, for small frequently-synced records.
pub const COMPACT_QUOTA_BYTES: u64 = 100 * 1024;
/// Quota of the bulk tier, for large snapshot payloads.
pub const BULK_QUOTA_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Compact,
    Bulk,
}

impl TierKind {
    /// Placement policy: decided once at admission, never re-evaluated.
    pub fn for_record(kind: RecordKind) -> Self {
        match kind {
            RecordKind::UrlOnly => TierKind::Compact,
            RecordKind::HtmlSnapshot => TierKind::Bulk,
        }
    }

    pub fn default_quota(self) -> u64 {
        match self {
            TierKind::Compact => COMPACT_QUOTA_BYTES,
            TierKind::Bulk => BULK_QUOTA_BYTES,
        }
    }

    fn filename(self) -> &'static str {
        match self {
            TierKind::Compact => "tier_compact.json",
            TierKind::Bulk => "tier_bulk.json",
        }
    }
}

/// One persistent key-value tier. The capture store is the only caller; no
/// other component writes the tiers directly.
#[async_trait::async_trait]
pub trait TierStore: Send + Sync {
    fn tier(&self) -> TierKind;
    fn quota_bytes(&self) -> u64;
    async fn get(&self, key: &str) -> Result<Option<CapturedRecord>, StorageError>;
    async fn put(&self, key: &str, record: CapturedRecord) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
    async fn all(&self) -> Result<Vec<CapturedRecord>, StorageError>;
}

/// Serialized footprint of one record: key plus its JSON value, the way the
/// underlying stores charge usage against the quota.
pub fn record_size(key: &str, record: &CapturedRecord) -> Result<u64, StorageError> {
    let value = serde_json::to_string(record)?;
    Ok((key.len() + value.len()) as u64)
}

/// Computes a tier's usage view by serializing its whole key set.
pub async fn tier_usage(store: &dyn TierStore) -> Result<TierUsage, StorageError> {
    let mut sizes = Vec::new();
    for record in store.all().await? {
        let size = record_size(&record.url, &record)?;
        sizes.push((record.url.clone(), size));
    }
    Ok(TierUsage::from_sizes(store.quota_bytes(), sizes))
}

/// In-process tier for tests and ephemeral runs.
pub struct MemoryTier {
    tier: TierKind,
    quota: u64,
    records: Mutex<HashMap<String, CapturedRecord>>,
}

impl MemoryTier {
    pub fn new(tier: TierKind) -> Self {
        Self::with_quota(tier, tier.default_quota())
    }

    pub fn with_quota(tier: TierKind, quota: u64) -> Self {
        Self {
            tier,
            quota,
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl TierStore for MemoryTier {
    fn tier(&self) -> TierKind {
        self.tier
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }

    async fn get(&self, key: &str) -> Result<Option<CapturedRecord>, StorageError> {
        Ok(self.records.lock().expect("tier map lock").get(key).cloned())
    }

    async fn put(&self, key: &str, record: CapturedRecord) -> Result<(), StorageError> {
        self.records
            .lock()
            .expect("tier map lock")
            .insert(key.to_string(), record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self
            .records
            .lock()
            .expect("tier map lock")
            .remove(key)
            .is_some())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.records.lock().expect("tier map lock").clear();
        Ok(())
    }

    async fn all(&self) -> Result<Vec<CapturedRecord>, StorageError> {
        Ok(self
            .records
            .lock()
            .expect("tier map lock")
            .values()
            .cloned()
            .collect())
    }
}

/// File-backed tier: one JSON map per tier, loaded at open and rewritten
/// atomically on every mutation.
pub struct JsonFileTier {
    tier: TierKind,
    quota: u64,
    writer: AtomicFileWriter,
    filename: String,
    records: Mutex<HashMap<String, CapturedRecord>>,
}

impl JsonFileTier {
    pub fn open(state_dir: &Path, tier: TierKind) -> Result<Self, StorageError> {
        Self::open_with_quota(state_dir, tier, tier.default_quota())
    }

    pub fn open_with_quota(
        state_dir: &Path,
        tier: TierKind,
        quota: u64,
    ) -> Result<Self, StorageError> {
        let filename = tier.filename().to_string();
        let path = state_dir.join(&filename);
        let records = match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|err| StorageError::Corrupt {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(StorageError::Io(err)),
        };
        Ok(Self {
            tier,
            quota,
            writer: AtomicFileWriter::new(PathBuf::from(state_dir)),
            filename,
            records: Mutex::new(records),
        })
    }

    fn flush(&self, records: &HashMap<String, CapturedRecord>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(records)?;
        self.writer.write(&self.filename, &content)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TierStore for JsonFileTier {
    fn tier(&self) -> TierKind {
        self.tier
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }

    async fn get(&self, key: &str) -> Result<Option<CapturedRecord>, StorageError> {
        Ok(self.records.lock().expect("tier map lock").get(key).cloned())
    }

    async fn put(&self, key: &str, record: CapturedRecord) -> Result<(), StorageError> {
        let mut records = self.records.lock().expect("tier map lock");
        records.insert(key.to_string(), record);
        self.flush(&records)
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut records = self.records.lock().expect("tier map lock");
        let removed = records.remove(key).is_some();
        if removed {
            self.flush(&records)?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut records = self.records.lock().expect("tier map lock");
        records.clear();
        self.flush(&records)
    }

    async fn all(&self) -> Result<Vec<CapturedRecord>, StorageError> {
        Ok(self
            .records
            .lock()
            .expect("tier map lock")
            .values()
            .cloned()
            .collect())
    }
}
