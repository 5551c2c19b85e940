use serde::{Deserialize, Serialize};

/// Usage at or above this share of a tier's quota is reported as a warning.
/// Advisory only; writes are never blocked on quota.
pub const QUOTA_WARN_PERCENT: f64 = 80.0;

/// Per-key share of a tier, sorted descending by size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyUsage {
    pub key: String,
    pub size: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierUsage {
    pub bytes_in_use: u64,
    pub quota_bytes: u64,
    /// Share of quota in use, capped at 100.
    pub percentage_used: f64,
    pub near_quota: bool,
    pub breakdown: Vec<KeyUsage>,
}

impl TierUsage {
    /// Builds a usage view from per-key serialized sizes.
    pub fn from_sizes(quota_bytes: u64, sizes: impl IntoIterator<Item = (String, u64)>) -> Self {
        let mut entries: Vec<(String, u64)> = sizes.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let bytes_in_use: u64 = entries.iter().map(|(_, size)| size).sum();
        let percentage_used = if quota_bytes == 0 {
            0.0
        } else {
            (bytes_in_use as f64 * 100.0 / quota_bytes as f64).min(100.0)
        };

        let breakdown = entries
            .into_iter()
            .map(|(key, size)| {
                let percentage = if bytes_in_use == 0 {
                    0.0
                } else {
                    size as f64 * 100.0 / bytes_in_use as f64
                };
                KeyUsage {
                    key,
                    size,
                    percentage,
                }
            })
            .collect();

        Self {
            bytes_in_use,
            quota_bytes,
            percentage_used,
            near_quota: percentage_used >= QUOTA_WARN_PERCENT,
            breakdown,
        }
    }

    pub fn empty(quota_bytes: u64) -> Self {
        Self::from_sizes(quota_bytes, std::iter::empty())
    }
}

/// Usage across both tiers plus combined totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub compact: TierUsage,
    pub bulk: TierUsage,
    pub total_bytes_in_use: u64,
}

impl UsageReport {
    pub fn new(compact: TierUsage, bulk: TierUsage) -> Self {
        let total_bytes_in_use = compact.bytes_in_use + bulk.bytes_in_use;
        Self {
            compact,
            bulk,
            total_bytes_in_use,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TierUsage, QUOTA_WARN_PERCENT};

    #[test]
    fn breakdown_sorted_descending_by_size() {
        let usage = TierUsage::from_sizes(
            1_000,
            vec![
                ("small".to_string(), 10),
                ("large".to_string(), 300),
                ("mid".to_string(), 90),
            ],
        );
        let keys: Vec<&str> = usage.breakdown.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["large", "mid", "small"]);
        assert_eq!(usage.bytes_in_use, 400);
        assert_eq!(usage.percentage_used, 40.0);
        assert!(!usage.near_quota);
    }

    #[test]
    fn percentage_is_capped_at_one_hundred() {
        let usage = TierUsage::from_sizes(100, vec![("over".to_string(), 250)]);
        assert_eq!(usage.percentage_used, 100.0);
        assert!(usage.near_quota);
    }

    #[test]
    fn warning_threshold_is_advisory() {
        let usage = TierUsage::from_sizes(100, vec![("k".to_string(), 85)]);
        assert_eq!(usage.percentage_used, 85.0);
        assert!(usage.percentage_used >= QUOTA_WARN_PERCENT);
        assert!(usage.near_quota);
    }

    #[test]
    fn empty_tier_reports_zero() {
        let usage = TierUsage::empty(100);
        assert_eq!(usage.bytes_in_use, 0);
        assert_eq!(usage.percentage_used, 0.0);
        assert!(usage.breakdown.is_empty());
    }
}
