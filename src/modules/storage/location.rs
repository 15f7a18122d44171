//! Storage sub-path strategies
//!
//! Blobs are spread across partition directories instead of one flat
//! directory. The strategy is injected, so sharding schemes can change
//! without touching the file service.

use chrono::{DateTime, Utc};

/// Computes the partition sub-path for a blob being stored now
pub trait LocationStrategy: Send + Sync {
    fn current_location(&self) -> String;
}

/// `YYYY/MM/DD` partitions in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePartition;

impl DatePartition {
    pub fn for_date(at: DateTime<Utc>) -> String {
        at.format("%Y/%m/%d").to_string()
    }
}

impl LocationStrategy for DatePartition {
    fn current_location(&self) -> String {
        Self::for_date(Utc::now())
    }
}

/// Always returns the same sub-path
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedLocation(pub String);

#[cfg(test)]
impl LocationStrategy for FixedLocation {
    fn current_location(&self) -> String {
        self.0.clone()
    }
}
