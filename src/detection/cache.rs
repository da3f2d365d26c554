// In-memory detection cache keyed by client IP

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::DetectionRecord;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DetectionCounts {
    pub total: usize,
    pub matched: usize,
}

/// Last detection per IP. Entries are overwritten, never evicted, so the map
/// grows with the number of distinct addresses seen.
#[derive(Debug, Clone, Default)]
pub struct DetectionCache {
    records: Arc<RwLock<HashMap<String, DetectionRecord>>>,
}

impl DetectionCache {
    pub fn new() -> Self {
        DetectionCache::default()
    }

    /// Store the record for `ip`, replacing any previous one. Returns the
    /// number of distinct addresses after the write.
    pub async fn record(&self, ip: &str, record: DetectionRecord) -> usize {
        let mut records = self.records.write().await;
        records.insert(ip.to_string(), record);
        records.len()
    }

    #[allow(dead_code)] // Used in tests
    pub async fn get(&self, ip: &str) -> Option<DetectionRecord> {
        let records = self.records.read().await;
        records.get(ip).cloned()
    }

    pub async fn count(&self) -> DetectionCounts {
        let records = self.records.read().await;
        DetectionCounts {
            total: records.len(),
            matched: records.values().filter(|r| r.is_vpn()).count(),
        }
    }
}
