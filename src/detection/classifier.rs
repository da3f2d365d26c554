// Prefix classifier with first-match-wins lookup

use std::sync::Arc;

use super::{ClassificationResult, PrefixTable};

#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<PrefixTable>,
}

impl Classifier {
    pub fn new(table: Arc<PrefixTable>) -> Self {
        Classifier { table }
    }

    /// Classify an address by string prefix. Any input is accepted; only
    /// surrounding whitespace is removed before matching.
    pub fn classify(&self, ip: &str) -> ClassificationResult {
        let ip = ip.trim();

        for bucket in self.table.buckets() {
            for prefix in &bucket.prefixes {
                if ip.starts_with(prefix.as_str()) {
                    return ClassificationResult::matched(&bucket.country, prefix);
                }
            }
        }

        ClassificationResult::unmatched()
    }
}
