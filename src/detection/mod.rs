// Detection module - prefix table, classification results and detection records

pub mod cache;
pub mod classifier;
pub mod fallback;

use serde::{Deserialize, Serialize};

/// Country code reported for addresses that match no bucket
pub const UNKNOWN_COUNTRY: &str = "XX";

/// VPN type reported for matched addresses
pub const VPN_TYPE_FREE: &str = "free-proton";

/// VPN type reported for everything else
pub const VPN_TYPE_NONE: &str = "none";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Free,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// A named group of address prefixes believed to belong to free VPN servers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrefixBucket {
    pub country: String,
    pub prefixes: Vec<String>,
}

impl PrefixBucket {
    pub fn new(country: &str, prefixes: &[&str]) -> Self {
        PrefixBucket {
            country: country.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered, immutable table of prefix buckets. Iteration order is match order.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixTable {
    buckets: Vec<PrefixBucket>,
}

impl PrefixTable {
    pub fn new(buckets: Vec<PrefixBucket>) -> Self {
        PrefixTable { buckets }
    }

    pub fn buckets(&self) -> &[PrefixBucket] {
        &self.buckets
    }

    pub fn prefix_count(&self) -> usize {
        self.buckets.iter().map(|b| b.prefixes.len()).sum()
    }
}

impl Default for PrefixTable {
    fn default() -> Self {
        PrefixTable::new(vec![
            PrefixBucket::new(
                "NL",
                &[
                    "185.159.", "185.207.", "146.70.", "195.178.", "194.110.", "193.105.",
                    "188.214.", "176.119.", "178.21.", "185.216.", "194.145.", "194.26.",
                ],
            ),
            PrefixBucket::new(
                "JP",
                &[
                    "45.142.", "45.86.", "46.166.", "46.182.", "46.226.", "5.252.", "5.253.",
                    "5.254.", "5.255.", "64.120.", "65.108.", "77.83.",
                ],
            ),
            PrefixBucket::new(
                "US",
                &[
                    "209.58.", "212.102.", "23.105.", "31.171.", "80.94.", "82.102.", "83.97.",
                    "89.147.", "91.108.", "94.131.", "45.14.", "45.15.",
                ],
            ),
            PrefixBucket::new(
                "OTHER",
                &[
                    "78.142.", "85.239.", "91.92.", "95.214.", "185.153.", "185.195.", "45.134.",
                    "45.135.",
                ],
            ),
        ])
    }
}

/// Outcome of a prefix lookup. Field names on the wire follow the deployed API.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(rename = "isProton")]
    pub is_match: bool,
    pub country: String,
    pub server_type: ServerType,
    #[serde(rename = "matchedRange", skip_serializing_if = "Option::is_none")]
    pub matched_prefix: Option<String>,
    pub confidence: Confidence,
}

impl ClassificationResult {
    pub fn matched(country: &str, prefix: &str) -> Self {
        ClassificationResult {
            is_match: true,
            country: country.to_string(),
            server_type: ServerType::Free,
            matched_prefix: Some(prefix.to_string()),
            confidence: Confidence::High,
        }
    }

    pub fn unmatched() -> Self {
        ClassificationResult {
            is_match: false,
            country: UNKNOWN_COUNTRY.to_string(),
            server_type: ServerType::None,
            matched_prefix: None,
            confidence: Confidence::Low,
        }
    }
}

/// Most recent detection for one client IP, as reported by `/dc`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectionRecord {
    pub proxy: String,
    pub isocode: String,
    pub country: String,
    pub vpn_type: String,
    pub server_type: ServerType,
    pub confidence: Confidence,
    pub matched_range: String,
    pub timestamp: String,
    pub render_hosted: bool,
}

impl DetectionRecord {
    /// Build the record for a classification and the country finally reported
    pub fn from_classification(result: &ClassificationResult, country_code: &str) -> Self {
        let (proxy, vpn_type) = if result.is_match {
            ("yes", VPN_TYPE_FREE)
        } else {
            ("no", VPN_TYPE_NONE)
        };

        DetectionRecord {
            proxy: proxy.to_string(),
            isocode: country_code.to_string(),
            country: country_name(country_code).to_string(),
            vpn_type: vpn_type.to_string(),
            server_type: result.server_type,
            confidence: result.confidence,
            matched_range: result
                .matched_prefix
                .clone()
                .unwrap_or_else(|| "none".to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            render_hosted: true,
        }
    }

    pub fn is_vpn(&self) -> bool {
        self.vpn_type == VPN_TYPE_FREE
    }
}

/// Display name for a country code; unknown codes are shown as-is
pub fn country_name(code: &str) -> &str {
    match code {
        "PK" => "Pakistan",
        "US" => "USA",
        "NL" => "Netherlands",
        "JP" => "Japan",
        "DE" => "Germany",
        "CA" => "Canada",
        "UK" => "UK",
        "IN" => "India",
        UNKNOWN_COUNTRY => "Unknown",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = PrefixTable::default();
        let countries: Vec<&str> = table.buckets().iter().map(|b| b.country.as_str()).collect();
        assert_eq!(countries, vec!["NL", "JP", "US", "OTHER"]);
        assert_eq!(table.prefix_count(), 44);
    }

    #[test]
    fn test_country_name() {
        assert_eq!(country_name("NL"), "Netherlands");
        assert_eq!(country_name("XX"), "Unknown");
        assert_eq!(country_name("AE"), "AE");
        assert_eq!(country_name("OTHER"), "OTHER");
    }

    #[test]
    fn test_classification_wire_names() {
        let json = serde_json::to_value(ClassificationResult::matched("NL", "185.159.")).unwrap();
        assert_eq!(json["isProton"], true);
        assert_eq!(json["serverType"], "free");
        assert_eq!(json["matchedRange"], "185.159.");
        assert_eq!(json["confidence"], "high");

        let json = serde_json::to_value(ClassificationResult::unmatched()).unwrap();
        assert_eq!(json["country"], "XX");
        assert_eq!(json["serverType"], "none");
        assert!(json.get("matchedRange").is_none());
    }

    #[test]
    fn test_detection_record_unmatched() {
        let record = DetectionRecord::from_classification(&ClassificationResult::unmatched(), "DE");
        assert_eq!(record.proxy, "no");
        assert_eq!(record.isocode, "DE");
        assert_eq!(record.country, "Germany");
        assert_eq!(record.vpn_type, "none");
        assert_eq!(record.matched_range, "none");
        assert!(!record.is_vpn());
    }
}
