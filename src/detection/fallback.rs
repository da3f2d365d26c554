// Secondary classifiers: pick the reported country for unmatched addresses

use clap::ValueEnum;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::UNKNOWN_COUNTRY;

/// Countries the deployed service picks from for unmatched addresses
pub const DEFAULT_FALLBACK_COUNTRIES: [&str; 6] = ["US", "UK", "CA", "DE", "AE", "SA"];

/// Chooses the country code reported for an address the classifier did not match
pub trait SecondaryClassifier: Send + Sync {
    fn country_for(&self, ip: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Uniform random pick from the fallback country list
    Random,
    /// Always report the unknown country code
    Unknown,
}

/// Uniform, unseeded pick from a fixed list. Repeated calls for the same
/// address may return different countries.
#[derive(Debug, Clone)]
pub struct RandomCountry {
    countries: Vec<String>,
}

impl RandomCountry {
    pub fn new(countries: Vec<String>) -> Self {
        RandomCountry { countries }
    }
}

impl Default for RandomCountry {
    fn default() -> Self {
        RandomCountry::new(DEFAULT_FALLBACK_COUNTRIES.iter().map(|c| c.to_string()).collect())
    }
}

impl SecondaryClassifier for RandomCountry {
    fn country_for(&self, _ip: &str) -> String {
        self.countries
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

/// Always reports the same country
#[derive(Debug, Clone)]
pub struct FixedCountry(pub String);

impl FixedCountry {
    pub fn unknown() -> Self {
        FixedCountry(UNKNOWN_COUNTRY.to_string())
    }
}

impl SecondaryClassifier for FixedCountry {
    fn country_for(&self, _ip: &str) -> String {
        self.0.clone()
    }
}

/// Build the secondary classifier selected by configuration
pub fn build(mode: FallbackMode, countries: &[String]) -> Arc<dyn SecondaryClassifier> {
    match mode {
        FallbackMode::Random => Arc::new(RandomCountry::new(countries.to_vec())),
        FallbackMode::Unknown => Arc::new(FixedCountry::unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_picks_from_list() {
        let picker = RandomCountry::default();
        for _ in 0..200 {
            let country = picker.country_for("8.8.8.8");
            assert!(DEFAULT_FALLBACK_COUNTRIES.contains(&country.as_str()));
        }
    }

    #[test]
    fn test_random_single_entry_is_stable() {
        let picker = RandomCountry::new(vec!["PK".to_string()]);
        assert_eq!(picker.country_for("1.1.1.1"), "PK");
        assert_eq!(picker.country_for("1.1.1.1"), "PK");
    }

    #[test]
    fn test_random_empty_list_is_unknown() {
        let picker = RandomCountry::new(vec![]);
        assert_eq!(picker.country_for("1.1.1.1"), "XX");
    }

    #[test]
    fn test_build_unknown_mode() {
        let picker = build(FallbackMode::Unknown, &["US".to_string()]);
        assert_eq!(picker.country_for("8.8.8.8"), "XX");
    }
}
