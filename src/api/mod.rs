// API module - REST endpoints, client IP resolution and the dashboard page

pub mod client_ip;
pub mod dashboard;
pub mod rest;

use serde::{Deserialize, Serialize};

use crate::detection::ClassificationResult;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub ip: String,
    #[serde(rename = "isFreeProtonVPN")]
    pub is_free_proton_vpn: bool,
    pub details: ClassificationResult,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct MemoryUsage {
    /// Resident set size in bytes
    pub rss: u64,
    /// Virtual memory size in bytes
    #[serde(rename = "virtual")]
    pub virtual_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: String,
    pub total_requests: usize,
    pub proton_detections: usize,
    pub normal_detections: usize,
    pub uptime: f64,
    pub memory: MemoryUsage,
    pub server_time: String,
}

#[derive(Debug, Serialize)]
pub struct TestResult {
    pub ip: String,
    pub detection: ClassificationResult,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub test_results: Vec<TestResult>,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub host: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
