// REST API endpoints

use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, Query, State},
    http::{HeaderMap, Method},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::client_ip::resolve_client_ip;
use super::{
    dashboard, CheckQuery, CheckResponse, HealthResponse, MemoryUsage, StatsResponse, TestResponse,
    TestResult,
};
use crate::detection::cache::DetectionCache;
use crate::detection::classifier::Classifier;
use crate::detection::fallback::SecondaryClassifier;
use crate::detection::DetectionRecord;
use crate::error::{panic_response, AppError, AppResult};

const SERVICE_NAME: &str = "Proton VPN Handle API";

/// Addresses classified by /test: three VPN ranges and two regular addresses
pub const SAMPLE_IPS: [&str; 5] = [
    "185.159.156.1",
    "45.142.178.1",
    "209.58.123.1",
    "110.235.123.1",
    "8.8.8.8",
];

#[derive(Clone)]
pub struct AppState {
    pub classifier: Classifier,
    pub fallback: Arc<dyn SecondaryClassifier>,
    pub cache: DetectionCache,
    pub server_name: String,
    pub hostname: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        classifier: Classifier,
        fallback: Arc<dyn SecondaryClassifier>,
        server_name: String,
        hostname: String,
    ) -> Self {
        AppState {
            classifier,
            fallback,
            cache: DetectionCache::new(),
            server_name,
            hostname,
            started_at: Instant::now(),
        }
    }

    /// Classify a client address, assigning a fallback country when no
    /// VPN range matches, and record the outcome
    pub async fn detect(&self, client_ip: &str) -> (DetectionRecord, usize) {
        let detection = self.classifier.classify(client_ip);

        let country_code = if detection.is_match {
            detection.country.clone()
        } else {
            self.fallback.country_for(client_ip)
        };

        let record = DetectionRecord::from_classification(&detection, &country_code);
        let total = self.cache.record(client_ip, record.clone()).await;

        tracing::debug!(
            "Detection for {}: vpn_type={} isocode={} matched_range={}",
            client_ip,
            record.vpn_type,
            record.isocode,
            record.matched_range
        );

        (record, total)
    }
}

pub fn create_api_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/", get(dashboard::index))
        .route("/dc", get(detect_client))
        .route("/check", get(check_ip))
        .route("/stats", get(get_stats))
        .route("/test", get(run_samples))
        .route("/health", get(health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn detect_client(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let client_ip = resolve_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let (record, total) = state.detect(&client_ip).await;

    let mut response = Map::new();
    response.insert("clientIp".to_string(), Value::String(client_ip.clone()));
    response.insert(client_ip, serde_json::to_value(&record)?);
    response.insert("message".to_string(), Value::from("success"));
    response.insert("server".to_string(), Value::from(state.server_name.clone()));
    response.insert("time".to_string(), Value::from(chrono::Utc::now().to_rfc3339()));
    response.insert("total_detections".to_string(), Value::from(total));

    Ok(Json(Value::Object(response)))
}

async fn check_ip(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> AppResult<Json<CheckResponse>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let ip = match query.ip.filter(|ip| !ip.is_empty()) {
        Some(ip) => ip,
        None => resolve_client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    };

    let detection = state.classifier.classify(&ip);
    let action = if detection.is_match {
        "✅ Show special content"
    } else {
        "❌ Show normal content"
    };

    Ok(Json(CheckResponse {
        ip,
        is_free_proton_vpn: detection.is_match,
        details: detection,
        action: action.to_string(),
    }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let counts = state.cache.count().await;

    Json(StatsResponse {
        status: "active".to_string(),
        total_requests: counts.total,
        proton_detections: counts.matched,
        normal_detections: counts.total - counts.matched,
        uptime: state.started_at.elapsed().as_secs_f64(),
        memory: process_memory(),
        server_time: chrono::Utc::now().to_rfc3339(),
    })
}

async fn run_samples(State(state): State<Arc<AppState>>) -> Json<TestResponse> {
    let test_results = SAMPLE_IPS
        .iter()
        .map(|ip| TestResult {
            ip: ip.to_string(),
            detection: state.classifier.classify(ip),
        })
        .collect();

    Json(TestResponse {
        test_results,
        note: "Use /dc endpoint for real detection".to_string(),
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME.to_string(),
        host: state.hostname.clone(),
    })
}

/// Memory usage of this process; zeros when the platform gives no answer
fn process_memory() -> MemoryUsage {
    let usage = sysinfo::get_current_pid().ok().and_then(|pid| {
        let mut system = sysinfo::System::new();
        system.refresh_process(pid);
        system.process(pid).map(|process| MemoryUsage {
            rss: process.memory(),
            virtual_bytes: process.virtual_memory(),
        })
    });

    usage.unwrap_or(MemoryUsage {
        rss: 0,
        virtual_bytes: 0,
    })
}
