// Client IP resolution from proxy headers and the peer address

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Used when neither headers nor the connection give an address
pub const FALLBACK_CLIENT_IP: &str = "8.8.8.8";

/// Resolve the client address with header priority:
/// 1. X-Forwarded-For
/// 2. X-Real-IP
/// 3. connection peer address
/// 4. 8.8.8.8
///
/// The first non-empty source wins; its first comma-separated entry is
/// returned trimmed. The value is not validated as an IP address.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let raw = header_value(headers, "x-forwarded-for")
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| FALLBACK_CLIENT_IP.to_string());

    let first = raw.split(',').next().unwrap_or_default().trim();
    tracing::debug!("Resolved client IP: {}", first);
    first.to_string()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.10:53211".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 185.159.156.1 , 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("45.142.178.1"));
        assert_eq!(resolve_client_ip(&headers, peer()), "185.159.156.1");
    }

    #[test]
    fn test_real_ip_when_no_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("45.142.178.1"));
        assert_eq!(resolve_client_ip(&headers, peer()), "45.142.178.1");
    }

    #[test]
    fn test_empty_header_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        headers.insert("x-real-ip", HeaderValue::from_static("45.142.178.1"));
        assert_eq!(resolve_client_ip(&headers, peer()), "45.142.178.1");
    }

    #[test]
    fn test_peer_address() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), peer()), "192.0.2.10");
    }

    #[test]
    fn test_default_address() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), "8.8.8.8");
    }

    #[test]
    fn test_value_not_validated() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown, 1.2.3.4"));
        assert_eq!(resolve_client_ip(&headers, None), "unknown");
    }
}
