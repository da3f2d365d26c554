// HTML dashboard served at /

use axum::{http::HeaderMap, response::Html};
use chrono::Datelike;

const DASHBOARD_TEMPLATE: &str = include_str!("../web/index.html");

pub async fn index(headers: HeaderMap) -> Html<String> {
    Html(render(&base_url(&headers)))
}

fn render(base_url: &str) -> String {
    DASHBOARD_TEMPLATE
        .replace("{{BASE_URL}}", &escape_html(base_url))
        .replace("{{YEAR}}", &chrono::Utc::now().year().to_string())
}

/// Base URL as seen by the client, honoring X-Forwarded-Proto
fn base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}

/// Escape text for use inside HTML element content
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_base_url_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("handle.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(base_url(&headers), "https://handle.example.com");
        assert_eq!(base_url(&HeaderMap::new()), "http://localhost");
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let page = render("http://example.test");
        assert!(page.contains("GET http://example.test/dc"));
        assert!(!page.contains("{{BASE_URL}}"));
        assert!(!page.contains("{{YEAR}}"));
    }

    #[test]
    fn test_host_header_is_escaped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "host",
            HeaderValue::from_static("evil.test\"><script>alert('x')</script>"),
        );
        let page = render(&base_url(&headers));

        assert!(!page.contains("<script>alert"));
        assert!(page.contains("http://evil.test&quot;&gt;&lt;script&gt;alert(&#39;x&#39;)"));
    }
}
