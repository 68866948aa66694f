//! HTTP utilities for Midaz REST API calls

use crate::error::{DispatchError, HttpFailure, NetworkFailureKind};
use crate::resource::{Component, HttpMethod};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde_json::{json, Map, Value};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Response header carrying the result of count (HEAD) actions
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Map a transport-level reqwest error into a network failure
pub fn network_failure(error: reqwest::Error, component: Component, url: &str) -> DispatchError {
    let kind = if error.is_timeout() {
        NetworkFailureKind::Timeout
    } else if error.is_connect() {
        NetworkFailureKind::ConnectionRefused
    } else {
        NetworkFailureKind::Other
    };

    DispatchError::Network {
        kind,
        component,
        url: url.to_string(),
        cause: error.to_string(),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("application/json") || ct.contains("+json")
        })
        .unwrap_or(false)
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}

/// Total count from a HEAD response; header names are case-insensitive
fn total_count(headers: &HeaderMap) -> Value {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// Interpret a backend response according to the request method and status.
///
/// - non-2xx: [`DispatchError::Http`] with the parsed or raw body
/// - `HEAD`: `{status, headers, count}`
/// - `DELETE` + 204: `{status: 204, message: "Successfully deleted"}`
/// - otherwise: parsed JSON when the content type says so, else raw text
pub async fn interpret_response(
    method: HttpMethod,
    response: Response,
    component: Component,
    url: &str,
) -> Result<Value, DispatchError> {
    let status = response.status();

    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let text = response.text().await.unwrap_or_default();

        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} {} - {}", status, url, sanitize_for_log(&text));

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(DispatchError::Http(HttpFailure {
            status: status.as_u16(),
            status_text,
            body,
            url: url.to_string(),
        }));
    }

    if method == HttpMethod::Head {
        let headers = response.headers();
        return Ok(json!({
            "status": status.as_u16(),
            "headers": headers_to_json(headers),
            "count": total_count(headers),
        }));
    }

    if method == HttpMethod::Delete && status == StatusCode::NO_CONTENT {
        return Ok(json!({
            "status": 204,
            "message": "Successfully deleted",
        }));
    }

    let json_body = is_json(response.headers());
    let text = response
        .text()
        .await
        .map_err(|e| network_failure(e, component, url))?;

    if !json_body {
        return Ok(Value::String(text));
    }

    // Handle empty response
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| DispatchError::InvalidResponse {
        url: url.to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_handles_multibyte_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_total_count_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Total-Count", HeaderValue::from_static("42"));
        assert_eq!(total_count(&headers), json!(42));
    }

    #[test]
    fn test_total_count_missing_is_null() {
        assert_eq!(total_count(&HeaderMap::new()), Value::Null);
    }

    #[test]
    fn test_json_content_type_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
