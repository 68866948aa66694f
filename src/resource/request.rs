//! Request Builder
//!
//! Pure helpers that turn a path template and caller-supplied parameters
//! into a concrete URL.

use super::registry::Component;
use crate::config::Config;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failures while building a request URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unresolved path parameters: {}", .params.join(", "))]
    UnresolvedPathParams { params: Vec<String> },
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Extract the `:name` placeholders of a path template, in order
pub fn path_tokens(template: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(':') {
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !is_token_char(c))
            .unwrap_or(after.len());
        if len > 0 {
            tokens.push(&after[..len]);
        }
        rest = &after[len..];
    }

    tokens
}

/// Render a parameter value the way it should appear in a URL
fn value_to_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Substitute path parameters into a template and prefix the base URL.
///
/// Each `:token` is replaced by the percent-encoded value of the matching key.
/// Tokens are matched whole, so `:id` never touches `:idx`. A token left
/// without a value is an error rather than a literal in the URL.
pub fn build_url(
    base_url: &str,
    path_template: &str,
    path_params: &Map<String, Value>,
) -> Result<String, RequestError> {
    let mut url = String::with_capacity(base_url.len() + path_template.len());
    url.push_str(base_url.trim_end_matches('/'));

    let mut unresolved = Vec::new();
    let mut rest = path_template;

    while let Some(pos) = rest.find(':') {
        url.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !is_token_char(c))
            .unwrap_or(after.len());
        let token = &after[..len];

        if token.is_empty() {
            url.push(':');
        } else {
            match path_params.get(token).and_then(value_to_param) {
                Some(value) => url.push_str(&urlencoding::encode(&value)),
                None => {
                    unresolved.push(token.to_string());
                    url.push(':');
                    url.push_str(token);
                }
            }
        }
        rest = &after[len..];
    }
    url.push_str(rest);

    if unresolved.is_empty() {
        Ok(url)
    } else {
        Err(RequestError::UnresolvedPathParams { params: unresolved })
    }
}

/// Serialize query parameters into `?k=v&...`, or `""` when none remain.
///
/// Null entries are dropped; objects and arrays are sent as JSON text.
pub fn build_query_string(query_params: &Map<String, Value>) -> String {
    let parts: Vec<String> = query_params
        .iter()
        .filter_map(|(key, value)| {
            value_to_param(value).map(|v| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(&v))
            })
        })
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Base URL for a component name, defaulting to onboarding when unrecognized
pub fn get_component_url<'a>(config: &'a Config, component: &str) -> &'a str {
    config.component_url(Component::from_name_or_default(component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            path_tokens("/v1/organizations/:organization_id/ledgers/:id"),
            vec!["organization_id", "id"]
        );
        assert!(path_tokens("/v1/organizations").is_empty());
    }

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "https://api.x",
            "/v1/organizations/:id",
            &params(json!({"id": "ab cd"})),
        )
        .unwrap();
        assert_eq!(url, "https://api.x/v1/organizations/ab%20cd");
    }

    #[test]
    fn test_build_url_multiple_tokens() {
        let url = build_url(
            "http://localhost:3000/",
            "/v1/organizations/:organization_id/ledgers/:id",
            &params(json!({"organization_id": "org-1", "id": "led-2"})),
        )
        .unwrap();
        assert_eq!(url, "http://localhost:3000/v1/organizations/org-1/ledgers/led-2");
    }

    #[test]
    fn test_build_url_respects_token_boundaries() {
        let url = build_url(
            "http://h",
            "/a/:id/b/:idx",
            &params(json!({"id": "1", "idx": "2"})),
        )
        .unwrap();
        assert_eq!(url, "http://h/a/1/b/2");
    }

    #[test]
    fn test_build_url_numeric_value() {
        let url = build_url("http://h", "/items/:id", &params(json!({"id": 42}))).unwrap();
        assert_eq!(url, "http://h/items/42");
    }

    #[test]
    fn test_build_url_unresolved_token_fails() {
        let err = build_url(
            "http://h",
            "/v1/organizations/:organization_id/ledgers/:id",
            &params(json!({"organization_id": "o"})),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RequestError::UnresolvedPathParams {
                params: vec!["id".to_string()]
            }
        );
    }

    #[test]
    fn test_build_url_null_value_is_unresolved() {
        let result = build_url("http://h", "/items/:id", &params(json!({"id": null})));
        assert!(result.is_err());
    }

    #[test]
    fn test_build_url_ignores_extra_params() {
        let url = build_url("http://h", "/items", &params(json!({"id": "x"}))).unwrap();
        assert_eq!(url, "http://h/items");
    }

    #[test]
    fn test_query_string_scalar() {
        assert_eq!(build_query_string(&params(json!({"limit": 10}))), "?limit=10");
    }

    #[test]
    fn test_query_string_empty() {
        assert_eq!(build_query_string(&Map::new()), "");
    }

    #[test]
    fn test_query_string_drops_nulls() {
        assert_eq!(build_query_string(&params(json!({"cursor": null}))), "");
        assert_eq!(
            build_query_string(&params(json!({"cursor": null, "page": 2}))),
            "?page=2"
        );
    }

    #[test]
    fn test_query_string_object_is_json_encoded() {
        let query = build_query_string(&params(json!({"filter": {"a": 1}})));
        assert_eq!(query, format!("?filter={}", urlencoding::encode(r#"{"a":1}"#)));
        assert_eq!(query, "?filter=%7B%22a%22%3A1%7D");
    }

    #[test]
    fn test_query_string_preserves_order() {
        let query = build_query_string(&params(json!({"sort_order": "desc", "limit": 5})));
        assert_eq!(query, "?sort_order=desc&limit=5");
    }

    #[test]
    fn test_component_url_defaults_to_onboarding() {
        let config = Config::default();
        assert_eq!(get_component_url(&config, "crm"), config.crm_url);
        assert_eq!(get_component_url(&config, "unknown"), config.onboarding_url);
    }
}
