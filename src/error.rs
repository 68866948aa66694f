//! Dispatch error types and the caller-facing error taxonomy.
//!
//! Everything that can go wrong between resolving an action and reading the
//! backend response is a [`DispatchError`]. The tool boundary turns it into a
//! [`ToolError`] through a single exhaustive classification.

use crate::config::TIMEOUT_ENV;
use crate::resource::{Component, RequestError, ResolveError};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Caller-facing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidParams,
    ResourceNotFound,
    ResourceAccessDenied,
    BackendError,
    ResourceUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParams => "INVALID_PARAMS",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceAccessDenied => "RESOURCE_ACCESS_DENIED",
            Self::BackendError => "BACKEND_ERROR",
            Self::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Code for a non-2xx HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidParams,
            401 | 403 => Self::ResourceAccessDenied,
            404 => Self::ResourceNotFound,
            _ => Self::BackendError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-2xx backend response with everything needed to classify it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFailure {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body, or the raw text when the body is not JSON
    pub body: Value,
    pub url: String,
}

/// Why a request never produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailureKind {
    Timeout,
    /// Connection refused or host could not be resolved
    ConnectionRefused,
    Other,
}

impl fmt::Display for NetworkFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timed out"),
            Self::ConnectionRefused => f.write_str("connection failed"),
            Self::Other => f.write_str("request failed"),
        }
    }
}

/// Errors from resolving, validating or executing a request
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("missing required path parameters: {}", .missing_fields.join(", "))]
    Validation { missing_fields: Vec<String> },
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("HTTP {} {} from {}", .0.status, .0.status_text, .0.url)]
    Http(HttpFailure),
    #[error("{kind} calling {component} at {url}: {cause}")]
    Network {
        kind: NetworkFailureKind,
        component: Component,
        url: String,
        cause: String,
    },
    #[error("unreadable response from {url}: {cause}")]
    InvalidResponse { url: String, cause: String },
}

/// Caller-facing failure returned by discover and execute
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// JSON envelope used on the wire: `{"error": {...}}`
    pub fn to_json(&self) -> Value {
        json!({ "error": self })
    }
}

/// Short, actionable message for an HTTP status
fn status_message(failure: &HttpFailure) -> String {
    match failure.status {
        400 => "Invalid request. Check the path parameters, query parameters and body against describe-action.".to_string(),
        401 => format!("Authentication failed. Check {}.", crate::config::API_TOKEN_ENV),
        403 => "Permission denied for this resource.".to_string(),
        404 => "Resource not found. Verify the IDs in the path parameters.".to_string(),
        409 => "Resource conflict. The resource may already exist or be in a state that forbids this action.".to_string(),
        s if s >= 500 => format!("Backend error ({} {}). The service may be temporarily unavailable.", s, failure.status_text),
        s => format!("Backend returned {} {}.", s, failure.status_text),
    }
}

/// Classify a dispatch failure into the caller-facing taxonomy
pub fn classify(error: &DispatchError) -> ToolError {
    match error {
        DispatchError::Resolve(resolve) => {
            let detail = match resolve {
                ResolveError::UnknownResource { suggestions, .. } => json!({
                    "suggestions": suggestions,
                }),
                ResolveError::UnknownAction {
                    available,
                    suggestions,
                    ..
                } => json!({
                    "availableActions": available,
                    "suggestions": suggestions,
                }),
            };
            ToolError::new(ErrorCode::ResourceNotFound, resolve.to_string()).with_detail(detail)
        }
        DispatchError::Validation { missing_fields } => ToolError::invalid_params(format!(
            "Missing required path parameters: {}. Use discover with intent 'describe-action' to see every parameter.",
            missing_fields.join(", ")
        ))
        .with_detail(json!({ "missingFields": missing_fields })),
        DispatchError::Request(RequestError::UnresolvedPathParams { params }) => {
            ToolError::invalid_params(format!(
                "Path parameters could not be substituted: {}",
                params.join(", ")
            ))
            .with_detail(json!({ "missingFields": params }))
        }
        DispatchError::Http(failure) => ToolError::new(
            ErrorCode::from_status(failure.status),
            status_message(failure),
        )
        .with_detail(json!(failure)),
        DispatchError::Network {
            kind,
            component,
            url,
            cause,
        } => {
            let (code, message) = match kind {
                NetworkFailureKind::Timeout => (
                    ErrorCode::ResourceUnavailable,
                    format!(
                        "The {component} service did not respond in time. Increase {TIMEOUT_ENV} or check that the service is healthy."
                    ),
                ),
                NetworkFailureKind::ConnectionRefused => (
                    ErrorCode::ResourceUnavailable,
                    format!(
                        "Cannot reach the {component} service at {url}. Check that it is running and that {} is set correctly.",
                        component.env_var()
                    ),
                ),
                NetworkFailureKind::Other => (
                    ErrorCode::InternalError,
                    format!("Request to the {component} service failed: {cause}"),
                ),
            };
            ToolError::new(code, message).with_detail(json!({
                "component": component,
                "url": url,
                "cause": cause,
            }))
        }
        DispatchError::InvalidResponse { url, cause } => ToolError::new(
            ErrorCode::InternalError,
            format!("The backend returned a response that could not be read: {cause}"),
        )
        .with_detail(json!({ "url": url })),
    }
}

impl From<DispatchError> for ToolError {
    fn from(error: DispatchError) -> Self {
        classify(&error)
    }
}
