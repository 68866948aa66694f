//! Dispatch façade: the `execute` entry point.

use crate::backend::{BackendClient, BackendRequest};
use crate::error::{classify, DispatchError, ToolError};
use crate::resource::{resolve_action, Registry};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Arguments of an execute call
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteParams {
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub path_params: Map<String, Value>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Resolve, validate and execute one action.
///
/// Resolution and validation failures return before any network call.
/// Every missing required path parameter is reported at once.
pub async fn route_and_execute(
    registry: &Registry,
    client: &BackendClient,
    params: &ExecuteParams,
) -> Result<Value, DispatchError> {
    let action = resolve_action(registry, &params.resource, &params.action)?;

    let missing = action.missing_required_params(&params.path_params);
    if !missing.is_empty() {
        return Err(DispatchError::Validation {
            missing_fields: missing,
        });
    }

    tracing::info!(
        "execute: resource={}, action={}, component={}",
        params.resource,
        params.action,
        action.component
    );

    client
        .execute_request(BackendRequest {
            component: action.component,
            method: action.method,
            path_template: &action.path_template,
            path_params: &params.path_params,
            query_params: &params.query_params,
            body: params.body.as_ref(),
        })
        .await
}

/// Tool boundary: execute and classify any failure
pub async fn execute(
    registry: &Registry,
    client: &BackendClient,
    params: &ExecuteParams,
) -> Result<Value, ToolError> {
    route_and_execute(registry, client, params)
        .await
        .map_err(|e| {
            let classified = classify(&e);
            tracing::warn!(
                "execute {}.{} failed with {}: {}",
                params.resource,
                params.action,
                classified.code,
                e
            );
            classified
        })
}
