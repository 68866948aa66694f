//! Action Resolver
//!
//! Looks up a (resource, action) pair and produces the canonical descriptor
//! used by both discovery and execution.

use super::registry::{
    suggest, Component, FieldSpec, HttpMethod, ParamSpec, QueryParamSpec, Registry,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fully merged descriptor for one resource action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    pub resource: String,
    pub action: String,
    pub component: Component,
    pub method: HttpMethod,
    pub path_template: String,
    pub path_params: BTreeMap<String, ParamSpec>,
    pub query_params: BTreeMap<String, QueryParamSpec>,
    pub input: Option<FieldSpec>,
    pub description: String,
    pub example: Option<Value>,
}

impl ResolvedAction {
    /// Required path parameters with no usable value in `supplied`.
    ///
    /// A value counts as missing when it is absent, null or an empty string.
    pub fn missing_required_params(&self, supplied: &Map<String, Value>) -> Vec<String> {
        self.path_params
            .iter()
            .filter(|(_, spec)| spec.required)
            .filter(|(name, _)| match supplied.get(name.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" Did you mean: {}?", suggestions.join(", "))
    }
}

/// Lookup failures, carrying enough context for the caller to self-correct
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error(
        "Unknown resource '{resource}'.{} Use discover with intent 'list-resources' to see all available resources.",
        did_you_mean(.suggestions)
    )]
    UnknownResource {
        resource: String,
        suggestions: Vec<String>,
    },
    #[error(
        "Unknown action '{action}' for resource '{resource}'.{} Available actions: {}.",
        did_you_mean(.suggestions),
        .available.join(", ")
    )]
    UnknownAction {
        resource: String,
        action: String,
        available: Vec<String>,
        suggestions: Vec<String>,
    },
}

/// Resolve a (resource, action) pair. Matching is exact and case-sensitive;
/// near matches are only offered as suggestions.
pub fn resolve_action(
    registry: &Registry,
    resource: &str,
    action: &str,
) -> Result<ResolvedAction, ResolveError> {
    let Some(schema) = registry.get_schema(resource) else {
        return Err(ResolveError::UnknownResource {
            resource: resource.to_string(),
            suggestions: registry.suggest_resources(resource),
        });
    };

    let Some(descriptor) = schema.actions.get(action) else {
        return Err(ResolveError::UnknownAction {
            resource: resource.to_string(),
            action: action.to_string(),
            available: schema.action_names(),
            suggestions: suggest(action, schema.actions.keys().map(|s| s.as_str())),
        });
    };

    let mut query_params = BTreeMap::new();
    for set in &descriptor.query_param_sets {
        if let Some(params) = registry.query_param_set(set) {
            query_params.extend(params.clone());
        }
    }
    // Action-specific parameters take precedence over shared sets
    query_params.extend(descriptor.query_params.clone());

    Ok(ResolvedAction {
        resource: resource.to_string(),
        action: action.to_string(),
        component: schema.component,
        method: descriptor.method,
        path_template: descriptor.path.clone(),
        path_params: descriptor.path_params.clone(),
        query_params,
        input: descriptor.input.clone(),
        description: descriptor.description.clone(),
        example: descriptor.example.clone(),
    })
}
