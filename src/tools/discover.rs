//! Discovery façade: read-only introspection of the registry.
//!
//! Callers use `discover` to learn resource names, actions and parameters
//! before calling `execute`. Nothing here touches the network.

use crate::error::{classify, DispatchError, ErrorCode, ToolError};
use crate::resource::{
    resolve_action, Component, Registry, ResolveError, ResourceSchema, ResourceSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// What a discover call asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoverIntent {
    ListResources,
    DescribeResource,
    DescribeAction,
    Search,
    ListByComponent,
}

impl DiscoverIntent {
    pub const ALL: [DiscoverIntent; 5] = [
        DiscoverIntent::ListResources,
        DiscoverIntent::DescribeResource,
        DiscoverIntent::DescribeAction,
        DiscoverIntent::Search,
        DiscoverIntent::ListByComponent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListResources => "list-resources",
            Self::DescribeResource => "describe-resource",
            Self::DescribeAction => "describe-action",
            Self::Search => "search",
            Self::ListByComponent => "list-by-component",
        }
    }
}

impl FromStr for DiscoverIntent {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s.trim())
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|i| i.as_str()).collect();
                ToolError::invalid_params(format!(
                    "Unknown intent '{}'. Valid intents: {}",
                    s,
                    valid.join(", ")
                ))
                .with_detail(json!({ "validIntents": valid }))
            })
    }
}

/// Arguments of a discover call
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiscoverParams {
    pub intent: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
}

/// One action in a describe-resource overview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOverview {
    pub name: String,
    pub method: String,
    pub path: String,
    pub description: String,
    pub has_input: bool,
    pub has_path_params: bool,
    pub has_query_params: bool,
}

fn require<'a>(value: &'a Option<String>, name: &str, intent: DiscoverIntent) -> Result<&'a str, ToolError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ToolError::invalid_params(format!(
                "Intent '{}' requires the '{}' parameter",
                intent.as_str(),
                name
            ))
        })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::new(ErrorCode::InternalError, format!("Failed to serialize result: {e}")))
}

fn unknown_resource(registry: &Registry, resource: &str) -> ToolError {
    let suggestions = registry.suggest_resources(resource);
    let message = if suggestions.is_empty() {
        format!("Unknown resource '{resource}'.")
    } else {
        format!(
            "Unknown resource '{}'. Did you mean: {}?",
            resource,
            suggestions.join(", ")
        )
    };
    ToolError::new(ErrorCode::ResourceNotFound, message).with_detail(json!({
        "suggestions": suggestions,
        "availableResources": registry.resource_names(),
    }))
}

fn list_resources(registry: &Registry) -> Value {
    let mut components = Map::new();
    for component in Component::ALL {
        let resources: Vec<Value> = registry
            .schemas_by_component(component)
            .into_iter()
            .map(|s| {
                json!({
                    "resource": s.resource,
                    "description": s.description,
                    "actions": s.action_names(),
                })
            })
            .collect();
        components.insert(component.as_str().to_string(), Value::Array(resources));
    }

    json!({
        "totalResources": registry.all_schemas().len(),
        "totalEndpoints": registry.endpoint_count(),
        "components": components,
        "hint": "Use intent 'describe-resource' with a resource name to see its actions.",
    })
}

fn describe_resource(schema: &ResourceSchema) -> Value {
    let actions: Vec<ActionOverview> = schema
        .actions
        .iter()
        .map(|(name, action)| ActionOverview {
            name: name.clone(),
            method: action.method.to_string(),
            path: action.path.clone(),
            description: action.description.clone(),
            has_input: action.has_input(),
            has_path_params: action.has_path_params(),
            has_query_params: action.has_query_params(),
        })
        .collect();

    json!({
        "resource": schema.resource,
        "component": schema.component,
        "description": schema.description,
        "actions": actions,
        "hint": "Use intent 'describe-action' for the full parameters and input of one action.",
    })
}

/// Answer one discover call
pub fn discover(registry: &Registry, params: &DiscoverParams) -> Result<Value, ToolError> {
    let intent: DiscoverIntent = params.intent.parse()?;
    tracing::debug!("discover: intent={}", intent.as_str());

    match intent {
        DiscoverIntent::ListResources => Ok(list_resources(registry)),
        DiscoverIntent::DescribeResource => {
            let resource = require(&params.resource, "resource", intent)?;
            let schema = registry
                .get_schema(resource)
                .ok_or_else(|| unknown_resource(registry, resource))?;
            Ok(describe_resource(schema))
        }
        DiscoverIntent::DescribeAction => {
            let resource = require(&params.resource, "resource", intent)?;
            let action = require(&params.action, "action", intent)?;
            let resolved = resolve_action(registry, resource, action).map_err(|e| match e {
                ResolveError::UnknownResource { .. } => unknown_resource(registry, resource),
                other => classify(&DispatchError::Resolve(other)),
            })?;
            to_json(&resolved)
        }
        DiscoverIntent::Search => {
            let query = require(&params.query, "query", intent)?;
            let results: Vec<ResourceSummary> = registry
                .find_schemas(query)
                .into_iter()
                .map(ResourceSummary::from)
                .collect();
            Ok(json!({
                "query": query,
                "count": results.len(),
                "results": to_json(&results)?,
            }))
        }
        DiscoverIntent::ListByComponent => {
            let name = require(&params.component, "component", intent)?;
            let component = Component::parse(name).ok_or_else(|| {
                let valid: Vec<&str> = Component::ALL.iter().map(|c| c.as_str()).collect();
                ToolError::invalid_params(format!(
                    "Unknown component '{}'. Valid components: {}",
                    name,
                    valid.join(", ")
                ))
                .with_detail(json!({ "validComponents": valid }))
            })?;
            let resources: Vec<ResourceSummary> = registry
                .schemas_by_component(component)
                .into_iter()
                .map(ResourceSummary::from)
                .collect();
            Ok(json!({
                "component": component,
                "count": resources.len(),
                "resources": to_json(&resources)?,
            }))
        }
    }
}
