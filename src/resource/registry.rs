//! Resource Registry - Load resource schemas from JSON
//!
//! This module loads every Midaz resource schema from the embedded JSON
//! files into an explicit [`Registry`] value. The registry is built once at
//! startup and only read afterwards.

use super::request::path_tokens;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[(&str, &str)] = &[
    ("common.json", include_str!("../resources/common.json")),
    ("onboarding.json", include_str!("../resources/onboarding.json")),
    ("transaction.json", include_str!("../resources/transaction.json")),
    ("crm.json", include_str!("../resources/crm.json")),
    ("ledger.json", include_str!("../resources/ledger.json")),
];

/// Maximum number of near-match suggestions for an unknown name
pub const MAX_SUGGESTIONS: usize = 5;

/// Minimum Jaro-Winkler similarity for a name to count as a near match
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Backend service boundary a resource is served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Onboarding,
    Transaction,
    Crm,
    Ledger,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Onboarding,
        Component::Transaction,
        Component::Crm,
        Component::Ledger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Transaction => "transaction",
            Self::Crm => "crm",
            Self::Ledger => "ledger",
        }
    }

    /// Parse a component name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "onboarding" => Some(Self::Onboarding),
            "transaction" => Some(Self::Transaction),
            "crm" => Some(Self::Crm),
            "ledger" => Some(Self::Ledger),
            _ => None,
        }
    }

    /// Parse a component name, falling back to onboarding for unknown names
    pub fn from_name_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::Onboarding)
    }

    /// Environment variable that configures this component's base URL
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Onboarding => "MIDAZ_ONBOARDING_URL",
            Self::Transaction => "MIDAZ_TRANSACTION_URL",
            Self::Crm => "MIDAZ_CRM_URL",
            Self::Ledger => "MIDAZ_LEDGER_URL",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verbs an action may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    /// Whether a request body is sent for this verb
    pub fn sends_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Head | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path parameter definition from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    pub description: String,
}

/// Query parameter definition from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParamSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
}

/// Request body contract (documentation only, never enforced)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,
}

/// Action definition from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub query_params: BTreeMap<String, QueryParamSpec>,
    /// Names of shared query parameter sets from common.json
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_param_sets: Vec<String>,
    #[serde(default)]
    pub input: Option<FieldSpec>,
    pub description: String,
    #[serde(default)]
    pub example: Option<Value>,
}

impl ActionDescriptor {
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn has_path_params(&self) -> bool {
        !self.path_params.is_empty()
    }

    pub fn has_query_params(&self) -> bool {
        !self.query_params.is_empty() || !self.query_param_sets.is_empty()
    }
}

/// Resource definition from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Filled from the map key when the registry is built
    #[serde(default)]
    pub resource: String,
    pub component: Component,
    pub description: String,
    #[serde(deserialize_with = "unique_keys")]
    pub actions: BTreeMap<String, ActionDescriptor>,
}

impl ResourceSchema {
    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    fn matches(&self, needle: &str) -> bool {
        self.resource.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.component.as_str().contains(needle)
            || self
                .actions
                .keys()
                .any(|a| a.to_lowercase().contains(needle))
    }
}

/// Compact projection of a resource used by listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub resource: String,
    pub component: Component,
    pub description: String,
    pub actions: Vec<String>,
}

impl From<&ResourceSchema> for ResourceSummary {
    fn from(schema: &ResourceSchema) -> Self {
        Self {
            resource: schema.resource.clone(),
            component: schema.component,
            description: schema.description.clone(),
            actions: schema.action_names(),
        }
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Default, Deserialize)]
struct ResourceFile {
    #[serde(default, deserialize_with = "unique_keys")]
    query_param_sets: BTreeMap<String, BTreeMap<String, QueryParamSpec>>,
    #[serde(default, deserialize_with = "unique_keys")]
    resources: BTreeMap<String, ResourceSchema>,
}

struct UniqueKeys<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
    type Value = BTreeMap<String, V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map with unique keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            if map.contains_key(&key) {
                return Err(serde::de::Error::custom(format!("duplicate key '{key}'")));
            }
            map.insert(key, value);
        }
        Ok(map)
    }
}

/// Map deserializer that rejects repeated keys instead of keeping the last one
fn unique_keys<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

/// Defects in the embedded schema definitions
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("resource '{resource}' is defined more than once")]
    DuplicateResource { resource: String },
    #[error("query parameter set '{set}' is defined more than once")]
    DuplicateQueryParamSet { set: String },
    #[error(
        "{resource}.{action}: path '{path}' does not match its path parameters \
         (undeclared tokens: {undeclared:?}, unused parameters: {unused:?})"
    )]
    PathParamMismatch {
        resource: String,
        action: String,
        path: String,
        undeclared: Vec<String>,
        unused: Vec<String>,
    },
    #[error("{resource}.{action}: unknown query parameter set '{set}'")]
    UnknownQueryParamSet {
        resource: String,
        action: String,
        set: String,
    },
}

/// Immutable catalog of every resource schema
#[derive(Debug, Clone)]
pub struct Registry {
    schemas: BTreeMap<String, ResourceSchema>,
    query_param_sets: BTreeMap<String, BTreeMap<String, QueryParamSpec>>,
}

impl Registry {
    /// Build the registry from the embedded JSON definitions
    pub fn load() -> Result<Self, RegistryError> {
        Self::from_sources(RESOURCE_FILES)
    }

    /// Build a registry from `(file name, JSON text)` pairs
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, RegistryError> {
        let mut registry = Self {
            schemas: BTreeMap::new(),
            query_param_sets: BTreeMap::new(),
        };

        for (file, content) in sources {
            let partial: ResourceFile =
                serde_json::from_str(content).map_err(|source| RegistryError::Parse {
                    file: file.to_string(),
                    source,
                })?;

            for (name, set) in partial.query_param_sets {
                if registry.query_param_sets.contains_key(&name) {
                    return Err(RegistryError::DuplicateQueryParamSet { set: name });
                }
                registry.query_param_sets.insert(name, set);
            }

            for (name, mut schema) in partial.resources {
                if registry.schemas.contains_key(&name) {
                    return Err(RegistryError::DuplicateResource { resource: name });
                }
                schema.resource = name.clone();
                registry.schemas.insert(name, schema);
            }
        }

        registry.validate()?;

        tracing::debug!(
            "registry loaded: {} resources, {} endpoints",
            registry.schemas.len(),
            registry.endpoint_count()
        );

        Ok(registry)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        for schema in self.schemas.values() {
            for (action_name, action) in &schema.actions {
                let tokens = path_tokens(&action.path);

                let undeclared: Vec<String> = tokens
                    .iter()
                    .filter(|t| !action.path_params.contains_key(**t))
                    .map(|t| t.to_string())
                    .collect();
                let unused: Vec<String> = action
                    .path_params
                    .keys()
                    .filter(|k| !tokens.contains(&k.as_str()))
                    .cloned()
                    .collect();

                if !undeclared.is_empty() || !unused.is_empty() {
                    return Err(RegistryError::PathParamMismatch {
                        resource: schema.resource.clone(),
                        action: action_name.clone(),
                        path: action.path.clone(),
                        undeclared,
                        unused,
                    });
                }

                if let Some(set) = action
                    .query_param_sets
                    .iter()
                    .find(|s| !self.query_param_sets.contains_key(*s))
                {
                    return Err(RegistryError::UnknownQueryParamSet {
                        resource: schema.resource.clone(),
                        action: action_name.clone(),
                        set: set.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get a resource schema by name
    pub fn get_schema(&self, resource: &str) -> Option<&ResourceSchema> {
        self.schemas.get(resource)
    }

    /// Get every resource schema, ordered by name
    pub fn all_schemas(&self) -> Vec<&ResourceSchema> {
        self.schemas.values().collect()
    }

    /// Get the schemas served by one component
    pub fn schemas_by_component(&self, component: Component) -> Vec<&ResourceSchema> {
        self.schemas
            .values()
            .filter(|s| s.component == component)
            .collect()
    }

    /// Case-insensitive substring search over names, descriptions,
    /// components and action names. An empty query matches everything.
    pub fn find_schemas(&self, query: &str) -> Vec<&ResourceSchema> {
        let needle = query.trim().to_lowercase();
        self.schemas
            .values()
            .filter(|s| s.matches(&needle))
            .collect()
    }

    /// Summaries of every resource, ordered by name
    pub fn list_resources(&self) -> Vec<ResourceSummary> {
        self.schemas.values().map(ResourceSummary::from).collect()
    }

    /// Get all resource names (for suggestions)
    pub fn resource_names(&self) -> Vec<&str> {
        self.schemas.keys().map(|s| s.as_str()).collect()
    }

    /// Total number of (resource, action) pairs
    pub fn endpoint_count(&self) -> usize {
        self.schemas.values().map(|s| s.actions.len()).sum()
    }

    /// Get a shared query parameter set by name
    pub fn query_param_set(&self, name: &str) -> Option<&BTreeMap<String, QueryParamSpec>> {
        self.query_param_sets.get(name)
    }

    /// Near matches for an unknown resource name
    pub fn suggest_resources(&self, name: &str) -> Vec<String> {
        suggest(name, self.schemas.keys().map(|s| s.as_str()))
    }
}

/// Rank candidates by similarity to `name`, keeping substring matches
/// and anything above the similarity threshold
pub fn suggest<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, f64)> = candidates
        .map(|c| {
            let lower = c.to_lowercase();
            let mut score = strsim::jaro_winkler(&needle, &lower);
            if lower.contains(&needle) || needle.contains(&lower) {
                score = score.max(SIMILARITY_THRESHOLD);
            }
            (c, score)
        })
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(c, _)| c.to_string())
        .collect()
}
