//! Resource abstraction layer
//!
//! This module provides a data-driven description of the Midaz API.
//! Resource schemas are loaded from JSON files at compile time, so new
//! endpoints are added by editing a definition, never the dispatcher.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and validates resource schemas from embedded JSON
//! - [`resolver`] - Resolves a (resource, action) pair into a canonical descriptor
//! - [`request`] - Builds concrete URLs and query strings from a descriptor
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `common.json` - Shared query parameter sets (pagination, date range, metadata)
//! - `onboarding.json` - Organizations, ledgers, assets, portfolios, segments, accounts
//! - `transaction.json` - Transactions, operations, balances, asset rates, routes
//! - `crm.json` - Holders and aliases
//! - `ledger.json` - Ledger settings such as metadata indexes
//!
//! # Example
//!
//! ```ignore
//! use midaz_mcp::resource::{resolve_action, Registry};
//!
//! let registry = Registry::load()?;
//! let action = resolve_action(&registry, "organizations", "get")?;
//! assert_eq!(action.path_template, "/v1/organizations/:id");
//! ```

pub mod registry;
pub mod request;
pub mod resolver;

pub use registry::*;
pub use request::{build_query_string, build_url, get_component_url, path_tokens, RequestError};
pub use resolver::{resolve_action, ResolveError, ResolvedAction};
