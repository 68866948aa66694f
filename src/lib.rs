//! Schema registry and dispatcher for the Midaz ledger APIs.

pub mod backend;
pub mod config;
pub mod error;
pub mod resource;
pub mod tools;

/// Version injected at compile time via MIDAZ_MCP_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("MIDAZ_MCP_VERSION") {
    Some(v) => v,
    None => "dev",
};

pub use backend::{BackendClient, HealthStatus};
pub use config::{Config, ConfigFile};
pub use error::{DispatchError, ErrorCode, ToolError};
pub use resource::Registry;
