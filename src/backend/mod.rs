//! Midaz backend interaction module
//!
//! This module issues the HTTP calls behind every execute request, against
//! the four backend components (onboarding, transaction, crm, ledger).
//!
//! # Module Structure
//!
//! - [`client`] - Backend client owning the connection pool and resolved config
//! - [`http`] - Response interpretation and transport error mapping
//! - [`health`] - Per-component health checks
//!
//! # Example
//!
//! ```ignore
//! use midaz_mcp::backend::{BackendClient, BackendRequest};
//!
//! async fn example(client: &BackendClient) -> anyhow::Result<()> {
//!     let status = client.check_health(Component::Onboarding).await;
//!     println!("onboarding healthy: {}", status.healthy);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod health;
pub mod http;

pub use client::{BackendClient, BackendRequest};
pub use health::{HealthStatus, HEALTH_TIMEOUT};
