//! Tool surface
//!
//! Two entry points cover the whole Midaz API:
//! - [`discover`] answers questions about the registry without network access
//! - [`execute`] resolves an action and issues the backend request

pub mod discover;
pub mod execute;

pub use discover::{discover, DiscoverIntent, DiscoverParams};
pub use execute::{execute, route_and_execute, ExecuteParams};
