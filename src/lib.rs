//! ServiceNow MCP Server
//!
//! A Model Context Protocol server exposing ServiceNow incident management:
//! create, update, comment, resolve, list and look up incidents.
//!
//! ## Authentication
//!
//! Every request to the instance carries headers produced by
//! [`auth::HeaderResolver`] from one of three schemes:
//!
//! - **API key** in a configurable header (`x-sn-apikey` by default)
//! - **Basic** credentials
//! - **OAuth 2.0** bearer tokens, fetched from the instance token endpoint
//!   and cached until shortly before they expire
//!
//! ## Example Configuration
//!
//! ```toml
//! [servicenow]
//! instance_url = "https://dev12345.service-now.com"
//!
//! [servicenow.auth]
//! type = "oauth"
//!
//! [servicenow.auth.oauth]
//! client_id = "abc"
//! client_secret = "s3cret"
//!
//! [access_control]
//! all = "read"                    # Read-only
//! ```

pub mod access_control;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod servicenow;
pub mod tools;
pub mod transport;
pub mod util;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use server::ServiceNowMcpHandler;
