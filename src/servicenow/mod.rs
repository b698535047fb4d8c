//! ServiceNow API module
//!
//! Provides a typed client for the ServiceNow Table API.

pub mod client;
pub mod types;

pub use client::ServiceNowClient;
pub use types::*;
