//! Access control module
//!
//! Decides which incident tools an MCP client may call.
//!
//! Precedence (highest to lowest):
//!
//! 1. **Action override** - explicit allow/deny for one tool
//! 2. **Allow pattern** - regex over tool names
//! 3. **Deny pattern** - regex over tool names
//! 4. **Base level** - `none`, `read` or `full`
//!
//! ## Example Configuration
//!
//! ```toml
//! [access_control]
//! all = "read"                      # Read-only instance access
//! deny = ["^get_incident_by_date$"]
//!
//! [access_control.actions]
//! add_comment = "allow"             # Comments are still permitted
//! ```

pub mod patterns;
pub mod resolver;
pub mod types;

pub use patterns::PatternMatcher;
pub use resolver::{AccessDecision, AccessResolver};
pub use types::OperationType;
