//! Access control types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation type for determining read vs write access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Reads incidents (list, lookup)
    Read,
    /// Creates or modifies incidents (create, update, comment, resolve)
    Write,
}

impl OperationType {
    /// Check if this operation is read-only
    pub const fn is_read_only(&self) -> bool {
        matches!(self, OperationType::Read)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
