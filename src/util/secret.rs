//! Secret string type for credential handling.
//!
//! API keys, passwords, client secrets and OAuth access tokens all travel
//! through this type.

use serde::Deserialize;
use std::fmt;

/// A credential that never shows up in logs or serialized output.
///
/// `Debug` and `Display` print `[REDACTED]`. There is deliberately no
/// `Serialize` implementation, so a config or response struct holding a
/// `SecretString` cannot be serialized with the secret in it. The value is
/// only reachable through [`SecretString::expose_secret`].
///
/// # Example
/// ```ignore
/// let password = SecretString::new("wonderland");
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// assert_eq!(password.expose_secret(), "wonderland");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value.
    ///
    /// Only call this where the raw value is needed, such as when building
    /// an authentication header or a token request body.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Whether the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Best-effort only: earlier reallocations may have left copies behind.
        self.0.clear();
        self.0.shrink_to_fit();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacted() {
        let secret = SecretString::new("secret123");
        let debug_output = format!("{:?}", secret);
        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("secret123"));
    }

    #[test]
    fn test_display_redacted() {
        let secret = SecretString::new("secret123");
        assert_eq!(secret.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_redacted_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Credentials {
            username: String,
            password: SecretString,
        }

        let creds = Credentials {
            username: "alice".into(),
            password: "wonderland".into(),
        };
        let output = format!("{:?}", creds);
        assert!(output.contains("alice"));
        assert!(!output.contains("wonderland"));
    }

    #[test]
    fn test_expose_and_empty() {
        let secret = SecretString::new("secret123");
        assert_eq!(secret.expose_secret(), "secret123");
        assert!(!secret.is_empty());
        assert!(SecretString::new("").is_empty());
    }

    #[test]
    fn test_deserialize() {
        let secret: SecretString = serde_json::from_str(r#""test-key""#).unwrap();
        assert_eq!(secret.expose_secret(), "test-key");
    }
}
