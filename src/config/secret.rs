//! Bearer token wrapper
//!
//! The upload token is held in a [`secrecy::Secret`], zeroed when dropped and
//! printed as `[REDACTED]`. The tus client is the only caller of
//! `expose_secret()`.
//!
//! ```rust
//! use sfm_importer::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("eyJhbGciOi...".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "eyJhbGciOi...");
//! assert!(!format!("{token:?}").contains("eyJhbGciOi"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Token text; only reachable through `Secret::expose_secret`
#[derive(Clone, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl SecretValue {
    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Token as stored in [`UploadConfig`](super::UploadConfig)
pub type SecretString = Secret<SecretValue>;

/// Wrap a token read from the command line, environment or config file
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_expose_returns_token() {
        let token = secret_string("token-123".to_string());
        assert_eq!(token.expose_secret(), "token-123");
    }

    #[test]
    fn test_is_blank() {
        assert!(secret_string("  ".to_string()).expose_secret().is_blank());
        assert!(!secret_string("abc".to_string()).expose_secret().is_blank());
    }

    #[test]
    fn test_debug_never_shows_token() {
        let token = secret_string("sensitive-token".to_string());

        assert!(!format!("{token:?}").contains("sensitive-token"));
        assert_eq!(format!("{:?}", token.expose_secret()), "[REDACTED]");
    }

    #[test]
    fn test_token_in_upload_section_round_trips() {
        #[derive(Serialize, Deserialize)]
        struct Upload {
            token: SecretString,
        }

        let parsed: Upload = toml::from_str("token = \"abc123\"").unwrap();
        assert_eq!(parsed.token.expose_secret(), "abc123");

        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, r#"{"token":"abc123"}"#);
    }
}
