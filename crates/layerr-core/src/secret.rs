//! Redacted, zeroize-on-drop strings for private keys.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

const REDACTED: &str = "[REDACTED]";

/// A hex-encoded secret key. The buffer is wiped on drop and never shown by
/// `Debug`, `Display` or `Serialize`.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// The raw secret. Never pass the result to a logging macro.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({})", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for SecretString {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x6969696969696969696969696969696969696969696969696969696969696969";

    #[test]
    fn test_debug_and_display_are_redacted() {
        let secret = SecretString::from(KEY);
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_serialize_is_redacted() {
        let json = serde_json::to_string(&SecretString::from(KEY)).unwrap();
        assert!(!json.contains("6969"));
    }

    #[test]
    fn test_deserialize_keeps_value() {
        let secret: SecretString = serde_json::from_str(&format!("\"{}\"", KEY)).unwrap();
        assert_eq!(secret.expose_secret(), KEY);
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(SecretString::from("  ").is_empty());
        assert!(!SecretString::from(KEY).is_empty());
    }
}
