//! Secret string wrapper for credential material.
//!
//! [`SecretString`] holds OAuth2 client secrets, refresh tokens, and access
//! tokens so they cannot leak through `Debug` output or log lines.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A string value that never appears in `Debug`, `Display`, or serialized
/// output.
///
/// Deserializes from a plain string (the Google token file stores secrets
/// in the clear), serializes as an empty string, and prints `[REDACTED]`.
/// Call [`expose()`](SecretString::expose) where the raw value is actually
/// needed (token refresh form bodies, `Authorization` headers).
#[derive(Clone, Default)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret. Use only at the point the credential is sent.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the wrapped value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"[REDACTED]\"")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SecretString(String::deserialize(deserializer)?))
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString(s.to_string())
    }
}
