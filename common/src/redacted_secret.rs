//! Credential handling with redacted Debug/Display output.

use crate::RedactError;

use std::fmt;

use serde::Deserialize;
use serde::ser::Error;
use zeroize::Zeroize;

/// An API key, session token or access token that never exposes its value
/// in logs, debug output or serialized data.
#[derive(Clone, PartialEq, Eq)]
pub struct RedactedSecret {
    inner: String,
}

impl RedactedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    /// The raw value, for placing on the wire.
    ///
    /// # Security Note
    /// Only call this when building an outgoing request.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Length in bytes (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Empty or whitespace only.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }
}

impl From<String> for RedactedSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RedactedSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedSecret([REDACTED])")
    }
}

impl fmt::Display for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for RedactedSecret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Serializing a secret is always a bug; callers must go through expose().
impl serde::Serialize for RedactedSecret {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::serialization(
            "RedactedSecret cannot be serialized, use expose() explicitly",
        )))
    }
}

impl<'de> serde::Deserialize<'de> for RedactedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}
