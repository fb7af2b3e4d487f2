use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timestamp: whole seconds since the Unix epoch (JWT NumericDate)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn as_seconds(&self) -> i64 {
        self.0
    }

    /// Offset by a signed number of seconds, saturating at the i64 bounds.
    pub fn plus_seconds(&self, seconds: i64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    pub fn to_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp(self.0, 0)
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "invalid".to_string())
    }

    pub fn is_past(&self) -> bool {
        *self < Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// IssuerId: self-certifying issuer identifier derived from a public key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerId(pub String);

impl IssuerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
