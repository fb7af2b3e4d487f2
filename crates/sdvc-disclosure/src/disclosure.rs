//! Disclosure records.
//!
//! A disclosure is the base64url encoding of the JSON array
//! `[salt, name, value]` (object property) or `[salt, value]` (array
//! element). Its digest is base64url(hash(ascii(encoded))), and that digest
//! is what the signed payload commits to.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;
use std::fmt;

use sdvc_core::Hasher;

use crate::error::{SdError, SdResult};

/// Object key holding the sorted digests of hidden properties.
pub const SD_KEY: &str = "_sd";
/// Key of the placeholder object standing in for a hidden array element.
pub const ARRAY_DIGEST_KEY: &str = "...";
/// Payload claim naming the digest algorithm.
pub const SD_ALG_KEY: &str = "_sd_alg";

/// Claim names that can never appear inside a claim tree.
pub const RESERVED_NAMES: [&str; 3] = [SD_KEY, ARRAY_DIGEST_KEY, SD_ALG_KEY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure {
    salt: String,
    name: Option<String>,
    value: Value,
    encoded: String,
    digest: String,
}

impl Disclosure {
    /// Mint a disclosure and compute its digest.
    pub fn new(
        salt: impl Into<String>,
        name: Option<String>,
        value: Value,
        hasher: &dyn Hasher,
    ) -> SdResult<Self> {
        let salt = salt.into();
        let array = match &name {
            Some(n) => serde_json::json!([salt, n, value]),
            None => serde_json::json!([salt, value]),
        };
        let json = serde_json::to_string(&array)?;
        let encoded = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let digest = digest_of(&encoded, hasher);

        Ok(Self {
            salt,
            name,
            value,
            encoded,
            digest,
        })
    }

    /// Parse an encoded disclosure and compute its digest.
    pub fn decode(encoded: &str, hasher: &dyn Hasher) -> SdResult<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
            tracing::warn!(error = %e, "disclosure is not valid base64url");
            SdError::Decode(format!("disclosure is not base64url: {e}"))
        })?;
        let array: Vec<Value> = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(error = %e, "disclosure is not a JSON array");
            SdError::Decode(format!("disclosure is not a JSON array: {e}"))
        })?;

        let (salt, name, value) = match array.as_slice() {
            [Value::String(salt), value] => (salt.clone(), None, value.clone()),
            [Value::String(salt), Value::String(name), value] => {
                (salt.clone(), Some(name.clone()), value.clone())
            }
            _ => {
                return Err(SdError::Decode(format!(
                    "disclosure must be [salt, value] or [salt, name, value], got {} elements",
                    array.len()
                )))
            }
        };

        if let Some(n) = &name {
            if RESERVED_NAMES.contains(&n.as_str()) {
                return Err(SdError::ReservedClaimName(n.clone()));
            }
        }

        Ok(Self {
            salt,
            name,
            value,
            encoded: encoded.to_string(),
            digest: digest_of(encoded, hasher),
        })
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// `None` for array-element disclosures.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_array_element(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for Disclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

/// Digest of an encoded disclosure as it appears in a payload.
pub fn digest_of(encoded: &str, hasher: &dyn Hasher) -> String {
    URL_SAFE_NO_PAD.encode(hasher.digest(encoded.as_bytes()))
}
