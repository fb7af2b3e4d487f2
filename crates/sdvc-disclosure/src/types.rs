use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sdvc_core::Timestamp;
use sdvc_status::{StatusListEntry, StatusReference};

use crate::claims::ClaimTree;
use crate::error::{SdError, SdResult};

/// Media type written into the issuer JWT header.
pub const SD_JWT_VC_TYPE: &str = "vc+sd-jwt";

/// Top-level claims owned by the issuer. They are always inline and may not
/// be used as names in the subject's claim tree.
pub const METADATA_CLAIMS: [&str; 7] = ["iss", "iat", "vct", "exp", "nbf", "status", "cnf"];

// ---------------------------------------------------------------------------
// JwtHeader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

impl JwtHeader {
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: SD_JWT_VC_TYPE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// IssuerMetadata: iss / iat / vct (+ optional exp, status)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerMetadata {
    /// Issuer identifier.
    pub iss: String,
    /// Issuance time.
    pub iat: Timestamp,
    /// Credential type (schema) identifier.
    pub vct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusReference>,
}

impl IssuerMetadata {
    /// Metadata issued now, with no expiry or status entry.
    pub fn new(iss: impl Into<String>, vct: impl Into<String>) -> Self {
        Self {
            iss: iss.into(),
            iat: Timestamp::now(),
            vct: vct.into(),
            exp: None,
            status: None,
        }
    }

    pub fn issued_at(mut self, iat: Timestamp) -> Self {
        self.iat = iat;
        self
    }

    pub fn expires_at(mut self, exp: Timestamp) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn with_status(mut self, entry: StatusListEntry) -> Self {
        self.status = Some(StatusReference {
            status_list: entry,
        });
        self
    }

    pub fn status_entry(&self) -> Option<&StatusListEntry> {
        self.status.as_ref().map(|s| &s.status_list)
    }

    pub(crate) fn to_map(&self) -> SdResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(SdError::Encoding("issuer metadata is not an object".into())),
        }
    }

    /// Pull the metadata claims out of a payload object.
    pub(crate) fn from_payload(payload: &Map<String, Value>) -> SdResult<Self> {
        let subset: Map<String, Value> = payload
            .iter()
            .filter(|(k, _)| METADATA_CLAIMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(subset)).map_err(|e| {
            tracing::warn!(error = %e, "payload issuer metadata is malformed");
            SdError::MalformedPayload(format!("issuer metadata: {e}"))
        })
    }
}

// ---------------------------------------------------------------------------
// VerificationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    /// Always true on `Ok`; failures are reported as errors, never as a
    /// partially valid result.
    pub valid: bool,
    pub header: JwtHeader,
    pub metadata: IssuerMetadata,
    /// Subject claims with every attached disclosure substituted back in.
    /// Claims whose disclosure was not attached are absent.
    pub disclosed_claims: ClaimTree,
}

impl VerificationResult {
    pub fn status(&self) -> Option<&StatusListEntry> {
        self.metadata.status_entry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_serialization_skips_absent() {
        let m = IssuerMetadata::new("University", "University-Degree")
            .issued_at(Timestamp::from_seconds(1_700_000_000));
        let map = m.to_map().unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"iss": "University", "iat": 1_700_000_000, "vct": "University-Degree"})
        );
    }

    #[test]
    fn test_metadata_from_payload_ignores_subject_claims() {
        let payload = json!({
            "iss": "University",
            "iat": 10,
            "vct": "University-Degree",
            "exp": 20,
            "status": {"status_list": {"idx": 3, "uri": "https://example.com/sl"}},
            "id": "1234",
            "_sd": ["abc"]
        });
        let Value::Object(map) = payload else { unreachable!() };
        let m = IssuerMetadata::from_payload(&map).unwrap();
        assert_eq!(m.exp, Some(Timestamp::from_seconds(20)));
        assert_eq!(m.status_entry().unwrap().idx, 3);
    }

    #[test]
    fn test_metadata_from_payload_requires_iss() {
        let Value::Object(map) = json!({"iat": 10, "vct": "x"}) else { unreachable!() };
        assert!(matches!(
            IssuerMetadata::from_payload(&map).unwrap_err(),
            SdError::MalformedPayload(_)
        ));
    }

    #[test]
    fn test_header_defaults_type() {
        let h = JwtHeader::new("EdDSA");
        assert_eq!(
            serde_json::to_value(&h).unwrap(),
            json!({"alg": "EdDSA", "typ": "vc+sd-jwt"})
        );
    }
}
