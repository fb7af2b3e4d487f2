//! Compact SD-JWT container shared by credentials and presentations.
//!
//! Format: `<header>.<payload>.<signature>~<disclosure>~...~`
//! A presentation is the same container with fewer disclosures.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{Map, Value};
use std::fmt;

use sdvc_core::Hasher;

use crate::disclosure::{Disclosure, SD_ALG_KEY};
use crate::error::{SdError, SdResult};
use crate::types::{IssuerMetadata, JwtHeader};

/// Separator between the issuer JWT and each disclosure.
pub const SEPARATOR: char = '~';

/// Digest algorithm assumed when a payload carries no `_sd_alg`.
pub const DEFAULT_SD_ALG: &str = "sha-256";

#[derive(Debug, Clone, PartialEq)]
pub struct SdJwt {
    header: JwtHeader,
    payload: Map<String, Value>,
    signing_input: String,
    signature: Vec<u8>,
    disclosures: Vec<Disclosure>,
}

/// Issued credential: the signed payload plus every minted disclosure.
pub type Credential = SdJwt;

/// Holder presentation: the unchanged signed payload plus a subset of the
/// credential's disclosures.
pub type Presentation = SdJwt;

impl SdJwt {
    pub(crate) fn from_parts(
        header: JwtHeader,
        payload: Map<String, Value>,
        signing_input: String,
        signature: Vec<u8>,
        disclosures: Vec<Disclosure>,
    ) -> Self {
        Self {
            header,
            payload,
            signing_input,
            signature,
            disclosures,
        }
    }

    /// Same signed part, different disclosure set.
    pub(crate) fn with_disclosures(&self, disclosures: Vec<Disclosure>) -> Self {
        Self {
            disclosures,
            ..self.clone()
        }
    }

    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    /// The signed (redacted) payload.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Exact bytes the issuer signed: `<header>.<payload>`.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn disclosures(&self) -> &[Disclosure] {
        &self.disclosures
    }

    /// Digest algorithm named in the payload.
    pub fn sd_alg(&self) -> &str {
        self.payload
            .get(SD_ALG_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SD_ALG)
    }

    pub fn metadata(&self) -> SdResult<IssuerMetadata> {
        IssuerMetadata::from_payload(&self.payload)
    }

    /// Issuer-signed JWT without any disclosures.
    pub fn jwt(&self) -> String {
        format!(
            "{}.{}",
            self.signing_input,
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }

    pub fn encode(&self) -> String {
        let mut compact = self.jwt();
        for disclosure in &self.disclosures {
            compact.push(SEPARATOR);
            compact.push_str(disclosure.encoded());
        }
        // Trailing separator: no key-binding JWT
        compact.push(SEPARATOR);
        compact
    }

    /// Parse a compact credential or presentation. Each disclosure's digest
    /// is computed with `hasher`. The payload's `_sd_alg` is not checked
    /// here: it is unauthenticated until the verifier checks the signature.
    pub fn decode(compact: &str, hasher: &dyn Hasher) -> SdResult<Self> {
        tracing::debug!(len = compact.len(), "decoding compact SD-JWT");

        let Some((jwt, rest)) = compact.split_once(SEPARATOR) else {
            tracing::warn!("compact SD-JWT has no disclosure separator");
            return Err(SdError::Decode("missing '~' separator".into()));
        };

        let segments: Vec<&str> = rest.split(SEPARATOR).collect();
        let (last, middle) = segments
            .split_last()
            .ok_or_else(|| SdError::Decode("missing trailing separator".into()))?;
        if !last.is_empty() {
            tracing::warn!("compact SD-JWT carries a key-binding JWT");
            return Err(SdError::Decode(
                "key-binding JWT is not supported; expected trailing '~'".into(),
            ));
        }

        let (header, payload, signing_input, signature) = decode_jwt(jwt)?;

        let disclosures = middle
            .iter()
            .map(|segment| {
                if segment.is_empty() {
                    Err(SdError::Decode("empty disclosure segment".into()))
                } else {
                    Disclosure::decode(segment, hasher)
                }
            })
            .collect::<SdResult<Vec<_>>>()?;

        tracing::debug!(disclosures = disclosures.len(), "compact SD-JWT decoded");

        Ok(Self {
            header,
            payload,
            signing_input,
            signature,
            disclosures,
        })
    }
}

impl fmt::Display for SdJwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

type DecodedJwt = (JwtHeader, Map<String, Value>, String, Vec<u8>);

fn decode_jwt(jwt: &str) -> SdResult<DecodedJwt> {
    let segments: Vec<&str> = jwt.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        tracing::warn!(
            segments = segments.len(),
            "issuer JWT has wrong number of segments"
        );
        return Err(SdError::Decode(format!(
            "issuer JWT must have 3 segments, got {}",
            segments.len()
        )));
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|e| SdError::Decode(format!("invalid base64url header: {e}")))?;
    let header: JwtHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| SdError::Decode(format!("invalid JWT header: {e}")))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| SdError::Decode(format!("invalid base64url payload: {e}")))?;
    let payload: Map<String, Value> = serde_json::from_slice(&payload_bytes)
        .map_err(|e| SdError::Decode(format!("payload is not a JSON object: {e}")))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| SdError::Decode(format!("invalid base64url signature: {e}")))?;

    Ok((
        header,
        payload,
        format!("{}.{}", header_b64, payload_b64),
        signature,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdvc_core::Sha2Hasher;
    use serde_json::json;

    fn b64(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_string(value).unwrap())
    }

    fn compact_with(payload: Value, disclosures: &[&str]) -> String {
        let header = b64(&json!({"alg": "EdDSA", "typ": "vc+sd-jwt"}));
        let mut s = format!("{}.{}.{}", header, b64(&payload), URL_SAFE_NO_PAD.encode([7u8; 64]));
        for d in disclosures {
            s.push('~');
            s.push_str(d);
        }
        s.push('~');
        s
    }

    #[test]
    fn test_decode_and_reencode() {
        let h = Sha2Hasher::Sha256;
        let d = Disclosure::new("salt", Some("ssn".into()), json!("123"), &h).unwrap();
        let compact = compact_with(
            json!({"iss": "x", "iat": 1, "vct": "t", "_sd_alg": "sha-256", "_sd": [d.digest()]}),
            &[d.encoded()],
        );
        let sd = SdJwt::decode(&compact, &h).unwrap();
        assert_eq!(sd.header().alg, "EdDSA");
        assert_eq!(sd.disclosures().len(), 1);
        assert_eq!(sd.disclosures()[0].digest(), d.digest());
        assert_eq!(sd.signature(), &[7u8; 64]);
        assert_eq!(sd.encode(), compact);
        assert_eq!(sd.to_string(), compact);
    }

    #[test]
    fn test_decode_no_disclosures() {
        let compact = compact_with(json!({"iss": "x"}), &[]);
        let sd = SdJwt::decode(&compact, &Sha2Hasher::Sha256).unwrap();
        assert!(sd.disclosures().is_empty());
        assert_eq!(sd.sd_alg(), DEFAULT_SD_ALG);
        assert!(compact.ends_with('~'));
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        let compact = compact_with(json!({}), &[]);
        let jwt_only = compact.trim_end_matches('~');
        assert!(matches!(
            SdJwt::decode(jwt_only, &Sha2Hasher::Sha256).unwrap_err(),
            SdError::Decode(_)
        ));
    }

    #[test]
    fn test_decode_rejects_key_binding() {
        let compact = format!("{}kb.jwt.sig", compact_with(json!({}), &[]));
        assert!(matches!(
            SdJwt::decode(&compact, &Sha2Hasher::Sha256).unwrap_err(),
            SdError::Decode(_)
        ));
    }

    #[test]
    fn test_decode_rejects_bad_jwt() {
        assert!(SdJwt::decode("a.b~", &Sha2Hasher::Sha256).is_err());
        assert!(SdJwt::decode("!!.!!.!!~", &Sha2Hasher::Sha256).is_err());
        let array_payload = format!(
            "{}.{}.{}~",
            b64(&json!({"alg": "EdDSA", "typ": "vc+sd-jwt"})),
            b64(&json!([1, 2])),
            URL_SAFE_NO_PAD.encode([0u8; 4])
        );
        assert!(SdJwt::decode(&array_payload, &Sha2Hasher::Sha256).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_disclosure_segment() {
        let compact = compact_with(json!({}), &[""]);
        assert!(matches!(
            SdJwt::decode(&compact, &Sha2Hasher::Sha256).unwrap_err(),
            SdError::Decode(_)
        ));
    }

    #[test]
    fn test_decode_leaves_algorithm_to_verifier() {
        let compact = compact_with(json!({"_sd_alg": "sha-512"}), &[]);
        let decoded = SdJwt::decode(&compact, &Sha2Hasher::Sha256).unwrap();
        assert_eq!(decoded.sd_alg(), "sha-512");
    }
}
