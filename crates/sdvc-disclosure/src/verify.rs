//! Credential and presentation verification.
//!
//! Verification flow:
//! 1. Check the payload's `_sd_alg` matches the injected hasher.
//! 2. Delegate the signature check to the `Verifier` capability.
//! 3. Recompute every attached disclosure's digest.
//! 4. Walk the payload, substituting each disclosure at the position its
//!    digest occupies; unmatched digests are dropped.
//! 5. Reject disclosures the payload never references.
//! 6. Split issuer metadata from subject claims and check `exp`.
//!
//! Any failure aborts the call; there is no partially valid result.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use subtle::ConstantTimeEq;

use sdvc_core::{Hasher, Verifier};

use crate::claims::{json_kind, ClaimTree};
use crate::disclosure::{digest_of, Disclosure, ARRAY_DIGEST_KEY, SD_ALG_KEY, SD_KEY};
use crate::error::{SdError, SdResult};
use crate::resolver::join_path;
use crate::sdjwt::SdJwt;
use crate::types::{IssuerMetadata, VerificationResult, METADATA_CLAIMS};

pub struct SdVerifier<V, H> {
    verifier: V,
    hasher: H,
}

impl<V, H> SdVerifier<V, H>
where
    V: Verifier,
    H: Hasher,
{
    pub fn new(verifier: V, hasher: H) -> Self {
        Self { verifier, hasher }
    }

    /// Verify a credential or presentation and reconstruct the claims its
    /// attached disclosures reveal.
    pub async fn verify(&self, sd_jwt: &SdJwt) -> SdResult<VerificationResult> {
        tracing::debug!(
            disclosures = sd_jwt.disclosures().len(),
            "verifying SD-JWT"
        );

        self.check_signature(sd_jwt).await?;
        self.check_algorithm(sd_jwt)?;

        let index = self.digest_index(sd_jwt.disclosures())?;
        let mut unfold = Unfold {
            index: &index,
            used: HashSet::new(),
            seen: HashSet::new(),
        };
        let root = unfold.object(sd_jwt.payload(), "", true)?;

        if unfold.used.len() != index.len() {
            let unused = index.len() - unfold.used.len();
            tracing::warn!(unused, "disclosures not referenced by the payload");
            return Err(SdError::DigestMismatch(format!(
                "{unused} disclosure(s) not referenced by the signed payload"
            )));
        }

        let metadata = IssuerMetadata::from_payload(sd_jwt.payload())?;
        check_expiry(&metadata)?;

        let subject: Map<String, Value> = root
            .into_iter()
            .filter(|(k, _)| !METADATA_CLAIMS.contains(&k.as_str()) && k.as_str() != SD_ALG_KEY)
            .collect();

        tracing::info!(
            iss = %metadata.iss,
            disclosed = index.len(),
            claims = subject.len(),
            "SD-JWT verified"
        );

        Ok(VerificationResult {
            valid: true,
            header: sd_jwt.header().clone(),
            metadata,
            disclosed_claims: ClaimTree::from_map(subject),
        })
    }

    /// Signature and payload shape only. Attached disclosures are ignored,
    /// so a freshly issued credential validates regardless of which subset
    /// a holder later forwards.
    pub async fn validate(&self, sd_jwt: &SdJwt) -> SdResult<IssuerMetadata> {
        self.check_signature(sd_jwt).await?;
        self.check_algorithm(sd_jwt)?;

        let empty = HashMap::new();
        let mut unfold = Unfold {
            index: &empty,
            used: HashSet::new(),
            seen: HashSet::new(),
        };
        unfold.object(sd_jwt.payload(), "", true)?;

        let metadata = IssuerMetadata::from_payload(sd_jwt.payload())?;
        if metadata.iss.is_empty() || metadata.vct.is_empty() {
            tracing::warn!("payload is missing issuer or credential type");
            return Err(SdError::MalformedPayload("empty iss or vct".into()));
        }
        check_expiry(&metadata)?;

        tracing::debug!(iss = %metadata.iss, vct = %metadata.vct, "SD-JWT validated");
        Ok(metadata)
    }

    fn check_algorithm(&self, sd_jwt: &SdJwt) -> SdResult<()> {
        let sd_alg = sd_jwt.sd_alg();
        if !sd_alg.eq_ignore_ascii_case(self.hasher.algorithm()) {
            tracing::warn!(sd_alg, expected = self.hasher.algorithm(), "digest algorithm mismatch");
            return Err(SdError::UnsupportedAlgorithm(sd_alg.to_string()));
        }
        Ok(())
    }

    async fn check_signature(&self, sd_jwt: &SdJwt) -> SdResult<()> {
        let valid = self
            .verifier
            .verify(sd_jwt.signing_input().as_bytes(), sd_jwt.signature())
            .await?;
        if !valid {
            tracing::warn!(alg = %sd_jwt.header().alg, "issuer signature rejected");
            return Err(SdError::SignatureInvalid);
        }
        Ok(())
    }

    /// Recompute each digest from the encoded disclosure and index by it.
    fn digest_index<'a>(
        &self,
        disclosures: &'a [Disclosure],
    ) -> SdResult<HashMap<String, &'a Disclosure>> {
        let mut index = HashMap::with_capacity(disclosures.len());
        for disclosure in disclosures {
            let digest = digest_of(disclosure.encoded(), &self.hasher);
            if !bool::from(digest.as_bytes().ct_eq(disclosure.digest().as_bytes())) {
                tracing::warn!("disclosure digest does not match its encoding");
                return Err(SdError::DigestMismatch(
                    "disclosure digest does not match its encoding".into(),
                ));
            }
            if index.insert(digest.clone(), disclosure).is_some() {
                tracing::warn!("same disclosure attached twice");
                return Err(SdError::DuplicateDigest(digest));
            }
        }
        Ok(index)
    }
}

fn check_expiry(metadata: &IssuerMetadata) -> SdResult<()> {
    match metadata.exp {
        Some(exp) if exp.is_past() => {
            tracing::warn!(exp = %exp, "credential expired");
            Err(SdError::CredentialExpired)
        }
        _ => Ok(()),
    }
}

/// Payload walk that substitutes disclosures back into place.
struct Unfold<'a> {
    index: &'a HashMap<String, &'a Disclosure>,
    used: HashSet<String>,
    seen: HashSet<String>,
}

impl<'a> Unfold<'a> {
    fn value(&mut self, node: &Value, path: &str) -> SdResult<Value> {
        match node {
            Value::Object(map) => Ok(Value::Object(self.object(map, path, false)?)),
            Value::Array(items) => self.array(items, path),
            other => Ok(other.clone()),
        }
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        path: &str,
        root: bool,
    ) -> SdResult<Map<String, Value>> {
        let mut out = Map::new();
        for (name, value) in map.iter().filter(|(k, _)| k.as_str() != SD_KEY) {
            out.insert(name.clone(), self.value(value, &join_path(path, name))?);
        }

        let Some(sd) = map.get(SD_KEY) else {
            return Ok(out);
        };
        let digests = sd.as_array().ok_or_else(|| {
            tracing::warn!(path, "_sd is not an array");
            SdError::MalformedPayload(format!("'{}' _sd is a {}", path, json_kind(sd)))
        })?;

        for entry in digests {
            let digest = entry.as_str().ok_or_else(|| {
                SdError::MalformedPayload(format!("'{}' _sd holds a {}", path, json_kind(entry)))
            })?;
            let Some(disclosure) = self.claim(digest)? else {
                continue;
            };
            let Some(name) = disclosure.name() else {
                tracing::warn!(path, "array-element disclosure referenced from _sd");
                return Err(SdError::DigestMismatch(format!(
                    "array element disclosure referenced as a property of '{}'",
                    path
                )));
            };
            let child_path = join_path(path, &name);
            if out.contains_key(name) || (root && METADATA_CLAIMS.contains(&name)) {
                tracing::warn!(path = %child_path, "disclosed name collides with an existing claim");
                return Err(SdError::DigestMismatch(format!(
                    "disclosed claim '{}' collides with an existing claim",
                    child_path
                )));
            }
            let value = self.value(disclosure.value(), &child_path)?;
            out.insert(name.to_string(), value);
        }
        Ok(out)
    }

    fn array(&mut self, items: &[Value], path: &str) -> SdResult<Value> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let child_path = join_path(path, &i);
            let Some(digest) = placeholder(item)? else {
                out.push(self.value(item, &child_path)?);
                continue;
            };
            let Some(disclosure) = self.claim(digest)? else {
                continue;
            };
            if !disclosure.is_array_element() {
                tracing::warn!(path = %child_path, "property disclosure referenced from an array");
                return Err(SdError::DigestMismatch(format!(
                    "property disclosure referenced as element '{}'",
                    child_path
                )));
            }
            out.push(self.value(disclosure.value(), &child_path)?);
        }
        Ok(Value::Array(out))
    }

    /// Record `digest` as referenced and return its disclosure, if attached.
    fn claim(&mut self, digest: &str) -> SdResult<Option<&'a Disclosure>> {
        if !self.seen.insert(digest.to_string()) {
            tracing::warn!("digest referenced more than once in payload");
            return Err(SdError::DuplicateDigest(digest.to_string()));
        }
        match self.index.get(digest) {
            Some(disclosure) => {
                self.used.insert(digest.to_string());
                Ok(Some(*disclosure))
            }
            None => Ok(None),
        }
    }
}

/// `{"...": digest}` array placeholder. Any other single-key object using
/// the reserved key is malformed.
fn placeholder(item: &Value) -> SdResult<Option<&str>> {
    let Some(map) = item.as_object() else {
        return Ok(None);
    };
    match map.get(ARRAY_DIGEST_KEY) {
        None => Ok(None),
        Some(Value::String(digest)) if map.len() == 1 => Ok(Some(digest)),
        Some(_) => Err(SdError::MalformedPayload(format!(
            "malformed '{}' array placeholder",
            ARRAY_DIGEST_KEY
        ))),
    }
}
