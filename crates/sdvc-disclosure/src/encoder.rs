//! Disclosure encoder: turns a claim tree plus frame into a redacted payload
//! and the disclosures that open it.

use serde_json::{Map, Value};
use std::collections::HashSet;

use sdvc_core::{Hasher, SaltGenerator};

use crate::claims::{Claim, ClaimTree};
use crate::disclosure::{Disclosure, ARRAY_DIGEST_KEY, RESERVED_NAMES, SD_KEY};
use crate::error::{SdError, SdResult};
use crate::frame::Frame;
use crate::resolver::{join_path, resolve_at, Action, FieldKey};

/// Output of `encode_claims`.
#[derive(Debug, Clone)]
pub struct Redacted {
    pub payload: Map<String, Value>,
    pub disclosures: Vec<Disclosure>,
}

/// Redact `claims` according to `frame`.
///
/// Every hidden field (array elements included) gets a fresh salt; the
/// resulting disclosure's digest is placed exactly once in the payload.
pub fn encode_claims(
    claims: &ClaimTree,
    frame: &Frame,
    hasher: &dyn Hasher,
    salts: &dyn SaltGenerator,
) -> SdResult<Redacted> {
    let root = Claim::Object(claims.clone());
    check_reserved(&root, "")?;

    let mut encoder = Encoder {
        hasher,
        salts,
        used_salts: HashSet::new(),
        disclosures: Vec::new(),
    };
    let payload = match encoder.encode_node(&root, frame, "")? {
        Value::Object(map) => map,
        _ => return Err(SdError::Encoding("redacted root is not an object".into())),
    };

    tracing::debug!(
        disclosures = encoder.disclosures.len(),
        "claim tree redacted"
    );

    Ok(Redacted {
        payload,
        disclosures: encoder.disclosures,
    })
}

/// Reserved names are rejected anywhere in the tree, inline subtrees included.
fn check_reserved(node: &Claim, path: &str) -> SdResult<()> {
    match node {
        Claim::Scalar(_) => Ok(()),
        Claim::Object(tree) => tree.iter().try_for_each(|(name, child)| {
            let child_path = join_path(path, name);
            if RESERVED_NAMES.contains(&name.as_str()) {
                tracing::warn!(path = %child_path, "reserved claim name in claim set");
                return Err(SdError::ReservedClaimName(child_path));
            }
            check_reserved(child, &child_path)
        }),
        Claim::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, child)| check_reserved(child, &join_path(path, &i))),
    }
}

struct Encoder<'a> {
    hasher: &'a dyn Hasher,
    salts: &'a dyn SaltGenerator,
    used_salts: HashSet<String>,
    disclosures: Vec<Disclosure>,
}

impl Encoder<'_> {
    fn encode_node(&mut self, node: &Claim, frame: &Frame, path: &str) -> SdResult<Value> {
        match node {
            Claim::Scalar(_) => {
                // resolve_at rejects non-empty frames on scalars
                resolve_at(node, frame, path)?;
                Ok(node.to_json())
            }
            Claim::Object(_) => {
                let mut out = Map::new();
                let mut digests = Vec::new();
                for field in resolve_at(node, frame, path)? {
                    let FieldKey::Name(name) = &field.key else {
                        return Err(SdError::Encoding("object child without a name".into()));
                    };
                    let child_path = join_path(path, name);
                    match self.place(&field.key, field.claim, field.action, &child_path)? {
                        Placed::Inline(value) => {
                            out.insert(name.clone(), value);
                        }
                        Placed::Digest(digest) => digests.push(Value::String(digest)),
                    }
                }
                if !digests.is_empty() {
                    // Sorted so the digest order says nothing about claim order
                    digests.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
                    out.insert(SD_KEY.to_string(), Value::Array(digests));
                }
                Ok(Value::Object(out))
            }
            Claim::Array(_) => {
                let mut out = Vec::new();
                for field in resolve_at(node, frame, path)? {
                    let child_path = join_path(path, &field.key);
                    match self.place(&field.key, field.claim, field.action, &child_path)? {
                        Placed::Inline(value) => out.push(value),
                        Placed::Digest(digest) => {
                            let mut placeholder = Map::new();
                            placeholder.insert(ARRAY_DIGEST_KEY.to_string(), Value::String(digest));
                            out.push(Value::Object(placeholder));
                        }
                    }
                }
                Ok(Value::Array(out))
            }
        }
    }

    fn place(
        &mut self,
        key: &FieldKey,
        claim: &Claim,
        action: Action<'_>,
        path: &str,
    ) -> SdResult<Placed> {
        match action {
            Action::Inline => Ok(Placed::Inline(claim.to_json())),
            Action::Recurse(child) => Ok(Placed::Inline(self.encode_node(claim, child, path)?)),
            Action::Hidden => {
                let digest = self.disclose(key, claim.to_json())?;
                Ok(Placed::Digest(digest))
            }
            Action::HiddenRecurse(child) => {
                let redacted = self.encode_node(claim, child, path)?;
                let digest = self.disclose(key, redacted)?;
                Ok(Placed::Digest(digest))
            }
        }
    }

    fn disclose(&mut self, key: &FieldKey, value: Value) -> SdResult<String> {
        let salt = self.salts.next_salt()?;
        if !self.used_salts.insert(salt.clone()) {
            tracing::warn!("salt generator returned a duplicate salt");
            return Err(SdError::DuplicateSalt);
        }
        let disclosure =
            Disclosure::new(salt, key.name().map(str::to_string), value, self.hasher)?;
        let digest = disclosure.digest().to_string();
        self.disclosures.push(disclosure);
        Ok(digest)
    }
}

enum Placed {
    Inline(Value),
    Digest(String),
}
