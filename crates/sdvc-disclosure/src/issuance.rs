//! Credential issuance.
//!
//! The claim tree is redacted per the frame, the issuer metadata and
//! `_sd_alg` are merged in, and the result is signed through the `Signer`
//! capability. Key material never passes through this module.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;

use sdvc_core::{Hasher, SaltGenerator, Signer};

use crate::claims::ClaimTree;
use crate::disclosure::SD_ALG_KEY;
use crate::encoder::encode_claims;
use crate::error::{SdError, SdResult};
use crate::frame::Frame;
use crate::sdjwt::{Credential, SdJwt};
use crate::types::{IssuerMetadata, JwtHeader, METADATA_CLAIMS};

pub struct Issuer<S, H, G> {
    signer: S,
    hasher: H,
    salts: G,
}

impl<S, H, G> Issuer<S, H, G>
where
    S: Signer,
    H: Hasher,
    G: SaltGenerator,
{
    pub fn new(signer: S, hasher: H, salts: G) -> Self {
        Self {
            signer,
            hasher,
            salts,
        }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Issue a credential over `claims`, hiding what `frame` marks.
    ///
    /// Fails on frame/claim mismatches, on claim names that collide with
    /// issuer metadata or SD-JWT reserved keys, and with `Capability` when
    /// the signer or salt source fails.
    pub async fn issue(
        &self,
        claims: &ClaimTree,
        frame: &Frame,
        metadata: &IssuerMetadata,
    ) -> SdResult<Credential> {
        tracing::debug!(
            claims = claims.len(),
            vct = %metadata.vct,
            "issuing credential"
        );

        if let Some(name) = claims.names().find(|n| METADATA_CLAIMS.contains(n)) {
            tracing::warn!(name, "claim name collides with issuer metadata");
            return Err(SdError::ReservedClaimName(name.to_string()));
        }

        let redacted = encode_claims(claims, frame, &self.hasher, &self.salts)?;

        let mut payload = metadata.to_map()?;
        payload.extend(redacted.payload);
        payload.insert(
            SD_ALG_KEY.to_string(),
            Value::String(self.hasher.algorithm().to_string()),
        );

        let header = JwtHeader::new(self.signer.algorithm());
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?)
        );

        let signature = self
            .signer
            .try_sign(signing_input.as_bytes())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "signer rejected issuance");
                SdError::from(e)
            })?;

        tracing::info!(
            iss = %metadata.iss,
            vct = %metadata.vct,
            disclosures = redacted.disclosures.len(),
            "credential issued"
        );

        Ok(SdJwt::from_parts(
            header,
            payload,
            signing_input,
            signature,
            redacted.disclosures,
        ))
    }
}
