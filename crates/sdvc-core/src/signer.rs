use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::crypto::issuer_id_from_pubkey;
use crate::error::{CoreError, CoreResult};
use crate::traits::{Signer, Verifier};
use crate::types::IssuerId;

/// In-process Ed25519 issuer key implementing the `Signer` capability.
pub struct Ed25519Signer {
    signing_key: Zeroizing<[u8; 32]>,
    verifying_key: [u8; 32],
}

impl Ed25519Signer {
    /// Create a signer from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key: Zeroizing::new(seed),
            verifying_key: verifying_key.to_bytes(),
        }
    }

    /// Create a signer with a fresh key from OS randomness.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_seed(signing_key.to_bytes())
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key
    }

    pub fn issuer_id(&self) -> IssuerId {
        issuer_id_from_pubkey(&self.verifying_key)
    }

    /// The matching verification capability.
    pub fn verifier(&self) -> Ed25519Verifier {
        Ed25519Verifier {
            verifying_key: self.verifying_key,
        }
    }
}

impl Signer for Ed25519Signer {
    fn algorithm(&self) -> &str {
        "EdDSA"
    }

    async fn try_sign(&self, message: &[u8]) -> CoreResult<Vec<u8>> {
        let signing_key = SigningKey::from_bytes(&self.signing_key);
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }
}

/// Ed25519 signature verification against a fixed public key.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    verifying_key: [u8; 32],
}

impl Ed25519Verifier {
    pub fn from_public_key(bytes: &[u8; 32]) -> CoreResult<Self> {
        VerifyingKey::from_bytes(bytes)
            .map_err(|_| CoreError::KeyMaterial("invalid Ed25519 public key".into()))?;
        Ok(Self {
            verifying_key: *bytes,
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key
    }
}

impl Verifier for Ed25519Verifier {
    async fn verify(&self, message: &[u8], signature: &[u8]) -> CoreResult<bool> {
        let vk = VerifyingKey::from_bytes(&self.verifying_key)
            .map_err(|_| CoreError::KeyMaterial("invalid Ed25519 public key".into()))?;
        let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
            return Ok(false);
        };
        let sig = Signature::from_bytes(&bytes);
        Ok(vk.verify_strict(message, &sig).is_ok())
    }
}
