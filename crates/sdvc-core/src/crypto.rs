use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{CoreError, CoreResult};
use crate::traits::{Hasher, SaltGenerator};
use crate::types::IssuerId;

/// Minimum salt entropy in bytes (128 bits).
pub const MIN_SALT_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// SHA-2 hashers, addressed by their IANA "Named Information" names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sha2Hasher {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl Sha2Hasher {
    /// Look up a hasher by name. Matching is case-insensitive.
    pub fn from_name(name: &str) -> CoreResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha-256" => Ok(Self::Sha256),
            "sha-384" => Ok(Self::Sha384),
            "sha-512" => Ok(Self::Sha512),
            other => Err(CoreError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
        }
    }
}

impl Hasher for Sha2Hasher {
    fn algorithm(&self) -> &str {
        self.name()
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// RandomSaltGenerator: OS randomness, base64url without padding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RandomSaltGenerator {
    bytes: usize,
}

impl RandomSaltGenerator {
    /// Salts shorter than `MIN_SALT_BYTES` are rejected.
    pub fn new(bytes: usize) -> CoreResult<Self> {
        if bytes < MIN_SALT_BYTES {
            return Err(CoreError::Randomness(format!(
                "salt length {} below minimum of {} bytes",
                bytes, MIN_SALT_BYTES
            )));
        }
        Ok(Self { bytes })
    }
}

impl Default for RandomSaltGenerator {
    fn default() -> Self {
        Self {
            bytes: MIN_SALT_BYTES,
        }
    }
}

impl SaltGenerator for RandomSaltGenerator {
    fn next_salt(&self) -> CoreResult<String> {
        let mut buf = vec![0u8; self.bytes];
        rand::rngs::OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| CoreError::Randomness(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(buf))
    }
}

// ---------------------------------------------------------------------------
// Issuer identifiers
// ---------------------------------------------------------------------------

/// Derive an issuer identifier from an Ed25519 public key.
///
/// Formula: Base58(SHA-256(pubkey)[0:20])
pub fn issuer_id_from_pubkey(pubkey: &[u8; 32]) -> IssuerId {
    let hash = Sha256::digest(pubkey);
    IssuerId(bs58::encode(&hash[..20]).into_string())
}

/// Check that an issuer identifier was derived from the given public key.
pub fn verify_issuer_id(id: &IssuerId, pubkey: &[u8; 32]) -> bool {
    issuer_id_from_pubkey(pubkey) == *id
}
