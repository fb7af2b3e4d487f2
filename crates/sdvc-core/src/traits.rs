use std::future::Future;

use crate::error::CoreResult;

// ---------------------------------------------------------------------------
// Signer: issuer signing capability
//
// May be backed by a remote key service, so signing is asynchronous. One
// signer is keyed to exactly one issuer identity and one algorithm.
// ---------------------------------------------------------------------------

pub trait Signer: Send + Sync {
    /// JOSE algorithm name written into the credential header (e.g. `EdDSA`).
    fn algorithm(&self) -> &str;

    fn try_sign(&self, message: &[u8]) -> impl Future<Output = CoreResult<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Verifier: paired with a Signer's public key
// ---------------------------------------------------------------------------

pub trait Verifier: Send + Sync {
    /// Returns `Ok(false)` for a well-formed but wrong signature. `Err` is
    /// reserved for failures of the capability itself.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = CoreResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Hasher: digest function named by an algorithm identifier
// ---------------------------------------------------------------------------

pub trait Hasher: Send + Sync {
    /// Identifier carried in the payload as `_sd_alg` (e.g. `sha-256`).
    fn algorithm(&self) -> &str;

    fn digest(&self, data: &[u8]) -> Vec<u8>;
}

// ---------------------------------------------------------------------------
// SaltGenerator: per-disclosure randomness
// ---------------------------------------------------------------------------

pub trait SaltGenerator: Send + Sync {
    fn next_salt(&self) -> CoreResult<String>;
}
