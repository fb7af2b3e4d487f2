use thiserror::Error;

/// Failure reported by an injected capability (key service, HSM, hasher).
///
/// Protocol crates pass these through untouched; they are never rewritten
/// into protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("signing error: {0}")]
    Signing(String),

    #[error("verification error: {0}")]
    Verification(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("randomness error: {0}")]
    Randomness(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
