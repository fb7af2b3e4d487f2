use sdvc_core::CoreError;
use thiserror::Error;

/// Error type for issuance, presentation and verification.
///
/// Every variant is deterministic in its inputs; retrying the same call
/// yields the same error. Capability failures are carried through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SdError {
    #[error("unknown field in disclosure frame: {0}")]
    UnknownField(String),

    #[error("disclosure frame does not match claim shape: {0}")]
    FrameShape(String),

    #[error("reserved claim name: {0}")]
    ReservedClaimName(String),

    #[error("field is not disclosable: {0}")]
    NotDisclosable(String),

    #[error("issuer signature is invalid")]
    SignatureInvalid,

    #[error("disclosure digest mismatch: {0}")]
    DigestMismatch(String),

    #[error("digest referenced more than once: {0}")]
    DuplicateDigest(String),

    #[error("salt reused within one credential")]
    DuplicateSalt,

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("credential expired")]
    CredentialExpired,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Capability(#[from] CoreError),
}

impl From<serde_json::Error> for SdError {
    fn from(e: serde_json::Error) -> Self {
        SdError::Encoding(e.to_string())
    }
}

pub type SdResult<T> = Result<T, SdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_passes_through() {
        let err: SdError = CoreError::Backend("hsm unreachable".into()).into();
        assert_eq!(err.to_string(), "backend error: hsm unreachable");
        assert_eq!(err, SdError::Capability(CoreError::Backend("hsm unreachable".into())));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SdError::UnknownField("address.zip".into()).to_string(),
            "unknown field in disclosure frame: address.zip"
        );
        assert_eq!(SdError::SignatureInvalid.to_string(), "issuer signature is invalid");
    }

    #[test]
    fn test_all_error_variants_display() {
        let variants = vec![
            SdError::UnknownField("a".into()),
            SdError::FrameShape("a".into()),
            SdError::ReservedClaimName("_sd".into()),
            SdError::NotDisclosable("a".into()),
            SdError::SignatureInvalid,
            SdError::DigestMismatch("a".into()),
            SdError::DuplicateDigest("a".into()),
            SdError::DuplicateSalt,
            SdError::UnsupportedAlgorithm("md5".into()),
            SdError::MalformedPayload("a".into()),
            SdError::CredentialExpired,
            SdError::Decode("a".into()),
            SdError::Encoding("a".into()),
        ];
        for v in variants {
            assert!(!v.to_string().is_empty(), "Display for {:?} should not be empty", v);
        }
    }
}
