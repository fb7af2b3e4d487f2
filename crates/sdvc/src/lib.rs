//! sdvc root library.
//!
//! Ties the capability layer, the disclosure protocol and the status list
//! codec together behind a TOML configuration. The binary is a thin CLI over
//! the functions here.
//!
//! # Demo flow
//!
//! `run_demo` plays all three roles in one process: the issuer signs a
//! credential hiding three of four claims and allocates it a status slot,
//! the holder presents two of the hidden claims, and the verifier checks
//! the presentation and looks the slot up in the (itself signed) status
//! list.

pub mod config;
pub mod error;

pub use config::{IssuerConfig, RootConfig, StatusConfig};
pub use error::{RootError, RootResult};

use serde_json::Value;
use tracing::{debug, info};
use zeroize::Zeroizing;

use sdvc_core::{Ed25519Signer, RandomSaltGenerator, Sha2Hasher};
use sdvc_disclosure::{
    present, presentable_keys, ClaimTree, Frame, IssuerMetadata, Issuer, SdJwt, SdVerifier,
};
use sdvc_status::{BitsPerStatus, SharedStatusList, StatusList, StatusListClaim, StatusListEntry, StatusType};

/// Credential type of the signed status list credential.
pub const STATUS_LIST_VCT: &str = "status-list";

/// Claim under which a status list credential carries its list.
pub const STATUS_LIST_CLAIM: &str = "status_list";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Build the issuer signer from the configured seed, or a fresh key when
/// none is configured.
pub fn signer_from_config(config: &RootConfig) -> RootResult<Ed25519Signer> {
    let Some(seed_hex) = &config.issuer.signing_key_seed else {
        debug!("no signing key seed configured, generating an ephemeral key");
        return Ok(Ed25519Signer::generate());
    };

    let bytes = Zeroizing::new(
        hex::decode(seed_hex.trim())
            .map_err(|e| RootError::Config(format!("signing_key_seed is not hex: {}", e)))?,
    );
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        RootError::Config(format!(
            "signing_key_seed must be 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Ed25519Signer::from_seed(seed))
}

/// Configured issuer id, or the one derived from the signer's public key.
pub fn issuer_id(config: &RootConfig, signer: &Ed25519Signer) -> String {
    config
        .issuer
        .issuer_id
        .clone()
        .unwrap_or_else(|| signer.issuer_id().to_string())
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

/// Everything the demo produced, in wire form where there is one.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub issuer: String,
    pub credential: String,
    pub presentable_keys: Vec<String>,
    pub validated: bool,
    pub presentation: String,
    pub disclosed_claims: Value,
    pub status_list_credential: String,
    pub status: StatusType,
}

/// Claims used by the demo.
pub fn demo_claims() -> ClaimTree {
    ClaimTree::new()
        .with("firstname", "John")
        .with("lastname", "Doe")
        .with("ssn", "123-45-6789")
        .with("id", "1234")
}

/// Issue, validate, present and verify one credential, with a status list
/// credential alongside.
pub async fn run_demo(config: &RootConfig) -> RootResult<DemoReport> {
    config.validate()?;
    let hasher = config.hasher()?;
    let bits = config.bits()?;

    let signer = signer_from_config(config)?;
    let verifier = SdVerifier::new(signer.verifier(), hasher);
    let iss = issuer_id(config, &signer);
    let issuer = Issuer::new(signer, hasher, RandomSaltGenerator::new(config.issuer.salt_bytes)?);

    // Slot 0 goes to the demo credential; the rest stay unallocated
    let statuses = SharedStatusList::new(StatusList::filled(
        config.status.size,
        bits,
        StatusType::Unallocated.to_value(bits),
    )?);
    let slot = 0;
    statuses.set(slot, StatusType::Valid.to_value(bits))?;
    let entry = StatusListEntry::new(slot, config.status.uri.clone());

    // Issuer
    let frame = Frame::new().hide("firstname").hide("lastname").hide("ssn");
    let metadata = IssuerMetadata::new(iss.clone(), config.issuer.vct.clone()).with_status(entry);
    let credential = issuer.issue(&demo_claims(), &frame, &metadata).await?;
    let validated = verifier.validate(&credential).await.map(|_| true)?;
    info!(validated, "demo credential issued");

    // Holder
    let holder_copy = SdJwt::decode(&credential.encode(), &hasher)?;
    let keys = presentable_keys(&holder_copy);
    let presentation = present(&holder_copy, &Frame::new().hide("firstname").hide("ssn"))?;

    // Verifier
    let received = SdJwt::decode(&presentation.encode(), &hasher)?;
    let result = verifier.verify(&received).await?;

    let list_credential = issue_status_list(&issuer, &iss, &statuses.snapshot()?).await?;
    let status = check_status(&verifier, &list_credential, &hasher, &result).await?;
    info!(%status, "demo presentation verified");

    Ok(DemoReport {
        issuer: iss,
        credential: credential.encode(),
        presentable_keys: keys,
        validated,
        presentation: presentation.encode(),
        disclosed_claims: result.disclosed_claims.to_json(),
        status_list_credential: list_credential,
        status,
    })
}

/// Sign a status list as its own credential. Nothing in it is hidden.
async fn issue_status_list(
    issuer: &Issuer<Ed25519Signer, Sha2Hasher, RandomSaltGenerator>,
    iss: &str,
    list: &StatusList,
) -> RootResult<String> {
    let claim = StatusListClaim::from_list(list)?;
    let claims = ClaimTree::new().with(STATUS_LIST_CLAIM, serde_json::to_value(&claim)?);
    let credential = issuer
        .issue(&claims, &Frame::new(), &IssuerMetadata::new(iss, STATUS_LIST_VCT))
        .await?;
    debug!(entries = list.len(), "status list credential issued");
    Ok(credential.encode())
}

/// Verify the status list credential and look up the presented
/// credential's slot in it.
async fn check_status(
    verifier: &SdVerifier<sdvc_core::Ed25519Verifier, Sha2Hasher>,
    list_credential: &str,
    hasher: &Sha2Hasher,
    presented: &sdvc_disclosure::VerificationResult,
) -> RootResult<StatusType> {
    let Some(entry) = presented.status() else {
        return Err(RootError::InvalidArgument(
            "presentation carries no status reference".into(),
        ));
    };
    let list_result = verifier.verify(&SdJwt::decode(list_credential, hasher)?).await?;
    let claim = list_result
        .disclosed_claims
        .get(STATUS_LIST_CLAIM)
        .ok_or_else(|| RootError::InvalidArgument("status list credential has no list".into()))?;
    let claim: StatusListClaim = serde_json::from_value(claim.to_json())?;
    Ok(entry.resolve(&claim.to_list()?)?)
}

// ---------------------------------------------------------------------------
// Status list commands
// ---------------------------------------------------------------------------

/// Parse an `INDEX=VALUE` assignment.
pub fn parse_assignment(s: &str) -> RootResult<(usize, u8)> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| RootError::InvalidArgument(format!("expected INDEX=VALUE, got '{}'", s)))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| RootError::InvalidArgument(format!("bad index in '{}'", s)))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| RootError::InvalidArgument(format!("bad value in '{}'", s)))?;
    Ok((index, value))
}

/// Build a list of `size` entries filled with `fill`, apply `assignments`
/// and return its transport encoding.
pub fn new_status_list(
    size: usize,
    bits: BitsPerStatus,
    fill: u8,
    assignments: &[(usize, u8)],
) -> RootResult<String> {
    let mut list = StatusList::filled(size, bits, fill)?;
    for (index, value) in assignments {
        list.set(*index, *value)?;
    }
    Ok(list.encode()?)
}

/// Read one entry from an encoded list.
pub fn read_status(encoded: &str, bits: BitsPerStatus, index: usize) -> RootResult<(u8, StatusType)> {
    let list = StatusList::decode(encoded, bits)?;
    let value = list.get(index)?;
    Ok((value, StatusType::from_value(value, bits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded_config() -> RootConfig {
        let mut config = RootConfig::default();
        config.issuer.signing_key_seed = Some("2a".repeat(32));
        config.status.size = 16;
        config
    }

    #[test]
    fn test_signer_from_seed_is_stable() {
        let config = seeded_config();
        let a = signer_from_config(&config).unwrap();
        let b = signer_from_config(&config).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(issuer_id(&config, &a), a.issuer_id().to_string());
    }

    #[test]
    fn test_signer_rejects_bad_seed() {
        let mut config = RootConfig::default();
        config.issuer.signing_key_seed = Some("zz".into());
        assert!(matches!(signer_from_config(&config), Err(RootError::Config(_))));
        config.issuer.signing_key_seed = Some("00".repeat(16));
        assert!(matches!(signer_from_config(&config), Err(RootError::Config(_))));
    }

    #[test]
    fn test_configured_issuer_id_wins() {
        let mut config = seeded_config();
        config.issuer.issuer_id = Some("did:example:acme".into());
        let signer = signer_from_config(&config).unwrap();
        assert_eq!(issuer_id(&config, &signer), "did:example:acme");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("3=2").unwrap(), (3, 2));
        assert_eq!(parse_assignment(" 10 = 1 ").unwrap(), (10, 1));
        assert!(parse_assignment("3").is_err());
        assert!(parse_assignment("x=1").is_err());
        assert!(parse_assignment("1=300").is_err());
    }

    #[test]
    fn test_status_commands() {
        let encoded = new_status_list(10, BitsPerStatus::Two, 3, &[(1, 0), (2, 2)]).unwrap();
        assert_eq!(read_status(&encoded, BitsPerStatus::Two, 0).unwrap(), (3, StatusType::Unallocated));
        assert_eq!(read_status(&encoded, BitsPerStatus::Two, 1).unwrap(), (0, StatusType::Valid));
        assert_eq!(read_status(&encoded, BitsPerStatus::Two, 2).unwrap(), (2, StatusType::Revoked));
        assert!(matches!(
            new_status_list(10, BitsPerStatus::Two, 3, &[(10, 0)]),
            Err(RootError::Status(_))
        ));
    }

    #[tokio::test]
    async fn test_run_demo() {
        let report = run_demo(&seeded_config()).await.unwrap();
        assert!(report.validated);
        assert_eq!(
            report.disclosed_claims,
            json!({"firstname": "John", "ssn": "123-45-6789", "id": "1234"})
        );
        assert_eq!(report.presentable_keys, vec!["firstname", "lastname", "ssn"]);
        assert_eq!(report.status, StatusType::Valid);
        assert_eq!(report.presentation.matches('~').count(), 3);
    }
}
