//! Selective-disclosure credentials (SD-JWT VC).
//!
//! An issuer commits to a claim tree through salted digests. A disclosure
//! frame decides which fields are hidden; each hidden field becomes a
//! disclosure whose digest sits in the signed payload. A holder forwards a
//! subset of those disclosures, and a verifier recomputes the digests and
//! rebuilds only what it was given.
//!
//! Signing, hashing and salt generation are injected through the
//! `sdvc_core` capability traits. This crate never holds key material.

pub mod claims;
pub mod disclosure;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod issuance;
pub mod presentation;
pub mod resolver;
pub mod sdjwt;
pub mod types;
pub mod verify;

// Re-export primary types and functions for convenience
pub use claims::{Claim, ClaimTree, Scalar};
pub use disclosure::Disclosure;
pub use encoder::{encode_claims, Redacted};
pub use error::{SdError, SdResult};
pub use frame::Frame;
pub use issuance::Issuer;
pub use presentation::{present, presentable_keys};
pub use resolver::{resolve, Action, FieldKey, Resolved};
pub use sdjwt::{Credential, Presentation, SdJwt};
pub use types::*;
pub use verify::SdVerifier;
