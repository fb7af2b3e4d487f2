//! Capability layer for selective-disclosure credentials.
//!
//! The protocol crates never touch key material or hash implementations
//! directly. They are handed a `Signer`, `Verifier`, `Hasher` and
//! `SaltGenerator` at construction and call through these traits only.
//! This crate also ships the stock implementations used by the binary and
//! the tests: Ed25519 (ed25519-dalek), the SHA-2 family and an OS-random
//! salt source.

pub mod crypto;
pub mod error;
pub mod signer;
pub mod traits;
pub mod types;

pub use crypto::*;
pub use error::*;
pub use signer::{Ed25519Signer, Ed25519Verifier};
pub use traits::*;
pub use types::*;
