//! Compact credential status lists.
//!
//! A status list is a fixed-capacity array of small integers (1, 2, 4 or 8
//! bits each) packed into the smallest byte buffer that holds them. Credentials
//! reference a slot by index plus the list's location; the list itself knows
//! nothing about which credentials point at it.
//!
//! For transport the packed bytes are zlib-compressed and base64url-encoded
//! without padding.

pub mod encoding;
pub mod error;
pub mod list;
pub mod shared;
pub mod types;

pub use error::{StatusError, StatusResult};
pub use list::{BitsPerStatus, StatusList};
pub use shared::SharedStatusList;
pub use types::{StatusListClaim, StatusListEntry, StatusReference, StatusType};
