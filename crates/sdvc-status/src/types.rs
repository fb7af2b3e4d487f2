use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StatusResult;
use crate::list::{BitsPerStatus, StatusList};

// ---------------------------------------------------------------------------
// StatusType: conventional meaning of a status value
//
// Interpretation only; the codec stores any value that fits the width.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusType {
    /// 0: issued and in good standing.
    Valid,
    /// 1: temporarily suspended (lists of 2+ bits).
    Suspended,
    /// 2: permanently revoked. A 1-bit list uses 1 for this.
    Revoked,
    /// `2^B - 1`: slot not yet handed out (lists of 2+ bits).
    Unallocated,
    /// Any other application-specific value.
    Other(u8),
}

impl StatusType {
    pub fn from_value(value: u8, bits: BitsPerStatus) -> Self {
        match (bits, value) {
            (_, 0) => Self::Valid,
            (BitsPerStatus::One, _) => Self::Revoked,
            (_, v) if v == bits.max_value() => Self::Unallocated,
            (_, 1) => Self::Suspended,
            (_, 2) => Self::Revoked,
            (_, v) => Self::Other(v),
        }
    }

    /// The value this status is stored as in a list of the given width.
    pub fn to_value(self, bits: BitsPerStatus) -> u8 {
        match (self, bits) {
            (Self::Valid, _) => 0,
            (Self::Revoked, BitsPerStatus::One) => 1,
            (Self::Suspended, _) => 1,
            (Self::Revoked, _) => 2,
            (Self::Unallocated, b) => b.max_value(),
            (Self::Other(v), _) => v,
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusType::Valid => write!(f, "valid"),
            StatusType::Suspended => write!(f, "suspended"),
            StatusType::Revoked => write!(f, "revoked"),
            StatusType::Unallocated => write!(f, "unallocated"),
            StatusType::Other(v) => write!(f, "other({})", v),
        }
    }
}

// ---------------------------------------------------------------------------
// Credential-side reference: {"status": {"status_list": {"idx": 0, "uri": ".."}}}
// ---------------------------------------------------------------------------

/// A credential's slot in some status list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusListEntry {
    pub idx: usize,
    pub uri: String,
}

impl StatusListEntry {
    pub fn new(idx: usize, uri: impl Into<String>) -> Self {
        Self {
            idx,
            uri: uri.into(),
        }
    }

    /// Look this entry up in an already-fetched list.
    pub fn resolve(&self, list: &StatusList) -> StatusResult<StatusType> {
        let value = list.get(self.idx)?;
        Ok(StatusType::from_value(value, list.bits()))
    }
}

/// The `status` claim value placed in a credential payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReference {
    pub status_list: StatusListEntry,
}

// ---------------------------------------------------------------------------
// List-side embedding: {"bits": 2, "lst": "<encoded>"}
// ---------------------------------------------------------------------------

/// A status list as carried inside its own (signed) credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusListClaim {
    pub bits: BitsPerStatus,
    pub lst: String,
}

impl StatusListClaim {
    pub fn from_list(list: &StatusList) -> StatusResult<Self> {
        Ok(Self {
            bits: list.bits(),
            lst: list.encode()?,
        })
    }

    pub fn to_list(&self) -> StatusResult<StatusList> {
        StatusList::decode(&self.lst, self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_bit_conventions() {
        let b = BitsPerStatus::Two;
        assert_eq!(StatusType::from_value(0, b), StatusType::Valid);
        assert_eq!(StatusType::from_value(1, b), StatusType::Suspended);
        assert_eq!(StatusType::from_value(2, b), StatusType::Revoked);
        assert_eq!(StatusType::from_value(3, b), StatusType::Unallocated);
    }

    #[test]
    fn test_one_bit_conventions() {
        let b = BitsPerStatus::One;
        assert_eq!(StatusType::from_value(0, b), StatusType::Valid);
        assert_eq!(StatusType::from_value(1, b), StatusType::Revoked);
        assert_eq!(StatusType::Revoked.to_value(b), 1);
    }

    #[test]
    fn test_wide_list_other_values() {
        let b = BitsPerStatus::Eight;
        assert_eq!(StatusType::from_value(7, b), StatusType::Other(7));
        assert_eq!(StatusType::from_value(255, b), StatusType::Unallocated);
        assert_eq!(StatusType::Unallocated.to_value(b), 255);
    }

    #[test]
    fn test_to_value_inverts_from_value() {
        for bits in [BitsPerStatus::Two, BitsPerStatus::Four, BitsPerStatus::Eight] {
            for v in 0..=bits.max_value() {
                assert_eq!(StatusType::from_value(v, bits).to_value(bits), v);
            }
        }
    }

    #[test]
    fn test_status_reference_json_shape() {
        let status = StatusReference {
            status_list: StatusListEntry::new(7, "https://example.com/status/1"),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status_list": {"idx": 7, "uri": "https://example.com/status/1"}})
        );
    }

    #[test]
    fn test_entry_resolve() {
        let mut list = StatusList::filled(10, BitsPerStatus::Two, 0).unwrap();
        list.set(3, 2).unwrap();
        let entry = StatusListEntry::new(3, "https://example.com/status/1");
        assert_eq!(entry.resolve(&list).unwrap(), StatusType::Revoked);
        assert!(StatusListEntry::new(10, "x").resolve(&list).is_err());
    }

    #[test]
    fn test_status_list_claim_round_trip() {
        let mut list = StatusList::filled(16, BitsPerStatus::One, 0).unwrap();
        list.set(5, 1).unwrap();
        let claim = StatusListClaim::from_list(&list).unwrap();
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["bits"], 1);
        let back: StatusListClaim = serde_json::from_value(json).unwrap();
        assert_eq!(back.to_list().unwrap(), list);
    }
}
