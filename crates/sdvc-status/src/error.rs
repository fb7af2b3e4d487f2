use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StatusError {
    #[error("status list capacity must be greater than zero")]
    Capacity,

    #[error("index {index} out of range for status list of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u8, bits: u8 },

    #[error("unsupported bits per status: {0}")]
    UnsupportedBits(u8),

    #[error("status list decode failed: {0}")]
    Decode(String),

    #[error("status list encode failed: {0}")]
    Encode(String),

    #[error("status list lock poisoned")]
    LockPoisoned,
}

pub type StatusResult<T> = Result<T, StatusError>;
