use thiserror::Error;

/// Error type for the `sdvc` binary, aggregating the library crates'
/// errors.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("capability error: {0}")]
    Core(#[from] sdvc_core::CoreError),

    #[error("disclosure error: {0}")]
    Disclosure(#[from] sdvc_disclosure::SdError),

    #[error("status list error: {0}")]
    Status(#[from] sdvc_status::StatusError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
