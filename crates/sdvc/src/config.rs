use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sdvc_core::{Sha2Hasher, MIN_SALT_BYTES};
use sdvc_status::BitsPerStatus;

use crate::error::{RootError, RootResult};

/// Issuer-side settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Issuer identifier written as `iss`. Derived from the signing key when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,

    /// Credential type written as `vct`.
    #[serde(default = "default_vct")]
    pub vct: String,

    /// Digest algorithm for disclosures (`sha-256`, `sha-384`, `sha-512`).
    #[serde(default = "default_hash_alg")]
    pub hash_alg: String,

    /// Random bytes per disclosure salt.
    #[serde(default = "default_salt_bytes")]
    pub salt_bytes: usize,

    /// Hex-encoded 32-byte Ed25519 seed. A fresh key is generated per run
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_seed: Option<String>,
}

fn default_vct() -> String {
    "IdentityCredential".to_string()
}

fn default_hash_alg() -> String {
    "sha-256".to_string()
}

fn default_salt_bytes() -> usize {
    MIN_SALT_BYTES
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            issuer_id: None,
            vct: default_vct(),
            hash_alg: default_hash_alg(),
            salt_bytes: default_salt_bytes(),
            signing_key_seed: None,
        }
    }
}

/// Status list settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_bits")]
    pub bits: u8,

    /// Number of slots in a freshly created list.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Location credentials use to reference the list.
    #[serde(default = "default_uri")]
    pub uri: String,
}

fn default_bits() -> u8 {
    2
}

fn default_size() -> usize {
    1024
}

fn default_uri() -> String {
    "https://example.com/statuslists/1".to_string()
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            bits: default_bits(),
            size: default_size(),
            uri: default_uri(),
        }
    }
}

/// Top-level configuration for the `sdvc` binary.
///
/// Loaded from a TOML file (typically `~/.sdvc/config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub issuer: IssuerConfig,

    #[serde(default)]
    pub status: StatusConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(RootError::Io)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RootError::Io)?;
        }
        std::fs::write(path, contents).map_err(RootError::Io)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RootResult<()> {
        self.hasher()?;
        self.bits()?;
        if self.status.size == 0 {
            return Err(RootError::Config("status.size must be > 0".into()));
        }
        if self.issuer.salt_bytes < MIN_SALT_BYTES {
            return Err(RootError::Config(format!(
                "issuer.salt_bytes must be at least {}, got {}",
                MIN_SALT_BYTES, self.issuer.salt_bytes
            )));
        }
        if self.issuer.vct.trim().is_empty() {
            return Err(RootError::Config("issuer.vct must not be empty".into()));
        }
        Ok(())
    }

    pub fn hasher(&self) -> RootResult<Sha2Hasher> {
        Sha2Hasher::from_name(&self.issuer.hash_alg).map_err(|_| {
            RootError::Config(format!(
                "issuer.hash_alg must be sha-256, sha-384 or sha-512, got '{}'",
                self.issuer.hash_alg
            ))
        })
    }

    pub fn bits(&self) -> RootResult<BitsPerStatus> {
        BitsPerStatus::try_from(self.status.bits).map_err(|_| {
            RootError::Config(format!(
                "status.bits must be 1, 2, 4 or 8, got {}",
                self.status.bits
            ))
        })
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".sdvc/config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RootConfig::default();
        assert_eq!(config.issuer.hash_alg, "sha-256");
        assert_eq!(config.issuer.salt_bytes, 16);
        assert_eq!(config.issuer.issuer_id, None);
        assert_eq!(config.status.bits, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        assert!(RootConfig::default_config_path()
            .to_str()
            .unwrap()
            .ends_with(".sdvc/config.toml"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[issuer]
issuer_id = "did:example:issuer"
vct = "EmployeeBadge"
hash_alg = "sha-384"

[status]
bits = 1
size = 64
"#;
        let config: RootConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.issuer.issuer_id.as_deref(), Some("did:example:issuer"));
        assert_eq!(config.issuer.vct, "EmployeeBadge");
        assert_eq!(config.hasher().unwrap(), Sha2Hasher::Sha384);
        assert_eq!(config.issuer.salt_bytes, 16);
        assert_eq!(config.bits().unwrap(), BitsPerStatus::One);
        assert_eq!(config.status.size, 64);
        assert_eq!(config.status.uri, default_uri());
    }

    #[test]
    fn test_config_validate_bad_hash_alg() {
        let mut config = RootConfig::default();
        config.issuer.hash_alg = "md5".into();
        assert!(matches!(config.validate(), Err(RootError::Config(_))));
    }

    #[test]
    fn test_config_validate_bad_bits() {
        let mut config = RootConfig::default();
        config.status.bits = 3;
        assert!(matches!(config.validate(), Err(RootError::Config(_))));
    }

    #[test]
    fn test_config_validate_zero_size() {
        let mut config = RootConfig::default();
        config.status.size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_short_salt() {
        let mut config = RootConfig::default();
        config.issuer.salt_bytes = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_empty_vct() {
        let mut config = RootConfig::default();
        config.issuer.vct = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = RootConfig::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, RootConfig::default());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sdvc-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_config_load_rejects_invalid_values() {
        let dir = scratch_dir("invalid-config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[status]\nbits = 5\n").unwrap();
        assert!(matches!(RootConfig::load(&path), Err(RootError::Config(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = scratch_dir("save-load");
        let path = dir.join("nested").join("config.toml");

        let config = RootConfig {
            issuer: IssuerConfig {
                issuer_id: Some("did:example:acme".into()),
                signing_key_seed: Some("11".repeat(32)),
                ..IssuerConfig::default()
            },
            status: StatusConfig {
                bits: 4,
                size: 100,
                uri: "https://acme.test/status".into(),
            },
        };

        config.save(&path).unwrap();
        let loaded = RootConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
