//! KDC configuration consumed by the pre-authentication core.
//!
//! The configuration is loaded once, validated, then shared read-only as `Arc<KdcConfig>`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pre-authentication settings of the KDC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdcConfig {
    /// Realm served by this KDC.
    pub realm: String,

    /// Whether the token pre-authentication mechanism may be used at all.
    pub allow_token_preauth: bool,

    /// Issuers whose tokens are accepted, compared exactly against the token vendor.
    pub trusted_issuers: Vec<String>,

    /// Directory scanned for `*<issuer>*` public key files.
    pub verify_key_directory: Option<PathBuf>,

    /// Explicit issuer to public key file mapping, consulted before the directory scan.
    pub verify_key_files: BTreeMap<String, PathBuf>,

    /// Upper bound for the verification key lookup, in milliseconds.
    pub key_scan_timeout_ms: u64,

    /// Leeway applied to token `exp` and `nbf` validation, in seconds.
    pub token_leeway_secs: u64,

    /// Maximum difference between the client and KDC clocks, in seconds.
    pub allowable_clock_skew_secs: u64,
}

impl Default for KdcConfig {
    fn default() -> Self {
        Self {
            realm: "EXAMPLE.COM".to_owned(),
            allow_token_preauth: true,
            trusted_issuers: Vec::new(),
            verify_key_directory: None,
            verify_key_files: BTreeMap::new(),
            key_scan_timeout_ms: 2000,
            token_leeway_secs: 60,
            allowable_clock_skew_secs: 300,
        }
    }
}

impl KdcConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Checks the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// - an issuer name is empty (it would match every key file during the scan)
    /// - the key scan timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trusted_issuers.iter().any(|issuer| issuer.trim().is_empty()) {
            return Err(ConfigError::Validation("trusted_issuers contains an empty issuer".to_owned()));
        }

        if self.verify_key_files.keys().any(|issuer| issuer.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "verify_key_files contains an empty issuer".to_owned(),
            ));
        }

        if self.key_scan_timeout_ms == 0 {
            return Err(ConfigError::Validation("key_scan_timeout_ms must be positive".to_owned()));
        }

        Ok(())
    }

    pub fn allow_token_preauth(&self) -> bool {
        self.allow_token_preauth
    }

    pub fn trusted_issuers(&self) -> &[String] {
        &self.trusted_issuers
    }

    pub fn is_trusted_issuer(&self, issuer: &str) -> bool {
        self.trusted_issuers.iter().any(|trusted| trusted == issuer)
    }

    pub fn verify_key_directory(&self) -> Option<&Path> {
        self.verify_key_directory.as_deref()
    }

    pub fn verify_key_file(&self, issuer: &str) -> Option<&Path> {
        self.verify_key_files.get(issuer).map(PathBuf::as_path)
    }

    pub fn key_scan_timeout(&self) -> Duration {
        Duration::from_millis(self.key_scan_timeout_ms)
    }

    pub fn token_leeway(&self) -> Duration {
        Duration::from_secs(self.token_leeway_secs)
    }

    pub fn allowable_clock_skew(&self) -> Duration {
        Duration::from_secs(self.allowable_clock_skew_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[source] std::io::Error),
    #[error("failed to parse configuration")]
    Parse(#[source] toml::de::Error),
    #[error("failed to serialize configuration")]
    Serialize(#[source] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}
