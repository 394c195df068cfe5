use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::{
    AgreementError, DerivationContext, KeyError, PrivateKey, PublicKey, DEFAULT_SHARED_INFO,
};

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration file
///
/// ```toml
/// [agreement]
/// info = "example-message-encryption"
/// salt = ""
///
/// [keys]
/// private_key = "key.pem"
/// peer_public_key = "peer.pub.pem"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agreement: AgreementConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

/// The agreed derivation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementConfig {
    /// HKDF info string, must not be empty
    #[serde(default = "default_info")]
    pub info: String,
    /// HKDF salt as UTF-8 text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// HKDF salt as hex, for salts that are not text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_hex: Option<String>,
}

fn default_info() -> String {
    String::from_utf8_lossy(DEFAULT_SHARED_INFO).into_owned()
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            info: default_info(),
            salt: None,
            salt_hex: None,
        }
    }
}

impl AgreementConfig {
    /// Resolve the configured salt and info into a [`DerivationContext`]
    pub fn context(&self) -> Result<DerivationContext, ConfigError> {
        let salt = match (&self.salt, &self.salt_hex) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidNonceOrSalt(
                    "only one of salt and salt_hex may be set".to_string(),
                ))
            }
            (Some(text), None) => text.as_bytes().to_vec(),
            (None, Some(hex_salt)) => hex::decode(hex_salt)
                .map_err(|e| ConfigError::InvalidNonceOrSalt(format!("salt_hex: {}", e)))?,
            (None, None) => Vec::new(),
        };
        if self.info.is_empty() {
            return Err(ConfigError::InvalidNonceOrSalt(
                "info must not be empty".to_string(),
            ));
        }
        Ok(DerivationContext::new(salt, self.info.as_bytes())?)
    }
}

/// Locations of PEM key files
///
/// Relative paths are resolved against the directory of the config file when
/// loaded with [`Config::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_public_key: Option<PathBuf>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;

        if let Some(dir) = path.parent() {
            config.keys.private_key = config.keys.private_key.map(|p| dir.join(p));
            config.keys.peer_public_key = config.keys.peer_public_key.map(|p| dir.join(p));
        }
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Read the configured private key from its PEM file
    pub fn load_private_key(&self) -> Result<PrivateKey, ConfigError> {
        let path = self
            .keys
            .private_key
            .as_ref()
            .ok_or(ConfigError::MissingKeyPath("private_key"))?;
        let pem = fs::read_to_string(path)?;
        Ok(PrivateKey::from_pem(&pem)?)
    }

    /// Read the configured peer public key from its PEM file
    pub fn load_peer_public_key(&self) -> Result<PublicKey, ConfigError> {
        let path = self
            .keys
            .peer_public_key
            .as_ref()
            .ok_or(ConfigError::MissingKeyPath("peer_public_key"))?;
        let pem = fs::read_to_string(path)?;
        Ok(PublicKey::from_pem(&pem)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid derivation parameters: {0}")]
    InvalidNonceOrSalt(String),

    #[error("derivation context error: {0}")]
    Agreement(#[from] AgreementError),

    #[error("no {0} path configured")]
    MissingKeyPath(&'static str),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
