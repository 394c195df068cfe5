//! JSON Web Keys for the Curve25519 family
//!
//! Only octet key pairs (`kty = "OKP"`, RFC 8037) with `crv` `Ed25519` or
//! `X25519` map onto [`PublicKey`]. Other key types still deserialize, so a
//! set fetched from elsewhere can be inspected, but converting them fails with
//! [`JwkError::UnsupportedKeyType`].

use std::collections::BTreeMap;

use anyhow::anyhow;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::keys::{KeyAlgorithm, KeyError, PublicKey};

/// Key type for octet key pairs
pub const OKP_KEY_TYPE: &str = "OKP";

#[derive(Debug, thiserror::Error)]
pub enum JwkError {
    #[error("jwk error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("invalid JWK JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported key type {kty} (crv {crv:?})")]
    UnsupportedKeyType { kty: String, crv: Option<String> },
    #[error("missing JWK member: {0}")]
    MissingMember(&'static str),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// A JWK set document: `{"keys": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn from_json(json: &str) -> Result<Self, JwkError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, JwkError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Find a key by its `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Convert every supported key, skipping the rest
    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.keys
            .iter()
            .filter_map(|jwk| match jwk.to_public_key() {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::debug!("skipping JWK {:?}: {}", jwk.kid, e);
                    None
                }
            })
            .collect()
    }
}

/// A single JSON Web Key
///
/// Members other than `kty`, `kid`, `crv` and `x` are kept in `extra` and
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Jwk {
    /// Build an OKP JWK for a public key
    ///
    /// When `kid` is `None` the RFC 7638 thumbprint is used.
    pub fn from_public_key(key: &PublicKey, kid: Option<String>) -> Result<Self, JwkError> {
        let kid = match kid {
            Some(kid) => kid,
            None => thumbprint_of(key)?,
        };
        Ok(Self {
            kty: OKP_KEY_TYPE.to_string(),
            kid: Some(kid),
            crv: Some(key.algorithm().name().to_string()),
            x: Some(URL_SAFE_NO_PAD.encode(key.as_bytes())),
            extra: BTreeMap::new(),
        })
    }

    pub fn to_public_key(&self) -> Result<PublicKey, JwkError> {
        let algorithm = self.algorithm()?;
        let x = self.x.as_deref().ok_or(JwkError::MissingMember("x"))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(x)
            .map_err(|e| anyhow!("invalid base64url in \"x\": {}", e))?;
        Ok(PublicKey::from_bytes(algorithm, &bytes)?)
    }

    /// RFC 7638 SHA-256 thumbprint, base64url encoded
    pub fn thumbprint(&self) -> Result<String, JwkError> {
        thumbprint_of(&self.to_public_key()?)
    }

    fn algorithm(&self) -> Result<KeyAlgorithm, JwkError> {
        let unsupported = || JwkError::UnsupportedKeyType {
            kty: self.kty.clone(),
            crv: self.crv.clone(),
        };
        if self.kty != OKP_KEY_TYPE {
            return Err(unsupported());
        }
        let crv = self.crv.as_deref().ok_or(JwkError::MissingMember("crv"))?;
        KeyAlgorithm::from_name(crv).ok_or_else(unsupported)
    }
}

// required OKP members only; BTreeMap keeps them in lexicographic order
fn thumbprint_of(key: &PublicKey) -> Result<String, JwkError> {
    let members = BTreeMap::from([
        ("crv", key.algorithm().name().to_string()),
        ("kty", OKP_KEY_TYPE.to_string()),
        ("x", URL_SAFE_NO_PAD.encode(key.as_bytes())),
    ]);
    let canonical = serde_json::to_string(&members)?;
    Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes())))
}
