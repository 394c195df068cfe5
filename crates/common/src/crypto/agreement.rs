//! X25519 key agreement and session key derivation
//!
//! Two parties holding X25519 keys derive the same [`SessionKey`]:
//!
//! 1. **ECDH**: `shared = X25519(local_private, remote_public)`
//! 2. **Extract**: `prk = HKDF-SHA256-Extract(salt, shared)`
//! 3. **Expand**: `key = HKDF-SHA256-Expand(prk, info, 32)`
//!
//! `salt` and `info` are agreed out of band (see [`DerivationContext`]); they
//! are never transmitted or negotiated. Distinct `info` strings give unrelated
//! keys for the same pair of parties.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use super::keys::{KeyAlgorithm, PrivateKey, PublicKey};
use super::secret::{SessionKey, SESSION_KEY_SIZE};

/// Info string used when callers have not agreed on their own
pub const DEFAULT_SHARED_INFO: &[u8] = b"curvebox-message-encryption";

#[derive(Debug, thiserror::Error)]
pub enum AgreementError {
    /// The peer's point is low-order or otherwise yields an all-zero secret
    #[error("peer public key produced a non-contributory shared secret")]
    InvalidPeerKey,
    #[error("key agreement requires X25519 keys, got {local} and {remote}")]
    UnsupportedKeyType {
        local: KeyAlgorithm,
        remote: KeyAlgorithm,
    },
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("invalid derivation context: {0}")]
    InvalidContext(String),
}

/// Derive a session key from our private key and the peer's public key
///
/// An empty `salt` behaves exactly like HKDF without a salt.
///
/// # Errors
///
/// - [`AgreementError::UnsupportedKeyType`] unless both keys are X25519
/// - [`AgreementError::InvalidPeerKey`] if the peer key is a low-order point
pub fn derive_session_key(
    local_private: &PrivateKey,
    remote_public: &PublicKey,
    salt: &[u8],
    info: &[u8],
) -> Result<SessionKey, AgreementError> {
    let (scalar, point) = match (local_private, remote_public) {
        (PrivateKey::X25519(scalar), PublicKey::X25519(point)) => (scalar, point),
        _ => {
            return Err(AgreementError::UnsupportedKeyType {
                local: local_private.algorithm(),
                remote: remote_public.algorithm(),
            })
        }
    };

    let secret = StaticSecret::from(*scalar);
    let shared = secret.diffie_hellman(&X25519PublicKey::from(*point));
    if !shared.was_contributory() {
        tracing::debug!("rejected non-contributory X25519 peer key");
        return Err(AgreementError::InvalidPeerKey);
    }

    let salt = if salt.is_empty() { None } else { Some(salt) };
    let hkdf = Hkdf::<Sha256>::new(salt, shared.as_bytes());
    let mut okm = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
    hkdf.expand(info, &mut okm[..])
        .map_err(|e| AgreementError::Derivation(e.to_string()))?;

    tracing::trace!(
        "derived session key (salt {} bytes, info {} bytes)",
        salt.map_or(0, <[u8]>::len),
        info.len()
    );
    Ok(SessionKey::from(*okm))
}

/// The (salt, info) pair two parties agreed on for deriving session keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationContext {
    salt: Vec<u8>,
    info: Vec<u8>,
}

impl Default for DerivationContext {
    fn default() -> Self {
        Self {
            salt: Vec::new(),
            info: DEFAULT_SHARED_INFO.to_vec(),
        }
    }
}

impl DerivationContext {
    /// Build a context; `info` must be non-empty, `salt` may be empty
    pub fn new(salt: impl Into<Vec<u8>>, info: impl Into<Vec<u8>>) -> Result<Self, AgreementError> {
        let info = info.into();
        if info.is_empty() {
            return Err(AgreementError::InvalidContext(
                "info must not be empty".to_string(),
            ));
        }
        Ok(Self {
            salt: salt.into(),
            info,
        })
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }

    /// Derive a session key under this context
    pub fn derive(
        &self,
        local_private: &PrivateKey,
        remote_public: &PublicKey,
    ) -> Result<SessionKey, AgreementError> {
        derive_session_key(local_private, remote_public, &self.salt, &self.info)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 7748 section 6.1
    const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
    const BOB_PRIVATE: &str = "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb";
    const SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

    fn x25519(hex_key: &str) -> PrivateKey {
        PrivateKey::from_bytes(KeyAlgorithm::X25519, &hex::decode(hex_key).unwrap()).unwrap()
    }

    fn expected_key(salt: Option<&[u8]>, info: &[u8]) -> [u8; SESSION_KEY_SIZE] {
        let shared = hex::decode(SHARED).unwrap();
        let mut okm = [0u8; SESSION_KEY_SIZE];
        Hkdf::<Sha256>::new(salt, &shared)
            .expand(info, &mut okm)
            .unwrap();
        okm
    }

    #[test]
    fn test_rfc7748_agreement_is_symmetric() {
        let alice = x25519(ALICE_PRIVATE);
        let bob = x25519(BOB_PRIVATE);
        let info = b"example-message-encryption";

        let ab = derive_session_key(&alice, &bob.public_key(), b"", info).unwrap();
        let ba = derive_session_key(&bob, &alice.public_key(), b"", info).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.bytes(), expected_key(None, info));
    }

    #[test]
    fn test_salt_is_applied() {
        let alice = x25519(ALICE_PRIVATE);
        let bob = x25519(BOB_PRIVATE);

        let key = derive_session_key(&alice, &bob.public_key(), b"salty", b"info").unwrap();
        assert_eq!(key.bytes(), expected_key(Some(&b"salty"[..]), b"info"));

        let unsalted = derive_session_key(&alice, &bob.public_key(), b"", b"info").unwrap();
        assert_ne!(key, unsalted);
    }

    #[test]
    fn test_domain_separation() {
        let alice = PrivateKey::generate(KeyAlgorithm::X25519).unwrap();
        let bob = PrivateKey::generate(KeyAlgorithm::X25519).unwrap();

        let one = derive_session_key(&alice, &bob.public_key(), b"", b"protocol-a").unwrap();
        let two = derive_session_key(&alice, &bob.public_key(), b"", b"protocol-b").unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_low_order_peer_key() {
        let alice = x25519(ALICE_PRIVATE);
        let mut identity = [0u8; 32];
        identity[0] = 1;
        for point in [[0u8; 32], identity] {
            let peer = PublicKey::from_bytes(KeyAlgorithm::X25519, &point).unwrap();
            assert!(matches!(
                derive_session_key(&alice, &peer, b"", b"info"),
                Err(AgreementError::InvalidPeerKey)
            ));
        }
    }

    #[test]
    fn test_signing_keys_cannot_agree() {
        let ed = PrivateKey::generate(KeyAlgorithm::Ed25519).unwrap();
        let x = PrivateKey::generate(KeyAlgorithm::X25519).unwrap();

        assert!(matches!(
            derive_session_key(&ed, &x.public_key(), b"", b"info"),
            Err(AgreementError::UnsupportedKeyType {
                local: KeyAlgorithm::Ed25519,
                remote: KeyAlgorithm::X25519,
            })
        ));
        assert!(matches!(
            derive_session_key(&x, &ed.public_key(), b"", b"info"),
            Err(AgreementError::UnsupportedKeyType { .. })
        ));
    }

    #[test]
    fn test_context() {
        assert!(matches!(
            DerivationContext::new(b"salt".to_vec(), Vec::<u8>::new()),
            Err(AgreementError::InvalidContext(_))
        ));

        let context = DerivationContext::new(Vec::<u8>::new(), b"example-message-encryption".to_vec())
            .unwrap();
        assert!(context.salt().is_empty());

        let alice = x25519(ALICE_PRIVATE);
        let bob = x25519(BOB_PRIVATE);
        let key = context.derive(&alice, &bob.public_key()).unwrap();
        assert_eq!(
            key.bytes(),
            expected_key(None, b"example-message-encryption")
        );

        assert_eq!(DerivationContext::default().info(), DEFAULT_SHARED_INFO);
    }
}
