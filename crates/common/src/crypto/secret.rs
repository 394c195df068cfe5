//! Message encryption using ChaCha20-Poly1305
//!
//! A [`SessionKey`] seals whole messages into a self-describing byte string:
//! `nonce (12 bytes) || ciphertext || tag (16 bytes)`. A fresh random nonce is
//! drawn from the OS RNG for every message; nonces are never derived from
//! counters, so the same key can seal any number of messages without state.
//!
//! There is no associated data and no version tag. Both sides must agree out
//! of band that this cipher and nonce size are in use.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of a session key in bytes (256 bits)
pub const SESSION_KEY_SIZE: usize = 32;

/// Errors that can occur during sealing/opening
///
/// Opening reports a single [`SecretError::AuthenticationFailed`]
/// for both a wrong key and tampered data.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("sealed message is {len} bytes, shorter than the 12 byte nonce")]
    TruncatedMessage { len: usize },
    #[error("message authentication failed")]
    AuthenticationFailed,
    #[error("encryption failed")]
    Encryption,
    #[error("failed to generate nonce: {0}")]
    Random(String),
    #[error("invalid session key size, expected 32, got {0}")]
    InvalidKeyLength(usize),
}

/// A 256-bit symmetric key derived from key agreement
///
/// The key is zeroed on drop and redacted from `Debug` output. It is never
/// cached by this crate; callers that want to reuse it across messages keep
/// it themselves.
///
/// # Examples
///
/// ```ignore
/// let key = derive_session_key(&ours, &theirs, b"", b"my-protocol")?;
/// let sealed = key.seal(b"sensitive data")?;
/// let recovered = key.open(&sealed)?;
/// assert_eq!(recovered, b"sensitive data");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

/// Constant time comparison
impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

impl From<[u8; SESSION_KEY_SIZE]> for SessionKey {
    fn from(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        SessionKey(bytes)
    }
}

impl SessionKey {
    /// Create a session key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SESSION_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        let bytes: [u8; SESSION_KEY_SIZE] = data
            .try_into()
            .map_err(|_| SecretError::InvalidKeyLength(data.len()))?;
        Ok(Self(bytes))
    }

    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Encrypt and authenticate a whole message
    ///
    /// # Errors
    ///
    /// Only fails if the OS RNG is unavailable or the message exceeds the
    /// cipher's length limit.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedMessage, SecretError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).map_err(|e| SecretError::Random(e.to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(nonce, plaintext)
            .map_err(|_| SecretError::Encryption)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(&ciphertext);

        tracing::trace!("sealed {} byte message", plaintext.len());
        Ok(SealedMessage(out))
    }

    /// Verify and decrypt a message produced by [`SessionKey::seal`]
    ///
    /// # Errors
    ///
    /// - [`SecretError::TruncatedMessage`] if the input cannot hold a nonce
    /// - [`SecretError::AuthenticationFailed`] if the tag does not verify
    pub fn open(&self, sealed: impl AsRef<[u8]>) -> Result<Vec<u8>, SecretError> {
        let data = sealed.as_ref();
        if data.len() < NONCE_SIZE {
            return Err(SecretError::TruncatedMessage { len: data.len() });
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                tracing::debug!("rejected {} byte sealed message", data.len());
                SecretError::AuthenticationFailed
            })?;
        Ok(plaintext)
    }
}

/// Encrypt `plaintext` under `key`; see [`SessionKey::seal`]
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<SealedMessage, SecretError> {
    key.seal(plaintext)
}

/// Decrypt `sealed` under `key`; see [`SessionKey::open`]
pub fn open(key: &SessionKey, sealed: &[u8]) -> Result<Vec<u8>, SecretError> {
    key.open(sealed)
}

/// Output of [`SessionKey::seal`]: `nonce || ciphertext || tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage(Vec<u8>);

impl SealedMessage {
    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_SIZE]
    }

    /// Ciphertext with the authentication tag appended
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[NONCE_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SealedMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<SealedMessage> for Vec<u8> {
    fn from(sealed: SealedMessage) -> Self {
        sealed.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key() -> SessionKey {
        let mut bytes = [0u8; SESSION_KEY_SIZE];
        getrandom::getrandom(&mut bytes).unwrap();
        SessionKey::from(bytes)
    }

    #[test]
    fn test_seal_open() {
        let key = key();
        let data = b"hello world, this is a test message for encryption";

        let sealed = key.seal(data).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + data.len() + TAG_SIZE);

        let opened = key.open(&sealed).unwrap();
        assert_eq!(data.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_empty_message() {
        let key = key();
        let sealed = seal(&key, b"").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(open(&key, sealed.as_bytes()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_wrong_key() {
        let sealed = key().seal(b"for someone else").unwrap();
        assert!(matches!(
            key().open(&sealed),
            Err(SecretError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_truncated() {
        let key = key();
        for len in 0..NONCE_SIZE {
            assert!(matches!(
                key.open(vec![0u8; len]),
                Err(SecretError::TruncatedMessage { len: l }) if l == len
            ));
        }
        // room for a nonce but not for a tag
        for len in NONCE_SIZE..NONCE_SIZE + TAG_SIZE {
            assert!(matches!(
                key.open(vec![0u8; len]),
                Err(SecretError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let key = key();
        let data = b"tamper";
        let sealed = key.seal(data).unwrap().into_bytes();

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(key.open(&tampered), Err(SecretError::AuthenticationFailed)),
                    "flip of bit {} in byte {} was not detected",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_nonces_are_unique() {
        let key = key();
        let mut nonces = std::collections::HashSet::new();
        for _ in 0..1000 {
            let sealed = key.seal(b"same message").unwrap();
            assert!(nonces.insert(sealed.nonce().to_vec()));
        }
    }

    #[test]
    fn test_sealed_message_layout() {
        let key = key();
        let sealed = key.seal(b"layout").unwrap();
        assert_eq!(sealed.nonce().len(), NONCE_SIZE);
        assert_eq!(sealed.ciphertext().len(), b"layout".len() + TAG_SIZE);
        assert_eq!(
            [sealed.nonce(), sealed.ciphertext()].concat(),
            sealed.as_bytes()
        );
    }

    #[test]
    fn test_key_size_validation() {
        assert!(matches!(
            SessionKey::from_slice(&[1u8; 16]),
            Err(SecretError::InvalidKeyLength(16))
        ));
        assert!(SessionKey::from_slice(&[1u8; 64]).is_err());
        assert!(SessionKey::from_slice(&[1u8; SESSION_KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_key_equality() {
        let key = SessionKey::from([0x5a; SESSION_KEY_SIZE]);
        assert_eq!(key, key.clone());
        assert_eq!(key, SessionKey::from_slice(&[0x5a; SESSION_KEY_SIZE]).unwrap());

        // a difference in the last byte only
        let mut bytes = [0x5a; SESSION_KEY_SIZE];
        bytes[SESSION_KEY_SIZE - 1] ^= 0x01;
        assert_ne!(key, SessionKey::from(bytes));
        assert_ne!(key, SessionKey::from([0x00; SESSION_KEY_SIZE]));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SessionKey::from([0x5a; SESSION_KEY_SIZE]);
        assert_eq!(format!("{:?}", key), "SessionKey(<redacted>)");
    }
}
