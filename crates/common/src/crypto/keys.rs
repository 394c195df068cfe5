use std::fmt;

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use super::codec;
use super::der::DerError;
use super::registry::ObjectIdentifier;

/// Size of an Ed25519 seed or X25519 scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an Ed25519 or X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

pub use ed25519_dalek::Signature;

/// Errors that can occur while constructing, encoding or decoding keys
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("malformed container: {0}")]
    MalformedContainer(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(ObjectIdentifier),
    #[error("invalid {algorithm} key length, expected {expected}, got {actual}")]
    InvalidKeyLength {
        algorithm: KeyAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("invalid bit string: {0} unused bits, expected 0")]
    InvalidBitString(u8),
    #[error("{operation} is not supported for {algorithm} keys")]
    UnsupportedOperation {
        algorithm: KeyAlgorithm,
        operation: &'static str,
    },
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("PEM error: {0}")]
    Pem(#[from] pem::PemError),
    #[error("failed to generate random bytes: {0}")]
    Random(String),
}

impl From<DerError> for KeyError {
    fn from(err: DerError) -> Self {
        KeyError::MalformedContainer(err.to_string())
    }
}

/// The closed set of key algorithms this crate understands
///
/// Adding an algorithm means adding a variant here, a matching variant to
/// [`PrivateKey`] and [`PublicKey`], and an entry in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// EdDSA over edwards25519, used for signing
    Ed25519,
    /// ECDH over curve25519, used for key agreement
    X25519,
}

impl KeyAlgorithm {
    pub const ALL: [KeyAlgorithm; 2] = [KeyAlgorithm::Ed25519, KeyAlgorithm::X25519];

    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::X25519 => "X25519",
        }
    }

    /// Look up an algorithm by its JOSE curve name (`crv`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name() == name)
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fixed_bytes<const N: usize>(
    algorithm: KeyAlgorithm,
    bytes: &[u8],
) -> Result<[u8; N], KeyError> {
    bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
        algorithm,
        expected: N,
        actual: bytes.len(),
    })
}

/// Private key material for one of the supported algorithms
///
/// Each variant holds exactly the secret bytes its algorithm needs: the RFC 8032
/// seed for Ed25519 and the RFC 7748 scalar for X25519. The bytes are zeroed
/// when the key is dropped and never show up in `Debug` output.
///
/// # Examples
///
/// ```ignore
/// let key = PrivateKey::generate(KeyAlgorithm::X25519)?;
/// let der = key.to_der();
/// let recovered = PrivateKey::from_der(&der)?;
/// assert_eq!(key.public_key(), recovered.public_key());
/// ```
#[derive(Clone)]
pub enum PrivateKey {
    Ed25519([u8; PRIVATE_KEY_SIZE]),
    X25519([u8; PRIVATE_KEY_SIZE]),
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        match self {
            PrivateKey::Ed25519(bytes) | PrivateKey::X25519(bytes) => bytes.zeroize(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey::{}(<redacted>)", self.algorithm())
    }
}

impl PrivateKey {
    /// Build a private key from raw secret bytes
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidKeyLength`] if `bytes` is not exactly
    /// the algorithm's secret length.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        let secret = fixed_bytes::<PRIVATE_KEY_SIZE>(algorithm, bytes)?;
        Ok(match algorithm {
            KeyAlgorithm::Ed25519 => PrivateKey::Ed25519(secret),
            KeyAlgorithm::X25519 => PrivateKey::X25519(secret),
        })
    }

    /// Generate a new random private key using the operating system RNG
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self, KeyError> {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(|e| KeyError::Random(e.to_string()))?;
        let key = Self::from_bytes(algorithm, &bytes);
        bytes.zeroize();
        key
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PrivateKey::X25519(_) => KeyAlgorithm::X25519,
        }
    }

    /// Borrow the raw secret bytes
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        match self {
            PrivateKey::Ed25519(bytes) | PrivateKey::X25519(bytes) => bytes,
        }
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(seed) => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
                PublicKey::Ed25519(signing_key.verifying_key().to_bytes())
            }
            PrivateKey::X25519(scalar) => {
                let secret = StaticSecret::from(*scalar);
                PublicKey::X25519(X25519PublicKey::from(&secret).to_bytes())
            }
        }
    }

    /// Sign a message with an Ed25519 key
    ///
    /// # Errors
    ///
    /// Agreement-only keys cannot sign and return
    /// [`KeyError::UnsupportedOperation`].
    pub fn sign(&self, msg: &[u8]) -> Result<Signature, KeyError> {
        use ed25519_dalek::Signer;

        match self {
            PrivateKey::Ed25519(seed) => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
                Ok(signing_key.sign(msg))
            }
            other => Err(KeyError::UnsupportedOperation {
                algorithm: other.algorithm(),
                operation: "signing",
            }),
        }
    }

    /// Encode as a DER PKCS#8 container
    pub fn to_der(&self) -> Vec<u8> {
        codec::marshal_private_key(self)
    }

    /// Decode from a DER PKCS#8 container
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        codec::parse_private_key(der)
    }
}

/// Public key for one of the supported algorithms
///
/// Public keys are plain values: copyable, comparable and printable. The
/// algorithm tag always travels with the bytes so an X25519 point can never be
/// mistaken for an Ed25519 verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicKey {
    Ed25519([u8; PUBLIC_KEY_SIZE]),
    X25519([u8; PUBLIC_KEY_SIZE]),
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey::{}({})", self.algorithm(), self.to_hex())
    }
}

impl PublicKey {
    /// Build a public key from raw bytes
    ///
    /// Only the length is checked here; Ed25519 point validity is checked when
    /// verifying and X25519 validity when agreeing.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self, KeyError> {
        let point = fixed_bytes::<PUBLIC_KEY_SIZE>(algorithm, bytes)?;
        Ok(match algorithm {
            KeyAlgorithm::Ed25519 => PublicKey::Ed25519(point),
            KeyAlgorithm::X25519 => PublicKey::X25519(point),
        })
    }

    /// Parse a public key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(algorithm: KeyAlgorithm, hex: &str) -> Result<Self, KeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|e| {
            KeyError::MalformedContainer(format!("public key hex decode error: {}", e))
        })?;
        Self::from_bytes(algorithm, &bytes)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::X25519(_) => KeyAlgorithm::X25519,
        }
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        match self {
            PublicKey::Ed25519(bytes) | PublicKey::X25519(bytes) => bytes,
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Verify an Ed25519 signature on a message
    ///
    /// Uses strict verification, rejecting small-order keys and
    /// non-canonical signatures.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), KeyError> {
        match self {
            PublicKey::Ed25519(bytes) => {
                let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(bytes)
                    .map_err(|_| KeyError::InvalidSignature)?;
                verifying_key
                    .verify_strict(msg, signature)
                    .map_err(|_| KeyError::InvalidSignature)
            }
            other => Err(KeyError::UnsupportedOperation {
                algorithm: other.algorithm(),
                operation: "signature verification",
            }),
        }
    }

    /// Encode as a DER SubjectPublicKeyInfo
    pub fn to_der(&self) -> Vec<u8> {
        codec::marshal_public_key(self)
    }

    /// Decode from a DER SubjectPublicKeyInfo
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        codec::parse_public_key(der)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 8032 section 7.1, test 1
    const ED25519_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const ED25519_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const ED25519_EMPTY_SIG: &str = "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065\
                                     224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24\
                                     655141438e7a100b";

    // RFC 7748 section 6.1, Alice
    const X25519_SCALAR: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
    const X25519_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";

    #[test]
    fn test_ed25519_public_key_derivation() {
        let seed = hex::decode(ED25519_SEED).unwrap();
        let key = PrivateKey::from_bytes(KeyAlgorithm::Ed25519, &seed).unwrap();
        assert_eq!(key.public_key().to_hex(), ED25519_PUBLIC);
        assert_eq!(key.public_key().algorithm(), KeyAlgorithm::Ed25519);
    }

    #[test]
    fn test_x25519_public_key_derivation() {
        let scalar = hex::decode(X25519_SCALAR).unwrap();
        let key = PrivateKey::from_bytes(KeyAlgorithm::X25519, &scalar).unwrap();
        assert_eq!(key.public_key().to_hex(), X25519_PUBLIC);
        assert_eq!(key.public_key().algorithm(), KeyAlgorithm::X25519);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        for algorithm in KeyAlgorithm::ALL {
            for len in [0, 16, 31, 33, 64] {
                let bytes = vec![7u8; len];
                assert!(matches!(
                    PrivateKey::from_bytes(algorithm, &bytes),
                    Err(KeyError::InvalidKeyLength { expected: 32, actual, .. }) if actual == len
                ));
                assert!(matches!(
                    PublicKey::from_bytes(algorithm, &bytes),
                    Err(KeyError::InvalidKeyLength { expected: 32, actual, .. }) if actual == len
                ));
            }
        }
    }

    #[test]
    fn test_known_signature() {
        let seed = hex::decode(ED25519_SEED).unwrap();
        let key = PrivateKey::from_bytes(KeyAlgorithm::Ed25519, &seed).unwrap();
        let signature = key.sign(b"").unwrap();
        assert_eq!(hex::encode(signature.to_bytes()), ED25519_EMPTY_SIG);
        key.public_key().verify(b"", &signature).unwrap();
    }

    #[test]
    fn test_sign_and_verify() {
        let secret_key = PrivateKey::generate(KeyAlgorithm::Ed25519).unwrap();
        let public_key = secret_key.public_key();
        let message = b"hello, world!";

        let signature = secret_key.sign(message).unwrap();
        assert!(public_key.verify(message, &signature).is_ok());

        // Verify fails with wrong message
        assert!(matches!(
            public_key.verify(b"hello, world?", &signature),
            Err(KeyError::InvalidSignature)
        ));

        // Verify fails with wrong key
        let other_key = PrivateKey::generate(KeyAlgorithm::Ed25519)
            .unwrap()
            .public_key();
        assert!(other_key.verify(message, &signature).is_err());
    }

    #[test]
    fn test_agreement_keys_cannot_sign() {
        let key = PrivateKey::generate(KeyAlgorithm::X25519).unwrap();
        assert!(matches!(
            key.sign(b"msg"),
            Err(KeyError::UnsupportedOperation {
                algorithm: KeyAlgorithm::X25519,
                ..
            })
        ));

        let signature = Signature::from_bytes(&[0u8; 64]);
        assert!(matches!(
            key.public_key().verify(b"msg", &signature),
            Err(KeyError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = PrivateKey::from_bytes(KeyAlgorithm::X25519, &[0xab; 32]).unwrap();
        let debug = format!("{:?}", key);
        assert_eq!(debug, "PrivateKey::X25519(<redacted>)");
        assert!(!debug.contains("ab"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let public = PrivateKey::generate(KeyAlgorithm::Ed25519)
            .unwrap()
            .public_key();
        let recovered = PublicKey::from_hex(KeyAlgorithm::Ed25519, &public.to_hex()).unwrap();
        assert_eq!(public, recovered);

        let prefixed = format!("0x{}", public.to_hex());
        assert_eq!(
            PublicKey::from_hex(KeyAlgorithm::Ed25519, &prefixed).unwrap(),
            public
        );
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(KeyAlgorithm::from_name("Ed25519"), Some(KeyAlgorithm::Ed25519));
        assert_eq!(KeyAlgorithm::from_name("X25519"), Some(KeyAlgorithm::X25519));
        assert_eq!(KeyAlgorithm::from_name("P-256"), None);
    }
}
