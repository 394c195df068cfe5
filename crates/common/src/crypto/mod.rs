//! Cryptographic primitives for curvebox
//!
//! This module covers two jobs:
//!
//! - **Key containers**: reading and writing Ed25519 and X25519 keys as DER
//!   PKCS#8 (RFC 5958 / RFC 8410) and SubjectPublicKeyInfo, plus PEM and JWK
//!   views of the same keys
//! - **Sealed messages**: turning an X25519 key pair into a symmetric
//!   session key and using it to encrypt whole messages
//!
//! # Key Model
//!
//! [`PrivateKey`] and [`PublicKey`] are closed enums with one variant per
//! algorithm. The container codec never branches on the algorithm itself; it
//! looks the OID up in a static registry, and the registry entry says how the
//! secret is wrapped and how long the key material must be. Supporting a new
//! algorithm means a new variant and a new registry entry.
//!
//! Signing keys (Ed25519) and agreement keys (X25519) share the containers but
//! not the operations: an X25519 key cannot sign and an Ed25519 key cannot be
//! used for agreement.
//!
//! # Message Pipeline
//!
//! ```text
//! local X25519 private ─┐
//!                       ├─ ECDH ─ HKDF-SHA256(salt, info) ─ SessionKey
//! remote X25519 public ─┘                                      │
//!                                   plaintext ─ ChaCha20-Poly1305 ─ nonce || ciphertext || tag
//! ```
//!
//! The `(salt, info)` pair is fixed out of band by both parties, usually
//! through [`crate::config::Config`].
//!
//! # Secret Hygiene
//!
//! Private keys, shared secrets and session keys are zeroed on drop and
//! redacted from `Debug`. Nothing here logs key material.

mod agreement;
mod armor;
mod codec;
mod der;
mod jwk;
mod keys;
mod registry;
mod secret;

pub use agreement::{derive_session_key, AgreementError, DerivationContext, DEFAULT_SHARED_INFO};
pub use armor::{decode_pem, DecodedKey, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL};
pub use codec::{
    marshal_private_key, marshal_public_key, parse_private_key, parse_public_key, PKCS8_VERSION,
};
pub use jwk::{Jwk, JwkError, JwkSet, OKP_KEY_TYPE};
pub use keys::{
    KeyAlgorithm, KeyError, PrivateKey, PublicKey, Signature, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE,
};
pub use registry::{
    identifier_for, resolve, spec_for, AlgorithmIdentifier, AlgorithmSpec, ObjectIdentifier,
    Parameters, SecretEncoding, ED25519_OID, X25519_OID,
};
pub use secret::{
    open, seal, SealedMessage, SecretError, SessionKey, NONCE_SIZE, SESSION_KEY_SIZE, TAG_SIZE,
};
