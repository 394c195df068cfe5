/**
 * Agreed derivation context and key file
 *  locations, loaded from TOML.
 */
pub mod config;
/**
 * Cryptographic types and operations.
 *  - PKCS#8 / SubjectPublicKeyInfo codec for
 *    Ed25519 and X25519 keys, with PEM and JWK views
 *  - X25519 + HKDF session key derivation
 *  - ChaCha20-Poly1305 sealed messages
 */
pub mod crypto;

pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::crypto::{
        derive_session_key, DerivationContext, KeyAlgorithm, KeyError, PrivateKey, PublicKey,
        SealedMessage, SessionKey,
    };
}
