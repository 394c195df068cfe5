//! Shared fixtures for codec and channel integration tests
#![allow(dead_code)]

use common::crypto::{KeyAlgorithm, PrivateKey};
use tracing_subscriber::EnvFilter;

/// RFC 8410 section 7 Ed25519 private key
pub const PKCS8_ED25519: &str =
    "302e020100300506032b657004220420d4ee72dbf913584ad5b6d8f1f769f8ad3afe7c28cbf1d4fbe097a88f44755842";
/// X25519 private key in the same RFC 8410 layout
pub const PKCS8_X25519: &str =
    "302e020100300506032b656e0422042048975f7ac4ab68008cb772003b3949a283c9b13a9eca4d9b72e5480340afcc72";
/// RFC 8410 section 4 Ed25519 public key
pub const SPKI_ED25519_B64: &str = "MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=";
pub const SPKI_X25519_B64: &str = "MCowBQYDK2VuAyEAHrZvPbCfK6jNpY2uCl9dbEqTWPxRvNBH9Zi3/DbDeno=";

/// RFC 7748 section 6.1 key pairs
pub const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
pub const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
pub const BOB_PRIVATE: &str = "5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb";
pub const BOB_PUBLIC: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";

pub const SHARED_INFO: &[u8] = b"example-message-encryption";

/// Install a test subscriber honoring RUST_LOG; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn b64(data: &str) -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .unwrap()
}

pub fn x25519(hex_key: &str) -> PrivateKey {
    PrivateKey::from_bytes(KeyAlgorithm::X25519, &hex::decode(hex_key).unwrap()).unwrap()
}

/// Two fresh X25519 keys
pub fn key_pair() -> (PrivateKey, PrivateKey) {
    (
        PrivateKey::generate(KeyAlgorithm::X25519).unwrap(),
        PrivateKey::generate(KeyAlgorithm::X25519).unwrap(),
    )
}
