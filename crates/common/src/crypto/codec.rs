//! PKCS#8 and SubjectPublicKeyInfo containers
//!
//! ```text
//! OneAsymmetricKey ::= SEQUENCE {
//!     version             INTEGER (0),
//!     privateKeyAlgorithm AlgorithmIdentifier,
//!     privateKey          OCTET STRING }
//!
//! SubjectPublicKeyInfo ::= SEQUENCE {
//!     algorithm           AlgorithmIdentifier,
//!     subjectPublicKey    BIT STRING }
//! ```
//!
//! For the Curve25519 family both containers are fixed-size:
//!
//! ```text
//! 30 2e 02 01 00 30 05 06 03 2b 65 70 04 22 04 20 <32 byte seed>
//! 30 2a 30 05 06 03 2b 65 70 03 21 00 <32 byte public key>
//! ```
//!
//! Parsing is all-or-nothing: a key is only returned once the whole container
//! has been consumed and validated.

use zeroize::Zeroizing;

use super::der::{self, Reader};
use super::keys::{KeyError, PrivateKey, PublicKey};
use super::registry::{self, AlgorithmIdentifier, AlgorithmSpec};

/// The only PKCS#8 version we read or write (RFC 5958 `v1`)
pub const PKCS8_VERSION: u64 = 0;

fn check_length(spec: &AlgorithmSpec, expected: usize, actual: usize) -> Result<(), KeyError> {
    if expected != actual {
        return Err(KeyError::InvalidKeyLength {
            algorithm: spec.algorithm,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Parse a DER encoded PKCS#8 private key
///
/// # Errors
///
/// - [`KeyError::MalformedContainer`] on any structural DER problem, a version
///   other than 0, or trailing data
/// - [`KeyError::UnsupportedAlgorithm`] if the OID is not registered
/// - [`KeyError::InvalidKeyLength`] if the secret is the wrong size
pub fn parse_private_key(der: &[u8]) -> Result<PrivateKey, KeyError> {
    let mut outer = Reader::new(der);
    let mut container = outer.read_sequence()?;
    outer.finish()?;

    let version = container.read_uint()?;
    if version != PKCS8_VERSION {
        return Err(KeyError::MalformedContainer(format!(
            "unsupported PKCS#8 version {}",
            version
        )));
    }
    let identifier = AlgorithmIdentifier::decode(&mut container)?;
    let payload = container.read_octet_string()?;
    container.finish()?;

    let spec = registry::resolve(&identifier)?;
    let secret = spec.secret_encoding.unwrap(payload)?;
    check_length(spec, spec.secret_len, secret.len())?;

    tracing::debug!(
        "parsed {} private key from {} byte PKCS#8 container",
        spec.algorithm,
        der.len()
    );
    PrivateKey::from_bytes(spec.algorithm, secret)
}

/// Marshal a private key into DER encoded PKCS#8
pub fn marshal_private_key(key: &PrivateKey) -> Vec<u8> {
    let spec = registry::spec_for(key.algorithm());
    let payload = spec.secret_encoding.wrap(key.as_bytes());
    let identifier = spec.identifier().to_der();
    let version = der::encode_uint(PKCS8_VERSION);

    let mut body = Zeroizing::new(Vec::with_capacity(
        version.len() + identifier.len() + payload.len() + 6,
    ));
    body.extend_from_slice(&version);
    body.extend_from_slice(&identifier);
    der::write_tlv(der::TAG_OCTET_STRING, &payload, &mut body);

    tracing::trace!("marshaled {} private key", spec.algorithm);
    der::encode_tlv(der::TAG_SEQUENCE, &body)
}

/// Parse a DER encoded SubjectPublicKeyInfo
///
/// # Errors
///
/// Same as [`parse_private_key`], plus [`KeyError::InvalidBitString`] if the
/// bit string declares unused bits.
pub fn parse_public_key(der: &[u8]) -> Result<PublicKey, KeyError> {
    let mut outer = Reader::new(der);
    let mut info = outer.read_sequence()?;
    outer.finish()?;

    let identifier = AlgorithmIdentifier::decode(&mut info)?;
    let (unused_bits, key_bytes) = info.read_bit_string()?;
    info.finish()?;

    let spec = registry::resolve(&identifier)?;
    if unused_bits != 0 {
        return Err(KeyError::InvalidBitString(unused_bits));
    }
    check_length(spec, spec.public_len, key_bytes.len())?;

    tracing::debug!(
        "parsed {} public key from {} byte SubjectPublicKeyInfo",
        spec.algorithm,
        der.len()
    );
    PublicKey::from_bytes(spec.algorithm, key_bytes)
}

/// Marshal a public key into a DER encoded SubjectPublicKeyInfo
pub fn marshal_public_key(key: &PublicKey) -> Vec<u8> {
    let spec = registry::spec_for(key.algorithm());
    let mut body = spec.identifier().to_der();
    body.extend_from_slice(&der::encode_bit_string(key.as_bytes()));
    der::encode_tlv(der::TAG_SEQUENCE, &body)
}
