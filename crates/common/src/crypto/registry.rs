//! Algorithm registry
//!
//! Maps object identifiers to the strategy used to encode and decode key
//! material inside PKCS#8 and SubjectPublicKeyInfo containers, and back from a
//! [`KeyAlgorithm`] to the `AlgorithmIdentifier` that should be emitted.
//!
//! The table is static and read-only. Codec call sites only ever go through an
//! [`AlgorithmSpec`]; they never branch on the algorithm themselves.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use super::der::{self, DerError, Reader};
use super::keys::{KeyAlgorithm, KeyError, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// id-Ed25519 (RFC 8410)
pub const ED25519_OID: &[u64] = &[1, 3, 101, 112];
/// id-X25519 (RFC 8410)
pub const X25519_OID: &[u64] = &[1, 3, 101, 110];

/// A dotted-integer object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentifier(Vec<u64>);

impl ObjectIdentifier {
    /// Build an identifier from its arcs
    ///
    /// # Errors
    ///
    /// The first arc must be 0, 1 or 2, the second arc must be below 40 unless
    /// the first is 2, and there must be at least two arcs. The first two arcs
    /// share one subidentifier, so under arc 2 the second arc must fit in
    /// `u64::MAX - 80`.
    pub fn new(arcs: &[u64]) -> Result<Self, KeyError> {
        let valid = match arcs {
            [0 | 1, second, ..] => *second < 40,
            [2, second, ..] => *second <= u64::MAX - 80,
            _ => false,
        };
        if !valid {
            return Err(KeyError::MalformedContainer(format!(
                "invalid object identifier arcs: {:?}",
                arcs
            )));
        }
        Ok(Self(arcs.to_vec()))
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    pub fn to_der(&self) -> Vec<u8> {
        der::encode_oid(&self.0)
    }
}

impl From<&'static [u64]> for ObjectIdentifier {
    fn from(arcs: &'static [u64]) -> Self {
        Self(arcs.to_vec())
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.0.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
        }
        for arc in arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectIdentifier {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| arc.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                KeyError::MalformedContainer(format!("invalid object identifier {}: {}", s, e))
            })?;
        Self::new(&arcs)
    }
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`
///
/// Parameters are kept as their complete DER encoding so they can be compared
/// and re-emitted byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    oid: ObjectIdentifier,
    parameters: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    pub fn new(oid: ObjectIdentifier, parameters: Option<Vec<u8>>) -> Self {
        Self { oid, parameters }
    }

    pub fn oid(&self) -> &ObjectIdentifier {
        &self.oid
    }

    pub fn parameters(&self) -> Option<&[u8]> {
        self.parameters.as_deref()
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, DerError> {
        let mut sequence = reader.read_sequence()?;
        let oid = ObjectIdentifier(sequence.read_oid()?);
        let parameters = if sequence.is_empty() {
            None
        } else {
            Some(sequence.read_any()?.raw.to_vec())
        };
        sequence.finish()?;
        Ok(Self { oid, parameters })
    }

    pub fn to_der(&self) -> Vec<u8> {
        let mut body = self.oid.to_der();
        if let Some(parameters) = &self.parameters {
            body.extend_from_slice(parameters);
        }
        der::encode_tlv(der::TAG_SEQUENCE, &body)
    }
}

/// What an algorithm expects in the `parameters` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameters {
    /// The field must be absent (RFC 8410 section 3)
    Absent,
    /// The field carries a named curve OID, as classical EC keys do
    NamedCurve(&'static [u64]),
}

impl Parameters {
    fn to_der(self) -> Option<Vec<u8>> {
        match self {
            Parameters::Absent => None,
            Parameters::NamedCurve(curve) => Some(der::encode_oid(curve)),
        }
    }
}

/// How secret bytes sit inside the PKCS#8 `privateKey` OCTET STRING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEncoding {
    /// `CurvePrivateKey ::= OCTET STRING`, nested inside the container's
    /// OCTET STRING (RFC 8410 section 7)
    OctetString,
    /// The secret bytes are the container's OCTET STRING contents
    Raw,
}

impl SecretEncoding {
    /// Produce the contents of the container's `privateKey` field
    pub fn wrap(self, secret: &[u8]) -> Zeroizing<Vec<u8>> {
        match self {
            SecretEncoding::OctetString => {
                Zeroizing::new(der::encode_tlv(der::TAG_OCTET_STRING, secret))
            }
            SecretEncoding::Raw => Zeroizing::new(secret.to_vec()),
        }
    }

    /// Recover the secret bytes from the container's `privateKey` field
    pub fn unwrap(self, payload: &[u8]) -> Result<&[u8], KeyError> {
        match self {
            SecretEncoding::OctetString => {
                let mut reader = Reader::new(payload);
                let secret = reader.read_octet_string()?;
                reader.finish()?;
                Ok(secret)
            }
            SecretEncoding::Raw => Ok(payload),
        }
    }
}

/// Everything the codec needs to know about one algorithm
#[derive(Debug)]
pub struct AlgorithmSpec {
    pub algorithm: KeyAlgorithm,
    pub oid: &'static [u64],
    pub parameters: Parameters,
    pub secret_len: usize,
    pub public_len: usize,
    pub secret_encoding: SecretEncoding,
}

impl AlgorithmSpec {
    /// The identifier emitted when marshaling keys of this algorithm
    pub fn identifier(&self) -> AlgorithmIdentifier {
        AlgorithmIdentifier::new(self.oid.into(), self.parameters.to_der())
    }

    fn accepts(&self, identifier: &AlgorithmIdentifier) -> bool {
        identifier.oid().arcs() == self.oid
    }
}

static ED25519: AlgorithmSpec = AlgorithmSpec {
    algorithm: KeyAlgorithm::Ed25519,
    oid: ED25519_OID,
    parameters: Parameters::Absent,
    secret_len: PRIVATE_KEY_SIZE,
    public_len: PUBLIC_KEY_SIZE,
    secret_encoding: SecretEncoding::OctetString,
};

static X25519: AlgorithmSpec = AlgorithmSpec {
    algorithm: KeyAlgorithm::X25519,
    oid: X25519_OID,
    parameters: Parameters::Absent,
    secret_len: PRIVATE_KEY_SIZE,
    public_len: PUBLIC_KEY_SIZE,
    secret_encoding: SecretEncoding::OctetString,
};

static REGISTRY: [&AlgorithmSpec; 2] = [&ED25519, &X25519];

/// Resolve the strategy for a parsed `AlgorithmIdentifier`
///
/// # Errors
///
/// - [`KeyError::UnsupportedAlgorithm`] if the OID is not registered
/// - [`KeyError::MalformedContainer`] if the parameters do not match what the
///   algorithm requires
pub fn resolve(identifier: &AlgorithmIdentifier) -> Result<&'static AlgorithmSpec, KeyError> {
    let spec = REGISTRY
        .iter()
        .copied()
        .find(|spec| spec.accepts(identifier))
        .ok_or_else(|| KeyError::UnsupportedAlgorithm(identifier.oid().clone()))?;

    if identifier.parameters() != spec.parameters.to_der().as_deref() {
        return Err(KeyError::MalformedContainer(format!(
            "unexpected parameters for {}",
            spec.algorithm
        )));
    }
    Ok(spec)
}

/// The registry entry for a key variant
pub fn spec_for(algorithm: KeyAlgorithm) -> &'static AlgorithmSpec {
    match algorithm {
        KeyAlgorithm::Ed25519 => &ED25519,
        KeyAlgorithm::X25519 => &X25519,
    }
}

/// The `AlgorithmIdentifier` to emit for a key variant
pub fn identifier_for(algorithm: KeyAlgorithm) -> AlgorithmIdentifier {
    spec_for(algorithm).identifier()
}
