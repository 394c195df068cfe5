//! PEM (RFC 7468) armor for key containers

use pem::{EncodeConfig, LineEnding, Pem};

use super::keys::{KeyError, PrivateKey, PublicKey};

/// Label for a PKCS#8 private key
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
/// Label for a SubjectPublicKeyInfo
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// A key read from PEM text of either kind
#[derive(Debug, Clone)]
pub enum DecodedKey {
    Private(PrivateKey),
    Public(PublicKey),
}

impl DecodedKey {
    /// The public half, derived if this is a private key
    pub fn public_key(&self) -> PublicKey {
        match self {
            DecodedKey::Private(key) => key.public_key(),
            DecodedKey::Public(key) => *key,
        }
    }
}

fn encode(label: &str, der: Vec<u8>) -> String {
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
    pem::encode_config(&Pem::new(label, der), config)
}

fn parse_labeled(text: &str, label: &str) -> Result<Pem, KeyError> {
    let block = pem::parse(text)?;
    if block.tag() != label {
        return Err(KeyError::MalformedContainer(format!(
            "expected PEM label {:?}, got {:?}",
            label,
            block.tag()
        )));
    }
    Ok(block)
}

/// Decode a PEM block holding either a private or a public key
///
/// Dispatches on the label; anything other than `PRIVATE KEY` or `PUBLIC KEY`
/// is a [`KeyError::MalformedContainer`].
pub fn decode_pem(text: &str) -> Result<DecodedKey, KeyError> {
    let block = pem::parse(text)?;
    tracing::trace!("decoding PEM block labeled {:?}", block.tag());
    match block.tag() {
        PRIVATE_KEY_LABEL => Ok(DecodedKey::Private(PrivateKey::from_der(block.contents())?)),
        PUBLIC_KEY_LABEL => Ok(DecodedKey::Public(PublicKey::from_der(block.contents())?)),
        other => Err(KeyError::MalformedContainer(format!(
            "unsupported PEM label {:?}",
            other
        ))),
    }
}

impl PrivateKey {
    /// Encode as a `PRIVATE KEY` PEM block with LF line endings
    ///
    /// The returned string contains the secret; treat it like the key itself.
    pub fn to_pem(&self) -> String {
        encode(PRIVATE_KEY_LABEL, self.to_der())
    }

    pub fn from_pem(text: &str) -> Result<Self, KeyError> {
        let block = parse_labeled(text, PRIVATE_KEY_LABEL)?;
        Self::from_der(block.contents())
    }
}

impl PublicKey {
    /// Encode as a `PUBLIC KEY` PEM block with LF line endings
    pub fn to_pem(&self) -> String {
        encode(PUBLIC_KEY_LABEL, self.to_der())
    }

    pub fn from_pem(text: &str) -> Result<Self, KeyError> {
        let block = parse_labeled(text, PUBLIC_KEY_LABEL)?;
        Self::from_der(block.contents())
    }
}
