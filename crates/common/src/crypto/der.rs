//! Minimal canonical DER reader and writer
//!
//! Only the handful of universal types the key containers need are supported:
//! INTEGER, BIT STRING, OCTET STRING, OBJECT IDENTIFIER and SEQUENCE. The reader
//! is strict: lengths must use the shortest form, integers must be minimally
//! encoded and indefinite lengths are rejected, so every value has exactly one
//! accepted encoding and re-encoding a parsed container reproduces its input.

pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_BIT_STRING: u8 = 0x03;
pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;

/// Longest length prefix we accept, in bytes following the `0x8N` marker
const MAX_LENGTH_OCTETS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DerError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected tag: expected 0x{expected:02x}, got 0x{actual:02x}")]
    UnexpectedTag { expected: u8, actual: u8 },
    #[error("high tag numbers are not supported")]
    UnsupportedTag,
    #[error("indefinite length is not allowed in DER")]
    IndefiniteLength,
    #[error("length is not minimally encoded")]
    NonCanonicalLength,
    #[error("length prefix longer than 4 octets")]
    LengthOverflow,
    #[error("integer is not minimally encoded")]
    NonCanonicalInteger,
    #[error("integer is negative or too large")]
    IntegerOutOfRange,
    #[error("malformed object identifier")]
    InvalidOid,
    #[error("malformed bit string")]
    InvalidBitString,
    #[error("{0} trailing bytes after value")]
    TrailingData(usize),
}

/// A single decoded TLV element
#[derive(Debug, Clone, Copy)]
pub(crate) struct Element<'a> {
    pub tag: u8,
    pub contents: &'a [u8],
    /// Complete encoding, header included
    pub raw: &'a [u8],
}

/// Cursor over a run of consecutive DER elements
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn next_byte(&mut self) -> Result<u8, DerError> {
        let byte = *self.data.get(self.pos).ok_or(DerError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_length(&mut self) -> Result<usize, DerError> {
        let first = self.next_byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }
        if first == 0x80 {
            return Err(DerError::IndefiniteLength);
        }

        let octets = (first & 0x7f) as usize;
        if octets > MAX_LENGTH_OCTETS {
            return Err(DerError::LengthOverflow);
        }

        let mut length = 0usize;
        for i in 0..octets {
            let byte = self.next_byte()?;
            if i == 0 && byte == 0 {
                return Err(DerError::NonCanonicalLength);
            }
            length = (length << 8) | byte as usize;
        }
        if length < 0x80 {
            return Err(DerError::NonCanonicalLength);
        }
        Ok(length)
    }

    /// Read the next element whatever its tag
    pub fn read_any(&mut self) -> Result<Element<'a>, DerError> {
        let start = self.pos;
        let tag = self.next_byte()?;
        if tag & 0x1f == 0x1f {
            return Err(DerError::UnsupportedTag);
        }

        let length = self.read_length()?;
        if length > self.remaining() {
            return Err(DerError::UnexpectedEnd);
        }

        let contents = &self.data[self.pos..self.pos + length];
        self.pos += length;
        Ok(Element {
            tag,
            contents,
            raw: &self.data[start..self.pos],
        })
    }

    /// Read the next element and require it to carry `tag`
    pub fn read(&mut self, tag: u8) -> Result<&'a [u8], DerError> {
        let element = self.read_any()?;
        if element.tag != tag {
            return Err(DerError::UnexpectedTag {
                expected: tag,
                actual: element.tag,
            });
        }
        Ok(element.contents)
    }

    pub fn read_sequence(&mut self) -> Result<Reader<'a>, DerError> {
        self.read(TAG_SEQUENCE).map(Reader::new)
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8], DerError> {
        self.read(TAG_OCTET_STRING)
    }

    /// Returns the unused-bits count and the bit string payload
    pub fn read_bit_string(&mut self) -> Result<(u8, &'a [u8]), DerError> {
        let contents = self.read(TAG_BIT_STRING)?;
        let (&unused, bits) = contents.split_first().ok_or(DerError::InvalidBitString)?;
        if unused > 7 || (unused > 0 && bits.is_empty()) {
            return Err(DerError::InvalidBitString);
        }
        Ok((unused, bits))
    }

    /// Read a non-negative INTEGER that fits in a `u64`
    pub fn read_uint(&mut self) -> Result<u64, DerError> {
        let contents = self.read(TAG_INTEGER)?;
        decode_uint(contents)
    }

    pub fn read_oid(&mut self) -> Result<Vec<u64>, DerError> {
        let contents = self.read(TAG_OID)?;
        decode_oid(contents)
    }

    /// Consume the reader, failing if anything is left over
    pub fn finish(self) -> Result<(), DerError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DerError::TrailingData(n)),
        }
    }
}

fn decode_uint(contents: &[u8]) -> Result<u64, DerError> {
    match contents {
        [] => Err(DerError::NonCanonicalInteger),
        [0x00, next, ..] if next & 0x80 == 0 => Err(DerError::NonCanonicalInteger),
        [0xff, next, ..] if next & 0x80 != 0 => Err(DerError::NonCanonicalInteger),
        [first, ..] if first & 0x80 != 0 => Err(DerError::IntegerOutOfRange),
        _ => {
            let digits = match contents {
                [0x00, rest @ ..] => rest,
                _ => contents,
            };
            if digits.len() > 8 {
                return Err(DerError::IntegerOutOfRange);
            }
            Ok(digits.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
        }
    }
}

fn decode_oid(contents: &[u8]) -> Result<Vec<u64>, DerError> {
    if contents.is_empty() {
        return Err(DerError::InvalidOid);
    }

    let mut subidentifiers = Vec::new();
    let mut value = 0u64;
    let mut in_progress = false;
    for &byte in contents {
        // leading 0x80 would be a non-minimal subidentifier
        if !in_progress && byte == 0x80 {
            return Err(DerError::InvalidOid);
        }
        if value > (u64::MAX >> 7) {
            return Err(DerError::InvalidOid);
        }
        value = (value << 7) | (byte & 0x7f) as u64;
        if byte & 0x80 == 0 {
            subidentifiers.push(value);
            value = 0;
            in_progress = false;
        } else {
            in_progress = true;
        }
    }
    if in_progress {
        return Err(DerError::InvalidOid);
    }

    let first = subidentifiers[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut arcs = Vec::with_capacity(subidentifiers.len() + 1);
    arcs.push(a);
    arcs.push(b);
    arcs.extend_from_slice(&subidentifiers[1..]);
    Ok(arcs)
}

/// Append a definite, minimal length prefix
fn write_length(length: usize, out: &mut Vec<u8>) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Append a complete TLV to `out`
pub(crate) fn write_tlv(tag: u8, contents: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    write_length(contents.len(), out);
    out.extend_from_slice(contents);
}

pub(crate) fn encode_tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(contents.len() + 6);
    write_tlv(tag, contents, &mut out);
    out
}

pub(crate) fn encode_uint(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut digits = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        digits.push(0);
    }
    digits.extend_from_slice(&bytes[skip..]);
    encode_tlv(TAG_INTEGER, &digits)
}

/// Encode a bit string with zero unused bits
pub(crate) fn encode_bit_string(bits: &[u8]) -> Vec<u8> {
    let mut contents = Vec::with_capacity(bits.len() + 1);
    contents.push(0);
    contents.extend_from_slice(bits);
    encode_tlv(TAG_BIT_STRING, &contents)
}

/// Encode an object identifier. Callers guarantee at least two arcs with a
/// valid first pair; the registry only ever hands in well-formed constants.
pub(crate) fn encode_oid(arcs: &[u64]) -> Vec<u8> {
    let mut contents = Vec::with_capacity(arcs.len() + 2);
    // the combined first subidentifier can exceed u64 under arc 2
    let (first, rest) = match arcs {
        [a, b, rest @ ..] => (u128::from(*a) * 40 + u128::from(*b), rest),
        [a] => (u128::from(*a) * 40, &[][..]),
        [] => (0, &[][..]),
    };

    for arc in std::iter::once(first).chain(rest.iter().map(|&arc| u128::from(arc))) {
        let mut chunk = [0u8; 19];
        let mut i = chunk.len();
        let mut value = arc;
        loop {
            i -= 1;
            chunk[i] = (value & 0x7f) as u8;
            if i != chunk.len() - 1 {
                chunk[i] |= 0x80;
            }
            value >>= 7;
            if value == 0 {
                break;
            }
        }
        contents.extend_from_slice(&chunk[i..]);
    }
    encode_tlv(TAG_OID, &contents)
}
