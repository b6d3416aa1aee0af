// Key Record Codec
// Stable binary layout for one persisted RSA key
//
//   [1 byte]  kind tag: 0x01 = public, 0x02 = private
//   [4 bytes] modulus byte length, big-endian
//   [N bytes] modulus, big-endian, no leading zero unless the value is 0
//   [4 bytes] exponent byte length, big-endian
//   [M bytes] exponent, big-endian, same rule

use zeroize::Zeroize;

use super::bigint::BigUint;
use super::errors::{Result, RsaError};
use super::keygen::{KeyKind, RsaKey};

const LENGTH_FIELD: usize = 4;

/// Serialize a key into its record bytes
pub fn serialize(key: &RsaKey) -> Vec<u8> {
    let modulus = key.modulus().to_bytes_be();
    let mut exponent = key.exponent().to_bytes_be();

    let mut out = Vec::with_capacity(1 + 2 * LENGTH_FIELD + modulus.len() + exponent.len());
    out.push(key.kind().tag());
    // Real keys are nowhere near u32::MAX bytes
    out.extend_from_slice(&(modulus.len() as u32).to_be_bytes());
    out.extend_from_slice(&modulus);
    out.extend_from_slice(&(exponent.len() as u32).to_be_bytes());
    out.extend_from_slice(&exponent);

    exponent.zeroize();
    out
}

/// Deserialize exactly one key record
///
/// Trailing bytes after the record are rejected.
pub fn deserialize(bytes: &[u8]) -> Result<RsaKey> {
    let (key, consumed) = decode_record(bytes)?;
    if consumed != bytes.len() {
        return Err(RsaError::Format(format!(
            "{} trailing bytes after key record",
            bytes.len() - consumed
        )));
    }
    Ok(key)
}

/// Decode the record at the start of `bytes`
/// Returns the key and the number of bytes it occupied
pub fn decode_record(bytes: &[u8]) -> Result<(RsaKey, usize)> {
    let mut reader = RecordReader::new(bytes);

    let tag = reader.take(1, "kind tag")?[0];
    let kind = KeyKind::from_tag(tag)
        .ok_or_else(|| RsaError::Format(format!("unknown key kind tag {:#04x}", tag)))?;

    let modulus = reader.integer("modulus")?;
    let exponent = reader.integer("exponent")?;

    let key = RsaKey::new(kind, modulus, exponent).map_err(|err| RsaError::Format(err.to_string()))?;
    Ok((key, reader.pos))
}

/// Cursor over a record buffer
struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(RsaError::Format(format!("truncated {}", what)));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn length(&mut self, what: &str) -> Result<usize> {
        let field = self.take(LENGTH_FIELD, what)?;
        let len = u32::from_be_bytes([field[0], field[1], field[2], field[3]]) as usize;
        if len > self.remaining() {
            return Err(RsaError::Format(format!(
                "{} length {} overruns record ({} bytes left)",
                what,
                len,
                self.remaining()
            )));
        }
        Ok(len)
    }

    /// Length-prefixed canonical big-endian integer
    fn integer(&mut self, what: &str) -> Result<BigUint> {
        let len = self.length(what)?;
        let bytes = self.take(len, what)?;
        if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == 0) {
            return Err(RsaError::Format(format!("non-canonical {} encoding", what)));
        }
        Ok(BigUint::from_bytes_be(bytes))
    }
}
