// OAEP Padding
// Implements RSAES-OAEP encoding and decoding (RFC 8017, section 7.1)

use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroize;

use super::errors::{Result, RsaError};

/// Digest used for the label hash and for MGF1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes (hLen)
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Hash the concatenation of `parts`
    pub fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => digest_parts::<Sha256>(parts),
            HashAlgorithm::Sha384 => digest_parts::<Sha384>(parts),
            HashAlgorithm::Sha512 => digest_parts::<Sha512>(parts),
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// OAEP parameters: label digest, MGF1 digest and label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaepParams {
    pub hash: HashAlgorithm,
    pub mgf_hash: HashAlgorithm,
    pub label: Vec<u8>,
}

impl Default for OaepParams {
    fn default() -> Self {
        Self::new(HashAlgorithm::Sha512)
    }
}

impl OaepParams {
    /// Same digest for the label and MGF1, empty label
    pub fn new(hash: HashAlgorithm) -> Self {
        Self {
            hash,
            mgf_hash: hash,
            label: Vec::new(),
        }
    }

    pub fn with_mgf_hash(mut self, mgf_hash: HashAlgorithm) -> Self {
        self.mgf_hash = mgf_hash;
        self
    }

    pub fn with_label(mut self, label: impl Into<Vec<u8>>) -> Self {
        self.label = label.into();
        self
    }
}

/// MGF1 mask generation: hash(seed || counter) blocks, truncated to `mask_len`
pub fn mgf1(seed: &[u8], mask_len: usize, hash: HashAlgorithm) -> Vec<u8> {
    let mut mask = Vec::with_capacity(mask_len + hash.output_len());
    let mut counter = 0u32;

    while mask.len() < mask_len {
        mask.extend_from_slice(&hash.digest(&[seed, &counter.to_be_bytes()[..]]));
        counter += 1;
    }

    mask.truncate(mask_len);
    mask
}

fn xor_in_place(dst: &mut [u8], mask: &[u8]) {
    for (d, m) in dst.iter_mut().zip(mask) {
        *d ^= m;
    }
}

/// 1 if a == b, else 0, without branching on the values
fn ct_eq(a: u8, b: u8) -> u8 {
    let x = (a ^ b) as u16;
    (x.wrapping_sub(1) >> 8) as u8 & 1
}

/// OAEP encoding
/// Format: 0x00 || maskedSeed || maskedDB, where DB = lHash || PS || 0x01 || M
pub fn oaep_encode<R>(
    message: &[u8],
    modulus_bits: usize,
    params: &OaepParams,
    rng: &mut R,
) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let k = (modulus_bits + 7) / 8;
    let h_len = params.hash.output_len();

    let max = k.saturating_sub(2 * h_len + 2);
    if k < 2 * h_len + 2 || message.len() > max {
        return Err(RsaError::MessageTooLong {
            len: message.len(),
            max,
        });
    }

    // DB = lHash || PS || 0x01 || M
    let db_len = k - h_len - 1;
    let mut db = Vec::with_capacity(db_len);
    db.extend_from_slice(&params.hash.digest(&[params.label.as_slice()]));
    db.resize(db_len - message.len() - 1, 0);
    db.push(0x01);
    db.extend_from_slice(message);

    let mut seed = vec![0u8; h_len];
    rng.try_fill_bytes(&mut seed).map_err(RsaError::Generation)?;

    let db_mask = mgf1(&seed, db_len, params.mgf_hash);
    xor_in_place(&mut db, &db_mask);

    let seed_mask = mgf1(&db, h_len, params.mgf_hash);
    xor_in_place(&mut seed, &seed_mask);

    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.extend_from_slice(&seed);
    em.extend_from_slice(&db);

    seed.zeroize();
    db.zeroize();
    Ok(em)
}

/// OAEP decoding
///
/// Every structural problem yields the same `RsaError::Decoding`, and the
/// checks run to completion before the outcome is inspected.
pub fn oaep_decode(block: &[u8], modulus_bits: usize, params: &OaepParams) -> Result<Vec<u8>> {
    let k = (modulus_bits + 7) / 8;
    let h_len = params.hash.output_len();

    if block.len() != k || k < 2 * h_len + 2 {
        return Err(RsaError::Decoding);
    }

    let l_hash = params.hash.digest(&[params.label.as_slice()]);
    let (masked_seed, masked_db) = block[1..].split_at(h_len);

    let mut seed = masked_seed.to_vec();
    xor_in_place(&mut seed, &mgf1(masked_db, h_len, params.mgf_hash));

    let mut db = masked_db.to_vec();
    xor_in_place(&mut db, &mgf1(&seed, k - h_len - 1, params.mgf_hash));
    seed.zeroize();

    // Leading byte must be zero
    let mut bad = ct_eq(block[0], 0) ^ 1;

    // Label hash must match
    let mut diff = 0u8;
    for (a, b) in db[..h_len].iter().zip(&l_hash) {
        diff |= a ^ b;
    }
    bad |= ct_eq(diff, 0) ^ 1;

    // Zero padding, then the 0x01 separator
    let mut found = 0u8;
    let mut index = 0usize;
    for (i, &b) in db[h_len..].iter().enumerate() {
        let is_one = ct_eq(b, 0x01);
        let is_zero = ct_eq(b, 0x00);
        let first_one = is_one & !found & 1;
        index |= i & 0usize.wrapping_sub(first_one as usize);
        bad |= !found & !is_one & !is_zero & 1;
        found |= is_one;
    }
    bad |= !found & 1;

    if bad != 0 {
        db.zeroize();
        return Err(RsaError::Decoding);
    }

    let message = db[h_len + index + 1..].to_vec();
    db.zeroize();
    Ok(message)
}
