// RSA Encryption Implementation
// Implements RSA encryption with OAEP padding

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::bigint::{mod_pow, BigUint};
use super::errors::{Result, RsaError};
use super::keygen::{KeyKind, RsaKey};
use super::padding::{oaep_encode, OaepParams};

/// Raw RSA transform: block^exponent mod modulus
///
/// Used in both directions. The block is read as a big-endian integer that
/// must be smaller than the modulus; the output is always `key.size()` bytes.
pub fn rsa_transform(block: &[u8], key: &RsaKey) -> Result<Vec<u8>> {
    let m = BigUint::from_bytes_be(block);
    if &m >= key.modulus() {
        return Err(RsaError::Decoding);
    }

    // Compute c = m^e mod n (or m = c^d mod n)
    let c = mod_pow(&m, key.exponent(), key.modulus())?;

    // Pad with leading zeros to match key size
    c.to_bytes_be_padded(key.size()).ok_or(RsaError::Decoding)
}

/// Encrypt bytes using RSA public key
/// OAEP with SHA-512 and MGF1-SHA-512, seeded from the OS random source
pub fn encrypt(plaintext: &[u8], public_key: &RsaKey) -> Result<Vec<u8>> {
    encrypt_with(plaintext, public_key, &OaepParams::default(), &mut OsRng)
}

/// Encrypt bytes with explicit OAEP parameters and random source
pub fn encrypt_with<R>(
    plaintext: &[u8],
    public_key: &RsaKey,
    params: &OaepParams,
    rng: &mut R,
) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if public_key.kind() != KeyKind::Public {
        return Err(RsaError::WrongKeyKind {
            expected: KeyKind::Public,
            actual: public_key.kind(),
        });
    }

    // Apply OAEP padding
    let padded = oaep_encode(plaintext, public_key.modulus_bits(), params, rng)?;

    rsa_transform(&padded, public_key)
}

/// Encrypt a string using RSA public key
pub fn encrypt_string(plaintext: &str, public_key: &RsaKey) -> Result<Vec<u8>> {
    encrypt(plaintext.as_bytes(), public_key)
}
