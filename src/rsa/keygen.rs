// RSA Key Generation
// Implements RSA key pair generation (public and private keys)

use std::fmt;

use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use super::bigint::{gcd, lcm, mod_inverse, mod_pow, BigUint};
use super::errors::{ArithmeticError, Result, RsaError};
use super::padding::OaepParams;
use super::prime::{generate_prime, DEFAULT_MR_ROUNDS};

/// Smallest modulus accepted by the key pair builder
pub const MIN_KEY_BITS: usize = 512;

/// Modulus size used unless configured otherwise
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Fixed public exponent F4
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65537;

/// Resampling budget before giving up on a key pair
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

// |p - q| must have more than half_bits - 100 bits
const MIN_PRIME_DISTANCE_SHORTFALL: usize = 100;

/// Which half of a key pair a key is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Public,
    Private,
}

impl KeyKind {
    /// Tag byte used in serialized key records
    pub fn tag(self) -> u8 {
        match self {
            KeyKind::Public => 0x01,
            KeyKind::Private => 0x02,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(KeyKind::Public),
            0x02 => Some(KeyKind::Private),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => f.write_str("public"),
            KeyKind::Private => f.write_str("private"),
        }
    }
}

/// RSA key: modulus, exponent and kind
///
/// Immutable once built. The exponent is wiped when the key is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKey {
    modulus: BigUint,
    exponent: BigUint,
    kind: KeyKind,
}

impl RsaKey {
    /// Build a key, checking that the numbers can form an RSA key
    pub fn new(kind: KeyKind, modulus: BigUint, exponent: BigUint) -> Result<Self> {
        if modulus <= BigUint::one() || modulus.is_even() {
            return Err(RsaError::InvalidKey("modulus must be odd and greater than one"));
        }
        if exponent.is_zero() || exponent >= modulus {
            return Err(RsaError::InvalidKey("exponent must lie in [1, modulus)"));
        }

        Ok(Self {
            modulus,
            exponent,
            kind,
        })
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Get the bit length of the modulus
    pub fn modulus_bits(&self) -> usize {
        self.modulus.bits()
    }

    /// Byte length of the modulus, which is also the ciphertext length
    pub fn size(&self) -> usize {
        self.modulus.byte_len()
    }

    /// Longest plaintext that fits one OAEP block under `params`
    pub fn max_message_len(&self, params: &OaepParams) -> usize {
        self.size().saturating_sub(2 * params.hash.output_len() + 2)
    }

    /// Encrypt a message using this public key
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        super::encrypt::encrypt(plaintext, self)
    }

    /// Decrypt a ciphertext using this private key
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        super::decrypt::decrypt(ciphertext, self)
    }
}

impl Drop for RsaKey {
    fn drop(&mut self) {
        self.exponent.zeroize();
    }
}

impl fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RsaKey");
        s.field("kind", &self.kind)
            .field("modulus_bits", &self.modulus_bits())
            .field("modulus", &self.modulus);
        match self.kind {
            KeyKind::Public => s.field("exponent", &self.exponent),
            KeyKind::Private => s.field("exponent", &"<redacted>"),
        };
        s.finish()
    }
}

/// RSA Key Pair (both public and private keys)
///
/// Only built through `from_keys` or generation, so the two halves always
/// share one modulus and invert each other.
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    public_key: RsaKey,
    private_key: RsaKey,
    bit_length: usize,
}

impl RsaKeyPair {
    /// Pair two keys, checking kinds, shared modulus and that they invert each other
    pub fn from_keys(public_key: RsaKey, private_key: RsaKey) -> Result<Self> {
        let bit_length = public_key.modulus_bits();
        let pair = Self {
            public_key,
            private_key,
            bit_length,
        };
        pair.validate()?;
        Ok(pair)
    }

    pub fn public_key(&self) -> &RsaKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &RsaKey {
        &self.private_key
    }

    /// Get the bit length of the key
    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// Check that the two halves belong together
    pub fn validate(&self) -> Result<()> {
        if self.public_key.kind != KeyKind::Public {
            return Err(RsaError::WrongKeyKind {
                expected: KeyKind::Public,
                actual: self.public_key.kind,
            });
        }
        if self.private_key.kind != KeyKind::Private {
            return Err(RsaError::WrongKeyKind {
                expected: KeyKind::Private,
                actual: self.private_key.kind,
            });
        }
        if self.public_key.modulus != self.private_key.modulus {
            return Err(RsaError::InvalidKey("public and private modulus differ"));
        }

        // (m^e)^d must give m back
        let n = &self.public_key.modulus;
        let probe = BigUint::from_u64(0x5a5a_5a5a_5a5a_5a5a).modulo(n)?;
        let c = mod_pow(&probe, &self.public_key.exponent, n)?;
        if mod_pow(&c, &self.private_key.exponent, n)? != probe {
            return Err(RsaError::InvalidKey("exponents are not inverses of each other"));
        }
        Ok(())
    }
}

/// Configuration for key pair generation
#[derive(Clone, Debug)]
pub struct KeyGenConfig {
    pub bit_length: usize,
    pub public_exponent: u64,
    pub mr_rounds: u32,
    pub max_attempts: u32,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        Self {
            bit_length: DEFAULT_KEY_BITS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            mr_rounds: DEFAULT_MR_ROUNDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl KeyGenConfig {
    pub fn with_bit_length(mut self, bit_length: usize) -> Self {
        self.bit_length = bit_length;
        self
    }

    pub fn with_public_exponent(mut self, e: u64) -> Self {
        self.public_exponent = e;
        self
    }

    pub fn with_mr_rounds(mut self, rounds: u32) -> Self {
        self.mr_rounds = rounds;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Generate RSA key pair with specified modulus bit length
///
/// Uses the operating system's random source and e = 65537.
pub fn generate_keypair(bit_length: usize) -> Result<RsaKeyPair> {
    let config = KeyGenConfig::default().with_bit_length(bit_length);
    generate_keypair_with(&config, &mut OsRng)
}

/// Generate RSA key pair with default settings (4096 bits, e=65537)
pub fn generate_default_keypair() -> Result<RsaKeyPair> {
    generate_keypair(DEFAULT_KEY_BITS)
}

/// Generate RSA key pair from an explicit configuration and random source
pub fn generate_keypair_with<R>(config: &KeyGenConfig, rng: &mut R) -> Result<RsaKeyPair>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let bits = config.bit_length;
    if bits < MIN_KEY_BITS {
        return Err(RsaError::InvalidKeySize {
            bits,
            min: MIN_KEY_BITS,
        });
    }
    if config.public_exponent < 3 || config.public_exponent % 2 == 0 {
        return Err(RsaError::InvalidKey("public exponent must be odd and at least 3"));
    }

    let e = BigUint::from_u64(config.public_exponent);
    let p_bits = (bits + 1) / 2;
    let q_bits = bits / 2;

    info!(bits, rounds = config.mr_rounds, "generating RSA key pair");

    for attempt in 1..=config.max_attempts {
        // Step 1: Generate two random primes p and q
        let mut p = generate_prime(p_bits, config.mr_rounds, rng)?;
        let mut q = generate_prime(q_bits, config.mr_rounds, rng)?;

        let derived = derive_keypair(&p, &q, &e, bits);
        p.zeroize();
        q.zeroize();

        match derived? {
            Some(pair) => {
                info!(bits, attempt, "key pair generated");
                return Ok(pair);
            }
            None => debug!(attempt, "prime pair rejected, resampling"),
        }
    }

    warn!(attempts = config.max_attempts, "key generation budget exhausted");
    Err(RsaError::KeyGeneration {
        attempts: config.max_attempts,
    })
}

/// Derive the key pair from two primes, or None if they must be resampled
fn derive_keypair(p: &BigUint, q: &BigUint, e: &BigUint, bits: usize) -> Result<Option<RsaKeyPair>> {
    // Equal or close primes make n easy to factor
    if p == q {
        return Ok(None);
    }
    let distance = if p > q { p - q } else { q - p };
    if distance.bits() <= p.bits().saturating_sub(MIN_PRIME_DISTANCE_SHORTFALL) {
        return Ok(None);
    }

    // Step 2: Compute n = p * q
    let n = p * q;
    if n.bits() != bits {
        return Ok(None);
    }

    // Step 3: Compute λ(n) = lcm(p-1, q-1)
    let one = BigUint::one();
    let mut lambda = lcm(&(p - &one), &(q - &one));

    // Step 4: e must be coprime with λ(n)
    if !gcd(e, &lambda).is_one() {
        lambda.zeroize();
        return Ok(None);
    }

    // Step 5: Compute d = e^(-1) mod λ(n)
    let d = match mod_inverse(e, &lambda) {
        Ok(d) => d,
        Err(ArithmeticError::NotInvertible) => {
            lambda.zeroize();
            return Ok(None);
        }
        Err(err) => {
            lambda.zeroize();
            return Err(err.into());
        }
    };
    lambda.zeroize();

    let public_key = RsaKey::new(KeyKind::Public, n.clone(), e.clone())?;
    let private_key = RsaKey::new(KeyKind::Private, n, d)?;

    match RsaKeyPair::from_keys(public_key, private_key) {
        Ok(pair) => Ok(Some(pair)),
        Err(RsaError::InvalidKey(reason)) => {
            warn!(reason, "derived key pair failed validation");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
