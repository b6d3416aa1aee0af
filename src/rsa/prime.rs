// Prime Generation
// Random probable primes via trial division and Miller-Rabin

use std::sync::OnceLock;

use num_traits::One;
use rand::{CryptoRng, RngCore};
use tracing::trace;
use zeroize::Zeroize;

use super::bigint::{mod_mul, mod_pow, random_below, random_bits, BigUint};
use super::errors::{Result, RsaError};

/// Miller-Rabin rounds used unless configured otherwise.
/// A composite survives with probability at most 4^(-rounds).
pub const DEFAULT_MR_ROUNDS: u32 = 40;

// Odd primes below this bound are used for trial division
const SIEVE_LIMIT: usize = 2000;

fn small_primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        let mut composite = vec![false; SIEVE_LIMIT];
        let mut primes = Vec::new();
        for i in 3..SIEVE_LIMIT {
            if composite[i] {
                continue;
            }
            if i % 2 == 1 {
                primes.push(i as u64);
            }
            let mut j = i * i;
            while j < SIEVE_LIMIT {
                composite[j] = true;
                j += i;
            }
        }
        primes
    })
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime after `rounds` random witnesses
pub fn is_probable_prime<R>(n: &BigUint, rounds: u32, rng: &mut R) -> Result<bool>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let two = BigUint::from_u64(2);
    if n < &two {
        return Ok(false);
    }
    if n == &two || n == &BigUint::from_u64(3) {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }

    // Cheap rejection before any exponentiation
    for &p in small_primes() {
        if n == &BigUint::from_u64(p) {
            return Ok(true);
        }
        if n.rem_u64(p)? == 0 {
            return Ok(false);
        }
    }

    // Write n-1 as d * 2^s with d odd
    let n_minus_one = n - &BigUint::one();
    let mut s = 0usize;
    while !n_minus_one.bit(s) {
        s += 1;
    }
    let d = &n_minus_one >> s;

    // Witnesses are drawn from [2, n-2]
    let witness_range = n - &BigUint::from_u64(3);

    'witness: for _ in 0..rounds {
        let a = &random_below(&witness_range, rng).map_err(RsaError::Generation)? + &two;

        let mut x = mod_pow(&a, &d, n)?;
        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = mod_mul(&x, &x, n)?;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        // Composite
        return Ok(false);
    }

    // Probably prime
    Ok(true)
}

/// Generate a random probable prime of exactly `bit_length` bits
///
/// The two most significant bits are set, so the product of two primes
/// of a and b bits always has exactly a + b bits.
pub fn generate_prime<R>(bit_length: usize, rounds: u32, rng: &mut R) -> Result<BigUint>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if bit_length < 2 {
        return Err(RsaError::InvalidKeySize { bits: bit_length, min: 2 });
    }

    let mut candidates = 0u64;
    loop {
        candidates += 1;

        let mut candidate = random_bits(bit_length, rng).map_err(RsaError::Generation)?;
        candidate.set_bit(bit_length - 1);
        candidate.set_bit(bit_length.saturating_sub(2));
        candidate.set_bit(0);

        if is_probable_prime(&candidate, rounds, rng)? {
            trace!(bit_length, candidates, "found probable prime");
            return Ok(candidate);
        }

        candidate.zeroize();
    }
}
