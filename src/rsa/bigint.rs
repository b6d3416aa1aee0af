// RSA Big Integer Operations
// Arbitrary precision arithmetic over 64-bit limbs for RSA-specific operations

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::{Add, Mul, Neg, Shl, Shr, Sub};

use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::errors::ArithmeticError;

const LIMB_BITS: usize = 64;

/// Unsigned big integer
///
/// Limbs are stored least significant first and kept normalized: the most
/// significant limb is never zero, so zero is the empty limb vector.
#[derive(Clone, Default, PartialEq, Eq, Hash, Zeroize)]
pub struct BigUint {
    limbs: Vec<u64>,
}

/// Signed big integer, sign and magnitude
///
/// Only what the extended Euclidean algorithm needs: addition, subtraction,
/// negation and scaling by an unsigned value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BigInt {
    negative: bool,
    magnitude: BigUint,
}

impl BigUint {
    fn from_limbs(limbs: Vec<u64>) -> Self {
        let mut n = Self { limbs };
        n.normalize();
        n
    }

    /// Remove high zero limbs
    fn normalize(&mut self) {
        while let Some(&0) = self.limbs.last() {
            self.limbs.pop();
        }
    }

    /// Create a big integer from u64
    pub fn from_u64(n: u64) -> Self {
        Self::from_limbs(vec![n])
    }

    /// Create a big integer from bytes (big-endian)
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let mut limbs = Vec::with_capacity(bytes.len() / 8 + 1);
        for chunk in bytes.rchunks(8) {
            let mut limb = 0u64;
            for &b in chunk {
                limb = (limb << 8) | b as u64;
            }
            limbs.push(limb);
        }
        Self::from_limbs(limbs)
    }

    /// Convert to bytes (big-endian), minimal length
    ///
    /// Zero encodes as a single zero byte.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        if self.limbs.is_empty() {
            return vec![0];
        }

        let mut bytes = Vec::with_capacity(self.limbs.len() * 8);
        for limb in self.limbs.iter().rev() {
            bytes.extend_from_slice(&limb.to_be_bytes());
        }

        // The top limb is non-zero, so at most 7 leading zero bytes
        let start = bytes.iter().take_while(|&&b| b == 0).count();
        bytes.drain(..start);
        bytes
    }

    /// Convert to exactly `len` big-endian bytes, left padded with zeros
    ///
    /// Returns None if the value does not fit.
    pub fn to_bytes_be_padded(&self, len: usize) -> Option<Vec<u8>> {
        if self.byte_len() > len {
            return None;
        }

        let mut out = vec![0u8; len];
        for (i, limb) in self.limbs.iter().enumerate() {
            for (j, b) in limb.to_le_bytes().iter().enumerate() {
                let pos = i * 8 + j;
                if pos < len {
                    out[len - 1 - pos] = *b;
                }
            }
        }
        Some(out)
    }

    /// Number of significant bits
    pub fn bits(&self) -> usize {
        match self.limbs.last() {
            Some(top) => self.limbs.len() * LIMB_BITS - top.leading_zeros() as usize,
            None => 0,
        }
    }

    /// Number of significant bytes
    pub fn byte_len(&self) -> usize {
        (self.bits() + 7) / 8
    }

    /// Test bit `i` (0 is the least significant bit)
    pub fn bit(&self, i: usize) -> bool {
        self.limbs
            .get(i / LIMB_BITS)
            .map_or(false, |limb| (limb >> (i % LIMB_BITS)) & 1 == 1)
    }

    /// Set bit `i`, growing the storage if needed
    pub fn set_bit(&mut self, i: usize) {
        let idx = i / LIMB_BITS;
        if idx >= self.limbs.len() {
            self.limbs.resize(idx + 1, 0);
        }
        self.limbs[idx] |= 1 << (i % LIMB_BITS);
    }

    pub fn is_odd(&self) -> bool {
        self.limbs.first().map_or(false, |limb| limb & 1 == 1)
    }

    pub fn is_even(&self) -> bool {
        !self.is_odd()
    }

    /// Subtraction that returns None instead of going negative
    pub fn checked_sub(&self, other: &BigUint) -> Option<BigUint> {
        if self < other {
            return None;
        }
        Some(Self::from_limbs(sub_limbs(&self.limbs, &other.limbs)))
    }

    /// Division with remainder: (self / divisor, self % divisor)
    pub fn div_rem(&self, divisor: &BigUint) -> Result<(BigUint, BigUint), ArithmeticError> {
        if divisor.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(self.div_rem_nonzero(divisor))
    }

    /// Remainder of self divided by `modulus`
    pub fn modulo(&self, modulus: &BigUint) -> Result<BigUint, ArithmeticError> {
        self.div_rem(modulus).map(|(_, r)| r)
    }

    /// Remainder of division by a single limb
    pub fn rem_u64(&self, divisor: u64) -> Result<u64, ArithmeticError> {
        if divisor == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(div_rem_small(&self.limbs, divisor).1)
    }

    // Caller guarantees a non-zero divisor
    fn div_rem_nonzero(&self, divisor: &BigUint) -> (BigUint, BigUint) {
        debug_assert!(!divisor.is_zero());

        if self < divisor {
            return (Self::zero(), self.clone());
        }

        if divisor.limbs.len() == 1 {
            let (q, r) = div_rem_small(&self.limbs, divisor.limbs[0]);
            return (Self::from_limbs(q), Self::from_u64(r));
        }

        let (q, r) = div_rem_knuth(&self.limbs, &divisor.limbs);
        (Self::from_limbs(q), Self::from_limbs(r))
    }

    /// Limbs zero-extended to `len`
    fn padded_limbs(&self, len: usize) -> Vec<u64> {
        let mut limbs = self.limbs.clone();
        limbs.resize(len.max(limbs.len()), 0);
        limbs
    }
}

// Low level limb routines, all little-endian

fn add_limbs(a: &[u64], b: &[u64]) -> Vec<u64> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut out = Vec::with_capacity(long.len() + 1);
    let mut carry = 0u64;
    for (i, &x) in long.iter().enumerate() {
        let y = short.get(i).copied().unwrap_or(0);
        let (s1, c1) = x.overflowing_add(y);
        let (s2, c2) = s1.overflowing_add(carry);
        out.push(s2);
        carry = (c1 | c2) as u64;
    }
    if carry != 0 {
        out.push(carry);
    }
    out
}

// Requires a >= b
fn sub_limbs(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len());
    let mut borrow = 0u64;
    for (i, &x) in a.iter().enumerate() {
        let y = b.get(i).copied().unwrap_or(0);
        let (d1, b1) = x.overflowing_sub(y);
        let (d2, b2) = d1.overflowing_sub(borrow);
        out.push(d2);
        borrow = (b1 | b2) as u64;
    }
    debug_assert_eq!(borrow, 0);
    out
}

// Schoolbook multiplication with u128 accumulation
fn mul_limbs(a: &[u64], b: &[u64]) -> Vec<u64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0u64; a.len() + b.len()];
    for (i, &x) in a.iter().enumerate() {
        let mut carry = 0u128;
        for (j, &y) in b.iter().enumerate() {
            let t = x as u128 * y as u128 + out[i + j] as u128 + carry;
            out[i + j] = t as u64;
            carry = t >> 64;
        }
        out[i + b.len()] = carry as u64;
    }
    out
}

fn shl_limbs(limbs: &[u64], shift: usize) -> Vec<u64> {
    if limbs.is_empty() {
        return Vec::new();
    }

    let limb_shift = shift / LIMB_BITS;
    let bit_shift = shift % LIMB_BITS;

    let mut out = vec![0u64; limb_shift];
    out.reserve(limbs.len() + 1);
    if bit_shift == 0 {
        out.extend_from_slice(limbs);
    } else {
        let mut carry = 0u64;
        for &limb in limbs {
            out.push((limb << bit_shift) | carry);
            carry = limb >> (LIMB_BITS - bit_shift);
        }
        if carry != 0 {
            out.push(carry);
        }
    }
    out
}

fn shr_limbs(limbs: &[u64], shift: usize) -> Vec<u64> {
    let limb_shift = shift / LIMB_BITS;
    if limb_shift >= limbs.len() {
        return Vec::new();
    }

    let bit_shift = shift % LIMB_BITS;
    let src = &limbs[limb_shift..];
    if bit_shift == 0 {
        return src.to_vec();
    }

    let mut out = Vec::with_capacity(src.len());
    for i in 0..src.len() {
        let high = src.get(i + 1).copied().unwrap_or(0);
        out.push((src[i] >> bit_shift) | (high << (LIMB_BITS - bit_shift)));
    }
    out
}

fn div_rem_small(u: &[u64], d: u64) -> (Vec<u64>, u64) {
    let mut q = vec![0u64; u.len()];
    let mut rem = 0u128;
    for i in (0..u.len()).rev() {
        let cur = (rem << 64) | u[i] as u128;
        q[i] = (cur / d as u128) as u64;
        rem = cur % d as u128;
    }
    (q, rem as u64)
}

/// Knuth, TAOCP vol. 2, 4.3.1 algorithm D
///
/// Requires v.len() >= 2, a normalized v and u >= v.
fn div_rem_knuth(u: &[u64], v: &[u64]) -> (Vec<u64>, Vec<u64>) {
    let n = v.len();
    let m = u.len() - n;
    let base = 1u128 << 64;

    // D1: normalize so the top divisor limb has its high bit set
    let shift = v[n - 1].leading_zeros() as usize;
    let vn = shl_limbs(v, shift);
    let mut un = shl_limbs(u, shift);
    un.resize(u.len() + 1, 0);

    let mut q = vec![0u64; m + 1];
    for j in (0..=m).rev() {
        // D3: estimate the quotient limb
        let num = ((un[j + n] as u128) << 64) | un[j + n - 1] as u128;
        let mut qhat = num / vn[n - 1] as u128;
        let mut rhat = num % vn[n - 1] as u128;
        while qhat >= base || qhat * vn[n - 2] as u128 > ((rhat << 64) | un[j + n - 2] as u128) {
            qhat -= 1;
            rhat += vn[n - 1] as u128;
            if rhat >= base {
                break;
            }
        }
        let mut qhat = qhat as u64;

        // D4: multiply and subtract
        let mut borrow = 0u64;
        let mut carry = 0u64;
        for i in 0..n {
            let p = qhat as u128 * vn[i] as u128 + carry as u128;
            carry = (p >> 64) as u64;
            let (d1, b1) = un[i + j].overflowing_sub(p as u64);
            let (d2, b2) = d1.overflowing_sub(borrow);
            un[i + j] = d2;
            borrow = (b1 | b2) as u64;
        }
        let (d1, b1) = un[j + n].overflowing_sub(carry);
        let (d2, b2) = d1.overflowing_sub(borrow);
        un[j + n] = d2;

        // D6: the estimate was one too large, add back
        if b1 | b2 {
            qhat -= 1;
            let mut carry = 0u64;
            for i in 0..n {
                let (s1, c1) = un[i + j].overflowing_add(vn[i]);
                let (s2, c2) = s1.overflowing_add(carry);
                un[i + j] = s2;
                carry = (c1 | c2) as u64;
            }
            un[j + n] = un[j + n].wrapping_add(carry);
        }

        q[j] = qhat;
    }

    // D8: unnormalize the remainder
    let r = shr_limbs(&un[..n], shift);
    (q, r)
}

/// Branch-free select: `b` where mask is all ones, `a` where it is zero
fn ct_select(a: &[u64], b: &[u64], mask: u64) -> Vec<u64> {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (y & mask) | (x & !mask))
        .collect()
}

/// Montgomery arithmetic modulo an odd modulus, R = 2^(64 * limbs)
struct Montgomery {
    modulus: Vec<u64>,
    // -modulus^(-1) mod 2^64
    n0_inv: u64,
    // R^2 mod modulus
    r2: Vec<u64>,
    // R mod modulus, the Montgomery form of 1
    one: Vec<u64>,
}

impl Montgomery {
    fn new(modulus: &BigUint) -> Self {
        debug_assert!(modulus.is_odd());
        let s = modulus.limbs.len();

        // Newton iteration, each step doubles the number of correct bits
        let n0 = modulus.limbs[0];
        let mut inv = n0;
        for _ in 0..6 {
            inv = inv.wrapping_mul(2u64.wrapping_sub(n0.wrapping_mul(inv)));
        }

        let r = BigUint::one() << (LIMB_BITS * s);
        let (_, r_mod) = r.div_rem_nonzero(modulus);
        let (_, r2) = (&r_mod * &r_mod).div_rem_nonzero(modulus);

        Self {
            modulus: modulus.limbs.clone(),
            n0_inv: inv.wrapping_neg(),
            r2: r2.padded_limbs(s),
            one: r_mod.padded_limbs(s),
        }
    }

    /// a * b * R^(-1) mod n, for a, b < n (CIOS method)
    fn mul(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let n = &self.modulus;
        let s = n.len();
        let mut t = vec![0u64; s + 2];

        for i in 0..s {
            let mut carry = 0u64;
            for j in 0..s {
                let uv = t[j] as u128 + a[i] as u128 * b[j] as u128 + carry as u128;
                t[j] = uv as u64;
                carry = (uv >> 64) as u64;
            }
            let uv = t[s] as u128 + carry as u128;
            t[s] = uv as u64;
            t[s + 1] = (uv >> 64) as u64;

            let m = t[0].wrapping_mul(self.n0_inv);
            let uv = t[0] as u128 + m as u128 * n[0] as u128;
            let mut carry = (uv >> 64) as u64;
            for j in 1..s {
                let uv = t[j] as u128 + m as u128 * n[j] as u128 + carry as u128;
                t[j - 1] = uv as u64;
                carry = (uv >> 64) as u64;
            }
            let uv = t[s] as u128 + carry as u128;
            t[s - 1] = uv as u64;
            t[s] = t[s + 1] + (uv >> 64) as u64;
            t[s + 1] = 0;
        }

        // t < 2n here; subtract n unless that goes negative
        let mut diff = vec![0u64; s];
        let mut borrow = 0u64;
        for j in 0..s {
            let (d1, b1) = t[j].overflowing_sub(n[j]);
            let (d2, b2) = d1.overflowing_sub(borrow);
            diff[j] = d2;
            borrow = (b1 | b2) as u64;
        }
        let (_, below) = t[s].overflowing_sub(borrow);
        let keep_t = 0u64.wrapping_sub(below as u64);
        let out = ct_select(&diff, &t[..s], keep_t);
        t.zeroize();
        diff.zeroize();
        out
    }

    fn to_mont(&self, x: &BigUint) -> Vec<u64> {
        self.mul(&x.padded_limbs(self.modulus.len()), &self.r2)
    }

    fn from_mont(&self, x: &[u64]) -> BigUint {
        let mut one = vec![0u64; self.modulus.len()];
        one[0] = 1;
        BigUint::from_limbs(self.mul(x, &one))
    }
}

/// Modular exponentiation: base^exp mod modulus
///
/// Square-and-multiply with a fixed structure: every bit position of the
/// exponent's limbs costs one squaring and one multiplication, and the
/// product is kept or dropped by a mask, never by a branch.
pub fn mod_pow(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> Result<BigUint, ArithmeticError> {
    if modulus.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }
    if modulus.is_one() {
        return Ok(BigUint::zero());
    }

    let mut base = base.modulo(modulus)?;
    let result = if modulus.is_odd() {
        mod_pow_montgomery(&base, exp, modulus)
    } else {
        mod_pow_plain(&base, exp, modulus)
    };
    base.zeroize();
    Ok(result)
}

fn exp_mask(exp: &BigUint, i: usize) -> u64 {
    0u64.wrapping_sub((exp.limbs[i / LIMB_BITS] >> (i % LIMB_BITS)) & 1)
}

fn mod_pow_montgomery(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    let ctx = Montgomery::new(modulus);
    let mut b = ctx.to_mont(base);
    let mut acc = ctx.one.clone();

    for i in (0..exp.limbs.len() * LIMB_BITS).rev() {
        let squared = ctx.mul(&acc, &acc);
        let product = ctx.mul(&squared, &b);
        acc = ct_select(&squared, &product, exp_mask(exp, i));
    }

    let result = ctx.from_mont(&acc);
    acc.zeroize();
    b.zeroize();
    result
}

// Even moduli never occur in RSA itself; same loop shape, division reduction
fn mod_pow_plain(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    let s = modulus.limbs.len();
    let mut acc = BigUint::one().padded_limbs(s);

    for i in (0..exp.limbs.len() * LIMB_BITS).rev() {
        let current = BigUint::from_limbs(acc.clone());
        let (_, squared) = (&current * &current).div_rem_nonzero(modulus);
        let (_, product) = (&squared * base).div_rem_nonzero(modulus);
        acc = ct_select(&squared.padded_limbs(s), &product.padded_limbs(s), exp_mask(exp, i));
    }

    BigUint::from_limbs(acc)
}

/// Modular multiplication: a * b mod modulus
pub fn mod_mul(a: &BigUint, b: &BigUint, modulus: &BigUint) -> Result<BigUint, ArithmeticError> {
    (a * b).modulo(modulus)
}

/// Greatest common divisor
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        let (_, r) = a.div_rem_nonzero(&b);
        a = mem::replace(&mut b, r);
    }
    a
}

/// Least common multiple
pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    if a.is_zero() || b.is_zero() {
        return BigUint::zero();
    }
    let (q, _) = a.div_rem_nonzero(&gcd(a, b));
    &q * b
}

/// Extended Euclidean Algorithm
/// Returns (gcd, x, y) such that a*x + b*y = gcd(a, b)
pub fn extended_gcd(a: &BigUint, b: &BigUint) -> (BigUint, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let (q, rem) = old_r.div_rem_nonzero(&r);
        old_r = mem::replace(&mut r, rem);

        let next_s = &old_s - &s.mul_unsigned(&q);
        old_s = mem::replace(&mut s, next_s);

        let next_t = &old_t - &t.mul_unsigned(&q);
        old_t = mem::replace(&mut t, next_t);
    }

    (old_r, old_s, old_t)
}

/// Compute modular inverse: a^(-1) mod m
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint, ArithmeticError> {
    if m.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }

    let a = a.modulo(m)?;
    let (g, x, _) = extended_gcd(&a, m);
    if !g.is_one() {
        return Err(ArithmeticError::NotInvertible);
    }
    x.rem_euclid(m)
}

/// Random integer of at most `bits` bits, drawn from a secure source
pub fn random_bits<R>(bits: usize, rng: &mut R) -> Result<BigUint, rand::Error>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let byte_len = (bits + 7) / 8;
    let mut bytes = vec![0u8; byte_len];
    rng.try_fill_bytes(&mut bytes)?;

    let excess = byte_len * 8 - bits;
    if excess > 0 {
        bytes[0] &= 0xff >> excess;
    }

    let value = BigUint::from_bytes_be(&bytes);
    bytes.zeroize();
    Ok(value)
}

/// Uniform random integer in [0, bound) by rejection sampling
///
/// A zero bound yields zero.
pub fn random_below<R>(bound: &BigUint, rng: &mut R) -> Result<BigUint, rand::Error>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if bound.is_zero() {
        return Ok(BigUint::zero());
    }
    loop {
        let candidate = random_bits(bound.bits(), rng)?;
        if &candidate < bound {
            return Ok(candidate);
        }
    }
}

impl BigInt {
    fn new(negative: bool, magnitude: BigUint) -> Self {
        // Zero is never negative
        let negative = negative && !magnitude.is_zero();
        Self { negative, magnitude }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::from(BigUint::one())
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> &BigUint {
        &self.magnitude
    }

    /// Multiply by an unsigned value
    pub fn mul_unsigned(&self, k: &BigUint) -> BigInt {
        Self::new(self.negative, &self.magnitude * k)
    }

    /// Least non-negative residue modulo `m`
    pub fn rem_euclid(&self, m: &BigUint) -> Result<BigUint, ArithmeticError> {
        let r = self.magnitude.modulo(m)?;
        if self.negative && !r.is_zero() {
            Ok(m - &r)
        } else {
            Ok(r)
        }
    }
}

impl From<BigUint> for BigInt {
    fn from(magnitude: BigUint) -> Self {
        Self::new(false, magnitude)
    }
}

impl From<u64> for BigUint {
    fn from(n: u64) -> Self {
        Self::from_u64(n)
    }
}

impl Zero for BigUint {
    fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }
}

impl One for BigUint {
    fn one() -> Self {
        Self { limbs: vec![1] }
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        // Normalized, so more limbs means larger
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl<'a> Add<&'a BigUint> for &BigUint {
    type Output = BigUint;

    fn add(self, other: &'a BigUint) -> BigUint {
        BigUint::from_limbs(add_limbs(&self.limbs, &other.limbs))
    }
}

impl Add for BigUint {
    type Output = BigUint;

    fn add(self, other: BigUint) -> BigUint {
        &self + &other
    }
}

impl<'a> Sub<&'a BigUint> for &BigUint {
    type Output = BigUint;

    /// Panics if the result would be negative, like primitive unsigned integers
    fn sub(self, other: &'a BigUint) -> BigUint {
        match self.checked_sub(other) {
            Some(diff) => diff,
            None => panic!("attempt to subtract with overflow"),
        }
    }
}

impl Sub for BigUint {
    type Output = BigUint;

    fn sub(self, other: BigUint) -> BigUint {
        &self - &other
    }
}

impl<'a> Mul<&'a BigUint> for &BigUint {
    type Output = BigUint;

    fn mul(self, other: &'a BigUint) -> BigUint {
        BigUint::from_limbs(mul_limbs(&self.limbs, &other.limbs))
    }
}

impl Mul for BigUint {
    type Output = BigUint;

    fn mul(self, other: BigUint) -> BigUint {
        &self * &other
    }
}

impl Shl<usize> for &BigUint {
    type Output = BigUint;

    fn shl(self, shift: usize) -> BigUint {
        BigUint::from_limbs(shl_limbs(&self.limbs, shift))
    }
}

impl Shl<usize> for BigUint {
    type Output = BigUint;

    fn shl(self, shift: usize) -> BigUint {
        &self << shift
    }
}

impl Shr<usize> for &BigUint {
    type Output = BigUint;

    fn shr(self, shift: usize) -> BigUint {
        BigUint::from_limbs(shr_limbs(&self.limbs, shift))
    }
}

impl Shr<usize> for BigUint {
    type Output = BigUint;

    fn shr(self, shift: usize) -> BigUint {
        &self >> shift
    }
}

impl<'a> Add<&'a BigInt> for &BigInt {
    type Output = BigInt;

    fn add(self, other: &'a BigInt) -> BigInt {
        if self.negative == other.negative {
            return BigInt::new(self.negative, &self.magnitude + &other.magnitude);
        }
        match self.magnitude.cmp(&other.magnitude) {
            Ordering::Less => BigInt::new(other.negative, &other.magnitude - &self.magnitude),
            _ => BigInt::new(self.negative, &self.magnitude - &other.magnitude),
        }
    }
}

impl<'a> Sub<&'a BigInt> for &BigInt {
    type Output = BigInt;

    fn sub(self, other: &'a BigInt) -> BigInt {
        self + &(-other.clone())
    }
}

impl Neg for BigInt {
    type Output = BigInt;

    fn neg(self) -> BigInt {
        BigInt::new(!self.negative, self.magnitude)
    }
}

impl fmt::Display for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.pad_integral(true, "", "0");
        }

        // Peel off 19 decimal digits at a time
        const CHUNK: u64 = 10_000_000_000_000_000_000;
        let mut chunks = Vec::new();
        let mut rest = self.limbs.clone();
        while !rest.is_empty() {
            let (q, r) = div_rem_small(&rest, CHUNK);
            chunks.push(r);
            rest = BigUint::from_limbs(q).limbs;
        }

        let mut digits = String::new();
        for (i, chunk) in chunks.iter().rev().enumerate() {
            if i == 0 {
                digits.push_str(&chunk.to_string());
            } else {
                digits.push_str(&format!("{:019}", chunk));
            }
        }
        f.pad_integral(true, "", &digits)
    }
}

impl fmt::LowerHex for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = hex::encode(self.to_bytes_be());
        let digits = digits.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        f.pad_integral(true, "0x", digits)
    }
}

impl fmt::Debug for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigUint({:#x})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn from_u64(n: u64) -> BigUint {
        BigUint::from_u64(n)
    }

    fn to_oracle(n: &BigUint) -> num_bigint::BigUint {
        num_bigint::BigUint::from_bytes_be(&n.to_bytes_be())
    }

    fn from_oracle(n: &num_bigint::BigUint) -> BigUint {
        BigUint::from_bytes_be(&n.to_bytes_be())
    }

    #[test]
    fn test_bytes_roundtrip() {
        let bytes = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x10];
        let n = BigUint::from_bytes_be(&bytes);
        assert_eq!(n.to_bytes_be(), bytes.to_vec());

        // Leading zeros are dropped
        let n = BigUint::from_bytes_be(&[0x00, 0x00, 0x42]);
        assert_eq!(n, from_u64(0x42));
        assert_eq!(n.to_bytes_be(), vec![0x42]);

        assert_eq!(BigUint::zero().to_bytes_be(), vec![0]);
        assert!(BigUint::from_bytes_be(&[]).is_zero());
    }

    #[test]
    fn test_padded_bytes() {
        let n = from_u64(0x0102);
        assert_eq!(n.to_bytes_be_padded(4), Some(vec![0, 0, 1, 2]));
        assert_eq!(n.to_bytes_be_padded(1), None);
        assert_eq!(BigUint::zero().to_bytes_be_padded(2), Some(vec![0, 0]));
    }

    #[test]
    fn test_bits() {
        assert_eq!(BigUint::zero().bits(), 0);
        assert_eq!(from_u64(1).bits(), 1);
        assert_eq!(from_u64(0xff).bits(), 8);
        assert_eq!((BigUint::one() << 130).bits(), 131);

        let mut n = BigUint::zero();
        n.set_bit(100);
        assert!(n.bit(100));
        assert!(!n.bit(99));
        assert_eq!(n.bits(), 101);
    }

    #[test]
    fn test_add_sub_carry() {
        let a = from_u64(u64::MAX);
        let sum = &a + &from_u64(1);
        assert_eq!(sum, BigUint::one() << 64);
        assert_eq!(&sum - &from_u64(1), a);
        assert_eq!(from_u64(3).checked_sub(&from_u64(5)), None);
    }

    #[test]
    fn test_mul() {
        let a = from_u64(0xffff_ffff_ffff_ffff);
        let product = &a * &a;
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        let expected = &(&(BigUint::one() << 128) - &(BigUint::one() << 65)) + &BigUint::one();
        assert_eq!(product, expected);
        assert!((&a * &BigUint::zero()).is_zero());
    }

    #[test]
    fn test_div_rem_small() {
        let (q, r) = from_u64(100).div_rem(&from_u64(7)).unwrap();
        assert_eq!(q, from_u64(14));
        assert_eq!(r, from_u64(2));
        assert_eq!(from_u64(100).rem_u64(7).unwrap(), 2);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            from_u64(5).div_rem(&BigUint::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
        assert_eq!(from_u64(5).rem_u64(0), Err(ArithmeticError::DivisionByZero));
        assert_eq!(
            mod_pow(&from_u64(2), &from_u64(3), &BigUint::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
        assert_eq!(
            mod_inverse(&from_u64(3), &BigUint::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_div_rem_matches_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for (a_bits, b_bits) in [(256, 130), (1024, 512), (2048, 64), (600, 599), (4096, 2048)] {
            let a = random_bits(a_bits, &mut rng).unwrap();
            let b = &random_bits(b_bits, &mut rng).unwrap() + &BigUint::one();
            let (q, r) = a.div_rem(&b).unwrap();
            let (eq, er) = to_oracle(&a).div_rem(&to_oracle(&b));
            assert_eq!(to_oracle(&q), eq);
            assert_eq!(to_oracle(&r), er);
            assert_eq!(&(&q * &b) + &r, a);
        }
    }

    #[test]
    fn test_mod_pow() {
        // 3^5 mod 7 = 243 mod 7 = 5
        let result = mod_pow(&from_u64(3), &from_u64(5), &from_u64(7)).unwrap();
        assert_eq!(result, from_u64(5));

        // Even modulus takes the plain path: 7^10 mod 12 = 1
        let result = mod_pow(&from_u64(7), &from_u64(10), &from_u64(12)).unwrap();
        assert_eq!(result, from_u64(1));

        // Zero exponent and unit modulus
        assert_eq!(mod_pow(&from_u64(9), &BigUint::zero(), &from_u64(11)).unwrap(), from_u64(1));
        assert!(mod_pow(&from_u64(9), &from_u64(4), &from_u64(1)).unwrap().is_zero());
    }

    #[test]
    fn test_mod_pow_matches_reference() {
        let mut rng = StdRng::seed_from_u64(11);
        for bits in [64, 127, 512, 1024] {
            let mut modulus = random_bits(bits, &mut rng).unwrap();
            modulus.set_bit(bits - 1);
            for odd in [true, false] {
                let modulus = if odd == modulus.is_odd() {
                    modulus.clone()
                } else {
                    &modulus + &BigUint::one()
                };
                let base = random_bits(bits + 17, &mut rng).unwrap();
                let exp = random_bits(bits, &mut rng).unwrap();
                let result = mod_pow(&base, &exp, &modulus).unwrap();
                let expected = to_oracle(&base).modpow(&to_oracle(&exp), &to_oracle(&modulus));
                assert_eq!(result, from_oracle(&expected));
                assert!(result < modulus);
            }
        }
    }

    #[test]
    fn test_mod_inverse() {
        // 3 * 5 = 15 ≡ 1 mod 7, so inverse of 3 mod 7 is 5
        let a = from_u64(3);
        let m = from_u64(7);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!(inv, from_u64(5));
        assert_eq!(mod_mul(&a, &inv, &m).unwrap(), BigUint::one());

        assert_eq!(
            mod_inverse(&from_u64(6), &from_u64(9)),
            Err(ArithmeticError::NotInvertible)
        );
    }

    #[test]
    fn test_mod_inverse_matches_reference() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut m = random_bits(1024, &mut rng).unwrap();
        m.set_bit(0);
        for _ in 0..8 {
            let a = random_below(&m, &mut rng).unwrap();
            match mod_inverse(&a, &m) {
                Ok(inv) => {
                    assert_eq!(mod_mul(&a, &inv, &m).unwrap(), BigUint::one());
                    assert!(inv < m);
                }
                Err(ArithmeticError::NotInvertible) => {
                    assert!(!to_oracle(&a).gcd(&to_oracle(&m)).is_one());
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    // Signed product a * b for the Bezout identity check
    fn signed_mul(a: &BigUint, b: &BigInt) -> BigInt {
        let product = BigInt::from(a.clone()).mul_unsigned(b.magnitude());
        if b.is_negative() {
            -product
        } else {
            product
        }
    }

    #[test]
    fn test_extended_gcd_identity() {
        let a = from_u64(240);
        let b = from_u64(46);
        let (g, x, y) = extended_gcd(&a, &b);
        assert_eq!(g, from_u64(2));
        assert_eq!(&signed_mul(&a, &x) + &signed_mul(&b, &y), BigInt::from(g));
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(&from_u64(12), &from_u64(18)), from_u64(6));
        assert_eq!(lcm(&from_u64(4), &from_u64(6)), from_u64(12));
        assert!(lcm(&BigUint::zero(), &from_u64(6)).is_zero());
    }

    #[test]
    fn test_signed_arithmetic() {
        let five = BigInt::from(from_u64(5));
        let three = BigInt::from(from_u64(3));
        let diff = &three - &five;
        assert!(diff.is_negative());
        assert_eq!(diff.magnitude(), &from_u64(2));
        assert_eq!(diff.rem_euclid(&from_u64(7)).unwrap(), from_u64(5));
        assert!(!(&five - &five).is_negative());
    }

    #[test]
    fn test_random_bits_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for bits in [1, 7, 8, 63, 64, 65, 1000] {
            let n = random_bits(bits, &mut rng).unwrap();
            assert!(n.bits() <= bits);
        }
        let bound = from_u64(10);
        for _ in 0..50 {
            assert!(random_below(&bound, &mut rng).unwrap() < bound);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(BigUint::zero().to_string(), "0");
        assert_eq!(from_u64(1234567890).to_string(), "1234567890");
        let big = BigUint::one() << 100;
        assert_eq!(big.to_string(), "1267650600228229401496703205376");
        assert_eq!(format!("{:x}", from_u64(0xabc)), "abc");
    }
}
