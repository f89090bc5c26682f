//! Value domains of the store.
//!
//! Encoding and decoding only ever touch values through the small
//! [`ValueAlgebra`] capability: the identity element, the group operation
//! and its inverse. This keeps the peeling and back-substitution code
//! domain-agnostic; a domain is selected by injecting its algebra into the
//! engine rather than by specializing the engine itself.
use std::fmt::Debug;

use curve25519_dalek::{RistrettoPoint, Scalar, traits::Identity};
use rand::{CryptoRng, Rng};

use crate::{block::Block, crypto::RngCompat};

/// An abelian group over the value domain of the store.
///
/// Implementations must satisfy the usual group laws:
/// `combine(a, identity()) == a`, `combine(a, invert(a)) == identity()` and
/// `combine` is associative and commutative.
pub trait ValueAlgebra {
    /// A single value of the domain. All values share one fixed
    /// representation and bit-width.
    type Value: Clone + PartialEq + Debug + Send + Sync;

    /// The neutral element under [`combine`](Self::combine).
    fn identity(&self) -> Self::Value;

    /// The group operation.
    fn combine(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// The group inverse, so that `combine(a, invert(a)) == identity()`.
    fn invert(&self, a: &Self::Value) -> Self::Value;

    /// Whether every value is its own inverse (characteristic-2 domains).
    ///
    /// The dense Gaussian fallback combines constraint rows over GF(2) and
    /// is only available for self-inverse domains.
    fn self_inverse(&self) -> bool {
        false
    }

    /// Bit-width of the value representation, used to validate a caller's
    /// statistical-security floor.
    fn value_bits(&self) -> u32;

    /// Sample a uniformly random value, used for randomized slot filling.
    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> Self::Value;
}

/// 128-bit blocks under XOR (the additive group of GF(2^128)).
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockAlgebra;

impl ValueAlgebra for BlockAlgebra {
    type Value = Block;

    #[inline]
    fn identity(&self) -> Block {
        Block::ZERO
    }

    #[inline]
    fn combine(&self, a: &Block, b: &Block) -> Block {
        *a ^ *b
    }

    #[inline]
    fn invert(&self, a: &Block) -> Block {
        *a
    }

    fn self_inverse(&self) -> bool {
        true
    }

    fn value_bits(&self) -> u32 {
        Block::BITS as u32
    }

    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> Block {
        rng.random()
    }
}

/// Fixed-width byte strings under XOR.
///
/// The width is part of the algebra: all values of one store share it.
#[derive(Debug, Clone, Copy)]
pub struct XorBytes {
    width: usize,
}

impl XorBytes {
    /// An XOR algebra over byte vectors of length `width`.
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// The fixed value width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl ValueAlgebra for XorBytes {
    type Value = Vec<u8>;

    fn identity(&self) -> Vec<u8> {
        vec![0; self.width]
    }

    fn combine(&self, a: &Vec<u8>, b: &Vec<u8>) -> Vec<u8> {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(a, b)| a ^ b).collect()
    }

    fn invert(&self, a: &Vec<u8>) -> Vec<u8> {
        a.clone()
    }

    fn self_inverse(&self) -> bool {
        true
    }

    fn value_bits(&self) -> u32 {
        8 * self.width as u32
    }

    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> Vec<u8> {
        let mut v = vec![0; self.width];
        rng.fill_bytes(&mut v);
        v
    }
}

/// Integers modulo the Mersenne prime 2^61 - 1, under addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zp64;

/// The modulus of [`Zp64`].
pub const ZP64_MODULUS: u64 = (1 << 61) - 1;

impl ValueAlgebra for Zp64 {
    type Value = u64;

    #[inline]
    fn identity(&self) -> u64 {
        0
    }

    #[inline]
    fn combine(&self, a: &u64, b: &u64) -> u64 {
        ((u128::from(*a) + u128::from(*b)) % u128::from(ZP64_MODULUS)) as u64
    }

    #[inline]
    fn invert(&self, a: &u64) -> u64 {
        (ZP64_MODULUS - a % ZP64_MODULUS) % ZP64_MODULUS
    }

    fn value_bits(&self) -> u32 {
        61
    }

    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> u64 {
        rng.random_range(0..ZP64_MODULUS)
    }
}

/// The curve25519 scalar field (integers modulo the Ristretto group order),
/// under addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZpScalar;

impl ValueAlgebra for ZpScalar {
    type Value = Scalar;

    #[inline]
    fn identity(&self) -> Scalar {
        Scalar::ZERO
    }

    #[inline]
    fn combine(&self, a: &Scalar, b: &Scalar) -> Scalar {
        a + b
    }

    #[inline]
    fn invert(&self, a: &Scalar) -> Scalar {
        -a
    }

    fn value_bits(&self) -> u32 {
        252
    }

    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> Scalar {
        Scalar::random(&mut RngCompat(rng))
    }
}

/// The Ristretto elliptic-curve group, under point addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ristretto;

impl ValueAlgebra for Ristretto {
    type Value = RistrettoPoint;

    #[inline]
    fn identity(&self) -> RistrettoPoint {
        RistrettoPoint::identity()
    }

    #[inline]
    fn combine(&self, a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
        a + b
    }

    #[inline]
    fn invert(&self, a: &RistrettoPoint) -> RistrettoPoint {
        -a
    }

    fn value_bits(&self) -> u32 {
        252
    }

    fn random<R: Rng + CryptoRng>(&self, rng: &mut R) -> RistrettoPoint {
        RistrettoPoint::random(&mut RngCompat(rng))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn check_group_laws<A: ValueAlgebra>(algebra: A) {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..20 {
            let a = algebra.random(&mut rng);
            let b = algebra.random(&mut rng);
            let c = algebra.random(&mut rng);
            assert_eq!(a, algebra.combine(&a, &algebra.identity()));
            assert_eq!(
                algebra.identity(),
                algebra.combine(&a, &algebra.invert(&a))
            );
            assert_eq!(algebra.combine(&a, &b), algebra.combine(&b, &a));
            assert_eq!(
                algebra.combine(&algebra.combine(&a, &b), &c),
                algebra.combine(&a, &algebra.combine(&b, &c))
            );
            if algebra.self_inverse() {
                assert_eq!(algebra.identity(), algebra.combine(&a, &a));
            }
        }
    }

    #[test]
    fn test_block_algebra_laws() {
        check_group_laws(BlockAlgebra);
    }

    #[test]
    fn test_xor_bytes_laws() {
        check_group_laws(XorBytes::new(13));
    }

    #[test]
    fn test_zp64_laws() {
        check_group_laws(Zp64);
    }

    #[test]
    fn test_zp_scalar_laws() {
        check_group_laws(ZpScalar);
    }

    #[test]
    fn test_ristretto_laws() {
        check_group_laws(Ristretto);
    }

    #[test]
    fn test_zp64_wraps_at_modulus() {
        let p = ZP64_MODULUS;
        assert_eq!(0, Zp64.combine(&(p - 1), &1));
        assert_eq!(1, Zp64.invert(&(p - 1)));
    }
}
