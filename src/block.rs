//! A 128-bit [`Block`] type.
//!
//! `Block` is the default value representation of the store: a fixed-width
//! 128-bit element of the XOR group GF(2)^128. Operations use SIMD
//! instructions where possible.
use std::{
    fmt,
    ops::{BitXor, BitXorAssign},
};

use bytemuck::{Pod, Zeroable};
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use wide::u8x16;

/// A 128-bit block. Uses SIMD operations where available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct Block(u8x16);

impl Block {
    /// All bits set to 0. The identity of the XOR group.
    pub const ZERO: Self = Self(u8x16::ZERO);
    /// All bits set to 1.
    pub const ONES: Self = Self(u8x16::MAX);

    /// 16 bytes in a Block.
    pub const BYTES: usize = 16;
    /// 128 bits in a Block.
    pub const BITS: usize = 128;

    /// Create a new block from bytes.
    #[inline]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(u8x16::new(bytes))
    }

    /// Bytes of the block.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_array_ref()
    }

    /// Mutable bytes of the block.
    #[inline]
    pub fn as_mut_bytes(&mut self) -> &mut [u8; 16] {
        self.0.as_array_mut()
    }
}

impl BitXor for Block {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Block {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        // Stored values can be secret shares or masked payloads, so equality
        // is constant time.
        let a: u128 = (*self).into();
        let b: u128 = (*other).into();
        a.ct_eq(&b).into()
    }
}

impl Eq for Block {}

impl Distribution<Block> for StandardUniform {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Block {
        let mut bytes = [0; 16];
        rng.fill_bytes(&mut bytes);
        Block::new(bytes)
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsMut<[u8]> for Block {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_bytes()
    }
}

impl From<[u8; 16]> for Block {
    #[inline]
    fn from(value: [u8; 16]) -> Self {
        Self::new(value)
    }
}

impl From<Block> for [u8; 16] {
    fn from(value: Block) -> Self {
        *value.as_bytes()
    }
}

impl From<u128> for Block {
    #[inline]
    fn from(value: u128) -> Self {
        Self::new(value.to_ne_bytes())
    }
}

impl From<Block> for u128 {
    #[inline]
    fn from(value: Block) -> Self {
        u128::from_ne_bytes(*value.as_bytes())
    }
}

/// Error returned when converting a slice of the wrong length to a [`Block`].
#[derive(Debug, Error)]
#[error("slice must have length of 16")]
pub struct WrongLength;

impl TryFrom<&[u8]> for Block {
    type Error = WrongLength;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let arr = value.try_into().map_err(|_| WrongLength)?;
        Ok(Self::new(arr))
    }
}

impl fmt::Binary for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&u128::from(*self), f)
    }
}

#[cfg(test)]
mod tests {
    use super::Block;

    #[test]
    fn test_xor_is_involution() {
        let a = Block::from(0x5151_u128);
        let b = Block::from(0xdead_beef_u128);
        assert_eq!(a, a ^ b ^ b);
        assert_eq!(Block::ZERO, a ^ a);
    }

    #[test]
    fn test_u128_round_trip() {
        let b = Block::from(42_u128);
        assert_eq!(42_u128, b.into());
    }

    #[test]
    fn test_try_from_slice() {
        let bytes = [7_u8; 16];
        let b = Block::try_from(bytes.as_slice()).unwrap();
        assert_eq!(Block::new(bytes), b);
        assert!(Block::try_from([0_u8; 15].as_slice()).is_err());
    }
}
