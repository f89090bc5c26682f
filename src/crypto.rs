//! Cryptographic helpers: an AES-CTR PRG and a `rand_core` compatibility
//! shim for the curve25519 backend.
mod aes_rng;
mod rand_compat;

pub use aes_rng::AesRng;
pub(crate) use rand_compat::RngCompat;
