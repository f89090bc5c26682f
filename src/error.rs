//! Typed failures of the encode/decode engine.
use thiserror::Error;

/// Errors surfaced by [`Okvs::encode`](crate::Okvs::encode) and
/// [`Okvs::decode`](crate::Okvs::decode).
///
/// Construction failures are recoverable: re-invoking encode with a fresh
/// seed (or a larger storage size) is expected to succeed. No partially
/// built storage is ever exposed alongside an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine configuration is invalid (hash count, storage size, value
    /// width, algebra/strategy combination, duplicate keys, storage length
    /// mismatch at decode).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The key-value map is larger than the declared capacity.
    #[error("map of {got} keys exceeds the declared capacity of {capacity}")]
    Capacity {
        /// Declared capacity n of the engine.
        capacity: usize,
        /// Number of keys in the rejected map.
        got: usize,
    },
    /// Position resampling for a single key hit the retry cap without
    /// finding distinct positions.
    #[error("position resampling exhausted after {0} attempts")]
    ResampleExhausted(usize),
    /// Peeling (including the configured residual strategy) could not
    /// produce a complete elimination order.
    #[error("peeling left an unresolved residual core of {residual} constraints")]
    ConstructionFailure {
        /// Number of constraints that could not be eliminated or verified.
        residual: usize,
    },
}
