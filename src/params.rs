//! Conservative storage-size defaults.
//!
//! The optimal storage-to-key ratio of a scheme is an empirical constant;
//! deployments with tuned tables should pass their own sizes to
//! [`Okvs::with_storage`](crate::Okvs::with_storage). The defaults here are
//! chosen well above the known peeling thresholds (~1.222·n for 3 hashes,
//! 2·n for 2 hashes) so that the randomized stress tests pass every trial.

use crate::peel::ResidualStrategy;

/// Statistical security parameter backing the dense band width.
pub const LAMBDA: usize = 40;

/// Default sparse storage size for `capacity` keys under `hash_count`
/// hash functions.
pub fn sparse_size(capacity: usize, hash_count: usize) -> usize {
    let rate = match hash_count {
        3 => 1.30,
        _ => 2.40,
    };
    let scaled = (capacity as f64 * rate).ceil() as usize;
    // Distinct positions per key need at least hash_count slots.
    scaled.max(hash_count).max(1)
}

/// Default dense band width for `capacity` keys, 0 for strategies without
/// a dense coordinate.
pub fn band_width(capacity: usize, strategy: ResidualStrategy) -> usize {
    if strategy != ResidualStrategy::DenseBand {
        return 0;
    }
    let log_n = usize::BITS - capacity.max(1).leading_zeros();
    (LAMBDA + 2 * log_n as usize).max(64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_size_above_threshold() {
        assert_eq!(5325, sparse_size(4096, 3));
        assert_eq!(2458, sparse_size(1024, 2));
        assert!(sparse_size(1, 3) >= 3);
        assert!(sparse_size(0, 2) >= 2);
    }

    #[test]
    fn test_band_width() {
        assert_eq!(0, band_width(4096, ResidualStrategy::TwoCoreFail));
        assert_eq!(0, band_width(4096, ResidualStrategy::DfsCycle));
        assert_eq!(66, band_width(4096, ResidualStrategy::DenseBand));
        assert_eq!(64, band_width(8, ResidualStrategy::DenseBand));
    }
}
