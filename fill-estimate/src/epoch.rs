use std::collections::BTreeSet;

/// Cache visibility window exposed by Quad9, in seconds
pub const QUAD9_EPOCH_SECS: u64 = 10_800;

/// Index of the fixed-width window containing `instant`, anchored at the
/// Unix epoch.
///
/// # Panics
///
/// Panics if `width_secs` is zero. [`crate::ResolverTable`] rejects such
/// widths when it is built or deserialized.
pub fn bucket_index(instant: i64, width_secs: u64) -> i64 {
    assert!(width_secs > 0, "epoch width must be non-zero");
    // Widened so widths above i64::MAX divide exactly; the quotient always
    // fits back into i64.
    i128::from(instant).div_euclid(i128::from(width_secs)) as i64
}

/// Number of distinct windows touched by the instants. Any number of
/// refills inside one window are indistinguishable.
pub fn count_buckets(instants: &[i64], width_secs: u64) -> usize {
    instants
        .iter()
        .map(|&i| bucket_index(i, width_secs))
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0, QUAD9_EPOCH_SECS), 0);
        assert_eq!(bucket_index(10_799, QUAD9_EPOCH_SECS), 0);
        assert_eq!(bucket_index(10_800, QUAD9_EPOCH_SECS), 1);
        assert_eq!(bucket_index(-1, QUAD9_EPOCH_SECS), -1);
    }

    #[test]
    fn test_same_and_next_bucket() {
        let t = 10_800 * 150_000 + 1_000;
        assert_eq!(count_buckets(&[t, t + 5_000, t + 10_001], QUAD9_EPOCH_SECS), 2);
    }

    #[test]
    fn test_many_refills_in_one_window() {
        let t = 10_800 * 42;
        let instants: Vec<i64> = (0..500).map(|i| t + i * 3).collect();
        assert_eq!(count_buckets(&instants, QUAD9_EPOCH_SECS), 1);
    }

    #[test]
    fn test_width_wider_than_i64() {
        assert_eq!(bucket_index(i64::MAX, u64::MAX), 0);
        assert_eq!(bucket_index(i64::MIN, u64::MAX), -1);
    }

    #[test]
    #[should_panic(expected = "epoch width must be non-zero")]
    fn test_zero_width_panics() {
        count_buckets(&[1_000], 0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(count_buckets(&[], QUAD9_EPOCH_SECS), 0);
    }
}
