//! Deterministic selection: stable string hash to bounded index.
//!
//! # Invariants
//! - `hash_to_index` is a pure function of `(seed, count)` across processes.
//! - The hash walks UTF-16 code units so non-ASCII seeds hash identically to
//!   other implementations of the same `h * 31 + unit` scheme.

/// Field separator used inside selection seeds.
pub const SEED_SEPARATOR: &str = "|";

/// Returns `hash(seed) % count`, or `0` when `count == 0`.
pub fn hash_to_index(seed: &str, count: usize) -> usize {
    let hash = seed
        .encode_utf16()
        .fold(0u32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(u32::from(unit))
        });
    if count == 0 {
        return 0;
    }
    // u32 always fits in u64; the result is < count.
    (u64::from(hash) % count as u64) as usize
}

/// Topic seed: `ymd|strategyId|channelId` (stable for one UTC day).
pub fn topic_seed(ymd: &str, strategy_id: &str, channel_id: &str) -> String {
    [ymd, strategy_id, channel_id].join(SEED_SEPARATOR)
}

/// Rewrite seed: `ymd|strategyId|channelId|sourceId`.
pub fn rewrite_seed_key(ymd: &str, strategy_id: &str, channel_id: &str, source_id: &str) -> String {
    [ymd, strategy_id, channel_id, source_id].join(SEED_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::{hash_to_index, rewrite_seed_key, topic_seed};

    #[test]
    fn zero_count_always_selects_zero() {
        assert_eq!(hash_to_index("anything", 0), 0);
        assert_eq!(hash_to_index("", 0), 0);
    }

    #[test]
    fn matches_reference_values() {
        // "a" = 97; "ab" = 97 * 31 + 98 = 3105.
        assert_eq!(hash_to_index("a", 1000), 97);
        assert_eq!(hash_to_index("ab", 10_000), 3105);
        assert_eq!(hash_to_index("ab", 7), 3105 % 7);
    }

    #[test]
    fn wraps_modulo_two_pow_32() {
        // Long seeds overflow u32 many times; result must still be bounded.
        let seed = "z".repeat(64);
        let index = hash_to_index(&seed, 6);
        assert!(index < 6);
        assert_eq!(index, hash_to_index(&seed, 6));
    }

    #[test]
    fn is_pure_and_bounded_across_many_seeds() {
        for day in 1..=28 {
            let seed = topic_seed(&format!("2024-02-{day:02}"), "quiet-spread", "discover");
            for count in 1..=12 {
                let first = hash_to_index(&seed, count);
                assert!(first < count);
                assert_eq!(first, hash_to_index(&seed, count));
            }
        }
    }

    #[test]
    fn hashes_utf16_code_units() {
        // U+1F600 is a surrogate pair (0xD83D, 0xDE00) in UTF-16.
        let expected = (0xD83Du64 * 31 + 0xDE00) % 100_000;
        assert_eq!(hash_to_index("\u{1F600}", 100_000) as u64, expected);
    }

    #[test]
    fn seeds_join_with_pipe() {
        assert_eq!(
            topic_seed("2024-02-10", "quiet-spread", "discover"),
            "2024-02-10|quiet-spread|discover"
        );
        assert_eq!(
            rewrite_seed_key("2024-02-10", "quiet-rewrite", "discover", "rewrite"),
            "2024-02-10|quiet-rewrite|discover|rewrite"
        );
    }
}
