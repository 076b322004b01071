//! Process-wide identifier generation for sources and layers that don't
//! care about their name.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next id to hand out. Seeded from wall-clock time instead of 0 so a
/// hot-reloaded host never reuses an id the renderer may still hold.
static NEXT_ID: LazyLock<AtomicU64> = LazyLock::new(|| {
    let now = chrono::Utc::now().timestamp_millis();
    AtomicU64::new(u64::try_from(now).unwrap_or_default())
});

/// Return an ID to use for a source or layer, in the form `<prefix>-<n>`.
///
/// Ids are never reused within the lifetime of the process, even across
/// remounts of the same component.
pub fn get_id(prefix: &str) -> String {
    let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", prefix, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_and_prefixed() {
        let a = get_id("src");
        let b = get_id("src");
        assert_ne!(a, b);
        assert!(a.starts_with("src-"));
        assert!(b.starts_with("src-"));
    }

    #[test]
    fn test_ids_increase_across_prefixes() {
        let a = get_id("layer");
        let b = get_id("src");
        let n_a: u64 = a.trim_start_matches("layer-").parse().unwrap();
        let n_b: u64 = b.trim_start_matches("src-").parse().unwrap();
        assert!(n_b > n_a);
    }

    #[test]
    fn test_ids_seeded_from_wall_clock() {
        let id = get_id("map");
        let n: i64 = id.trim_start_matches("map-").parse().unwrap();
        // Seed is a millisecond timestamp, well past 2020-01-01
        assert!(n > 1_577_836_800_000);
    }
}
