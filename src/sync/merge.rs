// Reconciler — per-field MAX of the sheet copy and the local copy.
//
// Operators raise numbers by hand in the sheet, and the local cache picks up
// fresher scraped values, so neither side is authoritative on its own. Taking
// the max per field never lowers a value either side has seen. Because max is
// commutative, associative and idempotent, overlapping or repeated syncs
// converge to the same record.

use chrono::{DateTime, Utc};

use crate::metrics::MetricRecord;

/// Merge two observations of the same account.
///
/// `observed_at` on the result is `merged_at`, not either input's time.
pub fn merge(external: &MetricRecord, local: &MetricRecord, merged_at: DateTime<Utc>) -> MetricRecord {
    MetricRecord {
        followers: external.followers.max(local.followers),
        likes: external.likes.max(local.likes),
        comments: external.comments.max(local.comments),
        videos: external.videos.max(local.videos),
        views: external.views.max(local.views),
        observed_at: merged_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn rec(followers: u64, likes: u64, comments: u64, videos: u64, views: u64) -> MetricRecord {
        MetricRecord {
            followers,
            likes,
            comments,
            videos,
            views,
            observed_at: at(1),
        }
    }

    #[test]
    fn test_merge_takes_field_max() {
        let local = rec(1000, 10, 5, 3, 50_000);
        let external = rec(950, 12, 5, 1, 52_000);
        let merged = merge(&external, &local, at(9));
        assert_eq!(merged.counters(), [1000, 12, 5, 3, 52_000]);
        assert_eq!(merged.observed_at, at(9));
    }

    #[test]
    fn test_merge_with_zero_keeps_local() {
        let local = rec(7, 8, 9, 10, 11);
        let merged = merge(&MetricRecord::zero(at(2)), &local, at(3));
        assert!(merged.same_counts(&local));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = rec(3, 1, 4, 1, 5);
        let once = merge(&a, &a, at(4));
        assert!(once.same_counts(&a));
        let twice = merge(&once, &a, at(5));
        assert!(twice.same_counts(&once));
    }

    #[test]
    fn test_merge_is_commutative_and_associative() {
        let a = rec(1, 20, 3, 40, 5);
        let b = rec(10, 2, 30, 4, 50);
        let c = rec(5, 5, 5, 5, 5);
        assert!(merge(&a, &b, at(6)).same_counts(&merge(&b, &a, at(7))));

        let left = merge(&merge(&a, &b, at(8)), &c, at(8));
        let right = merge(&a, &merge(&b, &c, at(8)), at(8));
        assert_eq!(left, right);
    }
}
