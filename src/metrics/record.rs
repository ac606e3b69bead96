use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of an account's counters.
///
/// Counters are unsigned; anything unparsable or missing upstream has
/// already been coerced to 0 by the time a record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub followers: u64,
    pub likes: u64,
    pub comments: u64,
    pub videos: u64,
    pub views: u64,
    pub observed_at: DateTime<Utc>,
}

impl MetricRecord {
    /// An all-zero record. Used as the external side when the sheet has
    /// nothing for an account, so the merge keeps the local values.
    pub fn zero(observed_at: DateTime<Utc>) -> Self {
        Self {
            followers: 0,
            likes: 0,
            comments: 0,
            videos: 0,
            views: 0,
            observed_at,
        }
    }

    /// True when every counter matches, ignoring `observed_at`.
    pub fn same_counts(&self, other: &MetricRecord) -> bool {
        self.counters() == other.counters()
    }

    /// Counters in a fixed order: followers, likes, comments, videos, views.
    pub fn counters(&self) -> [u64; 5] {
        [
            self.followers,
            self.likes,
            self.comments,
            self.videos,
            self.views,
        ]
    }
}
