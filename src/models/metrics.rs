use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-video viewing metrics
///
/// Accumulates monotonically over the video's lifetime in the store: counts
/// and durations only grow, and the completion flag latches once any session
/// reaches the completion threshold (the player reports that judgment).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewingMetrics {
    pub video_id: String,
    pub watch_count: u32,
    pub last_watched: DateTime<Utc>,
    pub watch_duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub completed: bool,
}

impl ViewingMetrics {
    pub fn new(video_id: String, category: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            video_id,
            watch_count: 0,
            last_watched: now,
            watch_duration: 0,
            category,
            completed: false,
        }
    }

    /// Folds one watch segment into the running totals
    pub fn record(&mut self, watch_seconds: u64, completed: bool, now: DateTime<Utc>) {
        self.watch_count += 1;
        self.last_watched = now;
        self.watch_duration += watch_seconds;
        self.completed = self.completed || completed;
    }
}
