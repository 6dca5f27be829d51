use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    models::{UserProfile, Video},
    services::{interleave::dedup_by_id, providers::VideoProvider},
};

/// How many of the most recent history entries are excluded from
/// recommendations to avoid immediate repeats
const RECENT_EXCLUSION_COUNT: usize = 5;

/// Ranks candidate videos against the profile
///
/// Candidates are deduplicated by ID and stripped of the five most recently
/// watched videos, then stable-sorted by descending relevance so ties keep
/// their input order. Scores stay internal; only the ordering is surfaced.
pub fn rank_candidates(
    profile: &UserProfile,
    candidates: Vec<Video>,
    watch_history: &[Video],
) -> Vec<Video> {
    let recent: HashSet<&str> = watch_history
        .iter()
        .take(RECENT_EXCLUSION_COUNT)
        .map(|v| v.id.as_str())
        .collect();

    let mut pool = dedup_by_id(candidates);
    pool.retain(|v| !recent.contains(v.id.as_str()));

    pool.sort_by_key(|v| Reverse(relevance_score(profile, v)));
    pool
}

/// Content score of one candidate: +2 per subject or interest found in the
/// title, +3 when the grade string appears, all case-insensitive substring
/// matches
fn relevance_score(profile: &UserProfile, video: &Video) -> u32 {
    let title = video.title.to_lowercase();
    let mut score = 0;

    for keyword in profile.keywords() {
        if title.contains(&keyword.to_lowercase()) {
            score += 2;
        }
    }

    // An empty grade would substring-match every title
    if !profile.grade.is_empty() && title.contains(&profile.grade.to_lowercase()) {
        score += 3;
    }

    score
}

/// Gathers recommendation candidates from the profile's favorite channels
/// and returns them ranked
///
/// Channel requests fan out concurrently and the ranking proceeds once every
/// request has settled; a failed channel contributes nothing.
pub async fn gather_recommendations(
    provider: Arc<dyn VideoProvider>,
    api_key: &str,
    profile: &UserProfile,
    watch_history: &[Video],
) -> Vec<Video> {
    let keywords = profile.channel_search_terms();

    let mut tasks = Vec::new();
    for channel in &profile.favorite_channels {
        let provider = Arc::clone(&provider);
        let api_key = api_key.to_string();
        let channel_id = channel.id.clone();
        let keywords = keywords.clone();
        let task = tokio::spawn(async move {
            provider.channel_videos(&api_key, &channel_id, &keywords).await
        });
        tasks.push(task);
    }

    let mut candidates = Vec::new();
    for task in tasks {
        match task.await {
            Ok(videos) => candidates.extend(videos),
            Err(e) => tracing::error!(error = %e, "Channel fetch task join error"),
        }
    }

    tracing::info!(
        channels = profile.favorite_channels.len(),
        candidates = candidates.len(),
        "Recommendation candidates gathered"
    );

    rank_candidates(profile, candidates, watch_history)
}
