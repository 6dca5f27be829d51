use crate::{
    error::AppResult,
    models::{SearchPage, Video},
};

pub mod youtube;

pub use youtube::YouTubeProvider;

/// Upstream video service abstraction
///
/// All three operations take the API key per call: key selection belongs to
/// the rotation layer, while providers stay stateless over the data passed in.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VideoProvider: Send + Sync {
    /// Probes a key with a minimal read-only query
    ///
    /// True only on an upstream success status. Network failures and
    /// non-success statuses count as invalid and never propagate.
    async fn probe_key(&self, api_key: &str) -> bool;

    /// Keyword search restricted to the education category, enriched with
    /// view statistics and channel avatars
    ///
    /// Quota exhaustion surfaces as `AppError::QuotaExceeded` so callers can
    /// swap credentials and re-issue the same query.
    async fn search_videos(
        &self,
        api_key: &str,
        query: &str,
        page_token: Option<String>,
    ) -> AppResult<SearchPage>;

    /// The most recent uploads of one channel, optionally filtered by
    /// keywords, enriched with view statistics
    ///
    /// Best-effort: any failure resolves to an empty list so one bad channel
    /// never aborts a concurrent batch.
    async fn channel_videos(&self, api_key: &str, channel_id: &str, keywords: &str) -> Vec<Video>;
}
