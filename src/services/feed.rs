use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{SearchPage, UserProfile, Video},
    services::{
        interleave::{dedup_by_id, interleave_by_channel, shuffle},
        keypool::ApiKeyPool,
        providers::VideoProvider,
    },
};

/// Issues a keyword search with credential rotation and bounded quota retry
///
/// Each attempt acquires a key through the pool's sequential probe. On a
/// quota-exceeded failure the supplied hook runs once, the cursor rotates
/// past the exhausted key, and the same query is re-issued; the loop allows
/// one attempt per pooled credential, then degrades to "no valid keys".
/// Non-quota failures propagate immediately without invoking the hook.
pub async fn search_with_rotation(
    provider: &dyn VideoProvider,
    pool: &RwLock<ApiKeyPool>,
    query: &str,
    page_token: Option<String>,
    on_quota_exceeded: impl Fn(),
) -> AppResult<SearchPage> {
    let attempts = {
        let pool = pool.read().await;
        if pool.is_empty() {
            return Err(AppError::NoApiKeys);
        }
        pool.len()
    };

    for _ in 0..attempts {
        let api_key = pool
            .write()
            .await
            .next_valid(provider)
            .await
            .ok_or(AppError::NoValidApiKeys)?;

        match provider.search_videos(&api_key, query, page_token.clone()).await {
            Err(AppError::QuotaExceeded) => {
                tracing::warn!(query = %query, "API quota exceeded, rotating key");
                on_quota_exceeded();
                pool.write().await.rotate();
            }
            result => return result,
        }
    }

    Err(AppError::NoValidApiKeys)
}

/// Shapes a pooled list for display: dedup, uniform shuffle, then
/// channel-fair interleave
fn shape_for_display(videos: Vec<Video>) -> Vec<Video> {
    let mut pool = dedup_by_id(videos);
    shuffle(&mut pool);
    interleave_by_channel(pool)
}

/// The category/search feed: one rotated keyword search, shaped for display
///
/// `category` tags each returned video for downstream viewing metrics.
pub async fn category_feed(
    provider: &dyn VideoProvider,
    pool: &RwLock<ApiKeyPool>,
    query: &str,
    page_token: Option<String>,
    category: Option<String>,
) -> AppResult<SearchPage> {
    let page = search_with_rotation(provider, pool, query, page_token, || {}).await?;

    let mut videos = shape_for_display(page.videos);
    if let Some(category) = &category {
        for video in &mut videos {
            video.category = Some(category.clone());
        }
    }

    Ok(SearchPage {
        videos,
        next_page_token: page.next_page_token,
        total_results: page.total_results,
    })
}

/// The explore feed: recent uploads of every favorite channel, fetched
/// concurrently, then shaped for display
///
/// Channel requests fan out and the feed assembles once all have settled; a
/// failed channel resolves to an empty list and never aborts the batch. With
/// no favorite channels the feed is empty and the client falls back to a
/// category query.
pub async fn explore_feed(
    provider: Arc<dyn VideoProvider>,
    pool: &RwLock<ApiKeyPool>,
    profile: &UserProfile,
) -> AppResult<Vec<Video>> {
    if profile.favorite_channels.is_empty() {
        return Ok(Vec::new());
    }

    {
        let pool = pool.read().await;
        if pool.is_empty() {
            return Err(AppError::NoApiKeys);
        }
    }

    let api_key = pool
        .write()
        .await
        .next_valid(provider.as_ref())
        .await
        .ok_or(AppError::NoValidApiKeys)?;

    let mut tasks = Vec::new();
    for channel in &profile.favorite_channels {
        let provider = Arc::clone(&provider);
        let api_key = api_key.clone();
        let channel_id = channel.id.clone();
        let task = tokio::spawn(async move {
            provider.channel_videos(&api_key, &channel_id, "").await
        });
        tasks.push(task);
    }

    let mut pooled = Vec::new();
    for task in tasks {
        match task.await {
            Ok(videos) => pooled.extend(videos),
            Err(e) => tracing::error!(error = %e, "Channel fetch task join error"),
        }
    }

    tracing::info!(
        channels = profile.favorite_channels.len(),
        videos = pooled.len(),
        "Explore feed assembled"
    );

    Ok(shape_for_display(pooled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FavoriteChannel;
    use crate::services::providers::MockVideoProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn video(id: &str, channel_id: &str) -> Video {
        Video {
            id: id.to_string(),
            thumbnail: String::new(),
            title: id.to_string(),
            channel: channel_id.to_string(),
            channel_id: channel_id.to_string(),
            views: "0 views".to_string(),
            timestamp: "Today".to_string(),
            avatar: String::new(),
            category: None,
        }
    }

    fn page_of(videos: Vec<Video>) -> SearchPage {
        SearchPage {
            videos,
            next_page_token: None,
            total_results: 1,
        }
    }

    fn pool_of(n: usize) -> RwLock<ApiKeyPool> {
        RwLock::new(ApiKeyPool::from_keys(
            (0..n).map(|i| format!("key{}", i)).collect(),
        ))
    }

    #[tokio::test]
    async fn test_search_empty_pool_is_no_keys() {
        let provider = MockVideoProvider::new();
        let pool = RwLock::new(ApiKeyPool::new());

        let result = search_with_rotation(&provider, &pool, "math", None, || {}).await;
        assert!(matches!(result, Err(AppError::NoApiKeys)));
    }

    #[tokio::test]
    async fn test_search_all_keys_invalid_is_no_valid_keys() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().times(2).returning(|_| false);

        let pool = pool_of(2);
        let result = search_with_rotation(&provider, &pool, "math", None, || {}).await;
        assert!(matches!(result, Err(AppError::NoValidApiKeys)));
    }

    #[tokio::test]
    async fn test_quota_retry_invokes_hook_once_and_reissues() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().returning(|_| true);

        let calls = AtomicUsize::new(0);
        provider.expect_search_videos().times(2).returning(move |_, _, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::QuotaExceeded)
            } else {
                Ok(page_of(vec![]))
            }
        });

        let hook_calls = AtomicUsize::new(0);
        let pool = pool_of(3);
        let result = search_with_rotation(&provider, &pool, "math", None, || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_quota_failure_does_not_retry() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().returning(|_| true);
        provider
            .expect_search_videos()
            .times(1)
            .returning(|_, _, _| Err(AppError::ExternalApi("403 forbidden".to_string())));

        let hook_calls = AtomicUsize::new(0);
        let pool = pool_of(3);
        let result = search_with_rotation(&provider, &pool, "math", None, || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persistent_quota_is_bounded_by_pool_size() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().returning(|_| true);
        provider
            .expect_search_videos()
            .times(3)
            .returning(|_, _, _| Err(AppError::QuotaExceeded));

        let hook_calls = AtomicUsize::new(0);
        let pool = pool_of(3);
        let result = search_with_rotation(&provider, &pool, "math", None, || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert!(matches!(result, Err(AppError::NoValidApiKeys)));
        assert_eq!(hook_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_category_feed_dedups_and_tags_category() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().returning(|_| true);
        provider.expect_search_videos().returning(|_, _, _| {
            Ok(page_of(vec![
                video("v1", "A"),
                video("v1", "A"),
                video("v2", "B"),
            ]))
        });

        let pool = pool_of(1);
        let page = category_feed(&provider, &pool, "science", None, Some("Science".to_string()))
            .await
            .unwrap();

        assert_eq!(page.videos.len(), 2);
        assert!(page.videos.iter().all(|v| v.category.as_deref() == Some("Science")));
    }

    #[tokio::test]
    async fn test_explore_feed_without_channels_is_empty() {
        let provider: Arc<dyn VideoProvider> = Arc::new(MockVideoProvider::new());
        let pool = pool_of(1);

        let videos = explore_feed(provider, &pool, &UserProfile::new()).await.unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn test_explore_feed_merges_batch_and_survives_failed_channel() {
        let mut provider = MockVideoProvider::new();
        provider.expect_probe_key().returning(|_| true);
        provider
            .expect_channel_videos()
            .times(3)
            .returning(|_, channel_id, _| match channel_id {
                "UC1" => vec![video("v1", "UC1"), video("v2", "UC1")],
                "UC2" => Vec::new(),
                _ => vec![video("v3", "UC3")],
            });

        let mut profile = UserProfile::new();
        profile.favorite_channels = vec![
            FavoriteChannel { id: "UC1".to_string(), name: "One".to_string() },
            FavoriteChannel { id: "UC2".to_string(), name: "Two".to_string() },
            FavoriteChannel { id: "UC3".to_string(), name: "Three".to_string() },
        ];

        let pool = pool_of(1);
        let videos = explore_feed(Arc::new(provider), &pool, &profile).await.unwrap();

        assert_eq!(videos.len(), 3);
        let ids: std::collections::HashSet<&str> =
            videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["v1", "v2", "v3"].into_iter().collect());
    }
}
