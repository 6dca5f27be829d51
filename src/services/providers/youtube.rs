/// YouTube Data API v3 provider
///
/// Keyword search goes through three upstream calls: `/search` for the items,
/// `/videos` for view statistics (joined back positionally by response
/// order), and `/channels` for avatars (joined by channel ID). Channel
/// search skips the `/channels` call and takes the avatar from the search
/// item's own default thumbnail.
use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    error::{AppError, AppResult},
    models::{
        ApiChannelsResponse, ApiSearchItem, ApiSearchResponse, ApiStatsResponse, SearchPage, Video,
    },
    services::providers::VideoProvider,
};

/// YouTube's fixed category code for educational content
const EDUCATION_CATEGORY_ID: &str = "27";
const DEFAULT_QUERY: &str = "educational content";
const SEARCH_PAGE_SIZE: &str = "20";
const CHANNEL_PAGE_SIZE: &str = "10";

#[derive(Clone)]
pub struct YouTubeProvider {
    http_client: HttpClient,
    api_url: String,
}

impl YouTubeProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    /// Maps a non-success search response into the error taxonomy
    ///
    /// A 403 whose body mentions quota is the recoverable quota signal;
    /// every other non-2xx is a generic upstream failure.
    async fn error_from_response(&self, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::FORBIDDEN && body.contains("quota") {
            return AppError::QuotaExceeded;
        }

        AppError::ExternalApi(format!("YouTube API returned status {}: {}", status, body))
    }

    /// Fetches view counts for the given video IDs, in request order
    async fn fetch_statistics(&self, api_key: &str, video_ids: &[String]) -> AppResult<ApiStatsResponse> {
        let ids = video_ids.join(",");
        let url = format!("{}/videos", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "statistics"),
                ("id", ids.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    /// Fetches channel snippets (avatars) for the given channel IDs
    async fn fetch_channels(&self, api_key: &str, channel_ids: &[&str]) -> AppResult<ApiChannelsResponse> {
        let ids = channel_ids.join(",");
        let url = format!("{}/channels", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("id", ids.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn channel_videos_inner(
        &self,
        api_key: &str,
        channel_id: &str,
        keywords: &str,
    ) -> AppResult<Vec<Video>> {
        let url = format!("{}/search", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("maxResults", CHANNEL_PAGE_SIZE),
                ("order", "date"),
                ("q", keywords),
                ("type", "video"),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let search: ApiSearchResponse = response.json().await?;
        let items = with_video_ids(search.items);
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<String> = items.iter().map(|(id, _)| id.clone()).collect();
        let stats = self.fetch_statistics(api_key, &video_ids).await?;

        let now = Utc::now();
        let videos = items
            .into_iter()
            .enumerate()
            .map(|(index, (id, item))| {
                let views = stats.items.get(index).map(|s| s.statistics.views()).unwrap_or(0);
                Video {
                    id,
                    thumbnail: item.snippet.thumbnails.medium_url(),
                    title: item.snippet.title.clone(),
                    channel: item.snippet.channel_title.clone(),
                    channel_id: item.snippet.channel_id.clone(),
                    views: format_views(views),
                    timestamp: format_relative_time(item.snippet.published_at, now),
                    avatar: item.snippet.thumbnails.default_url(),
                    category: None,
                }
            })
            .collect();

        Ok(videos)
    }
}

#[async_trait::async_trait]
impl VideoProvider for YouTubeProvider {
    async fn probe_key(&self, api_key: &str) -> bool {
        let url = format!("{}/search", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("q", "test"),
                ("maxResults", "1"),
                ("key", api_key),
            ])
            .send()
            .await;

        match response {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn search_videos(
        &self,
        api_key: &str,
        query: &str,
        page_token: Option<String>,
    ) -> AppResult<SearchPage> {
        let effective_query = if query.is_empty() { DEFAULT_QUERY } else { query };

        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ("q", effective_query.to_string()),
            ("type", "video".to_string()),
            ("videoCategoryId", EDUCATION_CATEGORY_ID.to_string()),
            ("key", api_key.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let url = format!("{}/search", self.api_url);
        let response = self.http_client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let search: ApiSearchResponse = response.json().await?;
        let next_page_token = search.next_page_token.clone();
        let total_results = search.page_info.total_results;

        let items = with_video_ids(search.items);
        if items.is_empty() {
            return Ok(SearchPage {
                videos: Vec::new(),
                next_page_token,
                total_results,
            });
        }

        let video_ids: Vec<String> = items.iter().map(|(id, _)| id.clone()).collect();
        let channel_ids: Vec<&str> = items
            .iter()
            .map(|(_, item)| item.snippet.channel_id.as_str())
            .collect();

        let stats = self.fetch_statistics(api_key, &video_ids).await?;
        let channels = self.fetch_channels(api_key, &channel_ids).await?;

        let now = Utc::now();
        let videos: Vec<Video> = items
            .into_iter()
            .enumerate()
            .map(|(index, (id, item))| {
                let views = stats.items.get(index).map(|s| s.statistics.views()).unwrap_or(0);
                let avatar = channels
                    .items
                    .iter()
                    .find(|c| c.id == item.snippet.channel_id)
                    .map(|c| c.snippet.thumbnails.default_url())
                    .unwrap_or_default();

                Video {
                    id,
                    thumbnail: item.snippet.thumbnails.medium_url(),
                    title: item.snippet.title.clone(),
                    channel: item.snippet.channel_title.clone(),
                    channel_id: item.snippet.channel_id.clone(),
                    views: format_views(views),
                    timestamp: format_relative_time(item.snippet.published_at, now),
                    avatar,
                    category: None,
                }
            })
            .collect();

        tracing::info!(
            query = %effective_query,
            results = videos.len(),
            total_results,
            "Keyword search completed"
        );

        Ok(SearchPage {
            videos,
            next_page_token,
            total_results,
        })
    }

    async fn channel_videos(&self, api_key: &str, channel_id: &str, keywords: &str) -> Vec<Video> {
        match self.channel_videos_inner(api_key, channel_id, keywords).await {
            Ok(videos) => {
                tracing::info!(
                    channel_id = %channel_id,
                    results = videos.len(),
                    "Channel search completed"
                );
                videos
            }
            Err(e) => {
                tracing::error!(channel_id = %channel_id, error = %e, "Channel fetch failed");
                Vec::new()
            }
        }
    }
}

/// Drops search hits that carry no video ID (channel and playlist results)
fn with_video_ids(items: Vec<ApiSearchItem>) -> Vec<(String, ApiSearchItem)> {
    items
        .into_iter()
        .filter_map(|item| item.id.video_id.clone().map(|id| (id, item)))
        .collect()
}

/// Formats a raw view count for display
pub fn format_views(views: u64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M views", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K views", views as f64 / 1_000.0)
    } else {
        format!("{} views", views)
    }
}

/// Formats a publish time relative to `now`, coarsest applicable unit
pub fn format_relative_time(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - published).num_days();

    if days >= 365 {
        let years = days / 365;
        format!("{} year{} ago", years, if years > 1 { "s" } else { "" })
    } else if days >= 30 {
        let months = days / 30;
        format!("{} month{} ago", months, if months > 1 { "s" } else { "" })
    } else if days >= 1 {
        format!("{} day{} ago", days, if days > 1 { "s" } else { "" })
    } else {
        "Today".to_string()
    }
}
