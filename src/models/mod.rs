use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod metrics;
pub mod profile;

pub use metrics::ViewingMetrics;
pub use profile::{FavoriteChannel, UserProfile};

/// A single enriched video as surfaced to the client
///
/// Identity is the provider video ID; distinct fetches of the same ID are
/// duplicates and are removed wherever lists are merged for display.
/// View count and publish time are pre-formatted display strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub thumbnail: String,
    pub title: String,
    pub channel: String,
    pub channel_id: String,
    pub views: String,
    pub timestamp: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One page of keyword search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub videos: Vec<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    pub total_results: u64,
}

// ============================================================================
// YouTube Data API wire types
// ============================================================================

/// Raw response from GET /search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchResponse {
    #[serde(default)]
    pub items: Vec<ApiSearchItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    pub page_info: ApiPageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
    pub total_results: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchItem {
    pub id: ApiVideoId,
    pub snippet: ApiSnippet,
}

/// Search results identify videos under a nested id object
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnippet {
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub published_at: DateTime<Utc>,
    pub thumbnails: ApiThumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiThumbnails {
    #[serde(default)]
    pub medium: Option<ApiThumbnail>,
    #[serde(default)]
    pub default: Option<ApiThumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

impl ApiThumbnails {
    /// Grid thumbnail, falling back to the default size
    pub fn medium_url(&self) -> String {
        self.medium
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }

    pub fn default_url(&self) -> String {
        self.default
            .as_ref()
            .or(self.medium.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

/// Raw response from GET /videos?part=statistics
#[derive(Debug, Deserialize)]
pub struct ApiStatsResponse {
    #[serde(default)]
    pub items: Vec<ApiStatsItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiStatsItem {
    pub statistics: ApiStatistics,
}

/// The API reports view counts as decimal strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
}

impl ApiStatistics {
    pub fn views(&self) -> u64 {
        self.view_count
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Raw response from GET /channels?part=snippet
#[derive(Debug, Deserialize)]
pub struct ApiChannelsResponse {
    #[serde(default)]
    pub items: Vec<ApiChannelItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiChannelItem {
    pub id: String,
    pub snippet: ApiChannelSnippet,
}

#[derive(Debug, Deserialize)]
pub struct ApiChannelSnippet {
    pub thumbnails: ApiThumbnails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_item_deserialization() {
        let json = r#"{
            "id": { "kind": "youtube#video", "videoId": "abc123" },
            "snippet": {
                "title": "Algebra Basics",
                "channelTitle": "Math Channel",
                "channelId": "UC1",
                "publishedAt": "2024-03-01T12:00:00Z",
                "thumbnails": {
                    "default": { "url": "https://img/default.jpg" },
                    "medium": { "url": "https://img/medium.jpg" }
                }
            }
        }"#;

        let item: ApiSearchItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.video_id.as_deref(), Some("abc123"));
        assert_eq!(item.snippet.title, "Algebra Basics");
        assert_eq!(item.snippet.channel_id, "UC1");
        assert_eq!(item.snippet.thumbnails.medium_url(), "https://img/medium.jpg");
        assert_eq!(item.snippet.thumbnails.default_url(), "https://img/default.jpg");
    }

    #[test]
    fn test_search_item_without_video_id() {
        // Channel and playlist hits carry no videoId
        let json = r#"{
            "id": { "kind": "youtube#channel", "channelId": "UC9" },
            "snippet": {
                "title": "Some Channel",
                "channelTitle": "Some Channel",
                "channelId": "UC9",
                "publishedAt": "2024-03-01T12:00:00Z",
                "thumbnails": {}
            }
        }"#;

        let item: ApiSearchItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.video_id, None);
        assert_eq!(item.snippet.thumbnails.medium_url(), "");
    }

    #[test]
    fn test_statistics_views_parse() {
        let stats: ApiStatistics = serde_json::from_str(r#"{"viewCount": "1500000"}"#).unwrap();
        assert_eq!(stats.views(), 1_500_000);

        let missing: ApiStatistics = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.views(), 0);
    }

    #[test]
    fn test_thumbnail_fallbacks() {
        let only_default: ApiThumbnails =
            serde_json::from_str(r#"{"default": {"url": "https://img/d.jpg"}}"#).unwrap();
        assert_eq!(only_default.medium_url(), "https://img/d.jpg");

        let only_medium: ApiThumbnails =
            serde_json::from_str(r#"{"medium": {"url": "https://img/m.jpg"}}"#).unwrap();
        assert_eq!(only_medium.default_url(), "https://img/m.jpg");
    }

    #[test]
    fn test_video_snapshot_roundtrip_uses_camel_case() {
        let video = Video {
            id: "abc123".to_string(),
            thumbnail: "https://img/medium.jpg".to_string(),
            title: "Algebra Basics".to_string(),
            channel: "Math Channel".to_string(),
            channel_id: "UC1".to_string(),
            views: "1.5M views".to_string(),
            timestamp: "2 days ago".to_string(),
            avatar: "https://img/avatar.jpg".to_string(),
            category: None,
        };

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["channelId"], "UC1");
        assert!(json.get("category").is_none());

        let back: Video = serde_json::from_value(json).unwrap();
        assert_eq!(back, video);
    }
}
