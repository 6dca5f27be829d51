use std::collections::HashMap;

use chrono::Utc;

use crate::{
    models::{Video, ViewingMetrics},
    storage::{Storage, StoreKey},
};

const WATCH_HISTORY_CAP: usize = 50;
const SEARCH_HISTORY_CAP: usize = 10;

/// Session-scoped state: watch history, watch later, search history, and
/// per-video viewing metrics
///
/// Every mutator applies its bounding/uniqueness rule to the in-memory
/// collection and then persists the full updated collection as a snapshot.
pub struct SessionStore {
    watch_history: Vec<Video>,
    watch_later: Vec<Video>,
    search_history: Vec<String>,
    viewing_metrics: HashMap<String, ViewingMetrics>,
    storage: Storage,
}

impl SessionStore {
    /// An empty store backed by `storage`
    pub fn new(storage: Storage) -> Self {
        Self {
            watch_history: Vec::new(),
            watch_later: Vec::new(),
            search_history: Vec::new(),
            viewing_metrics: HashMap::new(),
            storage,
        }
    }

    /// Restores all collections from their persisted snapshots
    ///
    /// Missing or unreadable snapshots start empty rather than failing
    /// startup.
    pub async fn load(storage: Storage) -> Self {
        let watch_history = Self::load_or_default(&storage, StoreKey::WatchHistory).await;
        let watch_later = Self::load_or_default(&storage, StoreKey::WatchLater).await;
        let search_history = Self::load_or_default(&storage, StoreKey::SearchHistory).await;
        let viewing_metrics = Self::load_or_default(&storage, StoreKey::ViewingMetrics).await;

        Self {
            watch_history,
            watch_later,
            search_history,
            viewing_metrics,
            storage,
        }
    }

    async fn load_or_default<T: serde::de::DeserializeOwned + Default>(
        storage: &Storage,
        key: StoreKey,
    ) -> T {
        match storage.load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to load snapshot, starting empty");
                T::default()
            }
        }
    }

    pub fn watch_history(&self) -> &[Video] {
        &self.watch_history
    }

    pub fn watch_later(&self) -> &[Video] {
        &self.watch_later
    }

    pub fn search_history(&self) -> &[String] {
        &self.search_history
    }

    pub fn viewing_metrics(&self) -> &HashMap<String, ViewingMetrics> {
        &self.viewing_metrics
    }

    /// Records a watched video: most-recent-first, unique by ID (a re-add
    /// moves the entry to the front), capped at 50
    pub fn add_to_history(&mut self, video: Video) {
        self.watch_history.retain(|v| v.id != video.id);
        self.watch_history.insert(0, video);
        self.watch_history.truncate(WATCH_HISTORY_CAP);
        self.persist_history();
    }

    pub fn remove_from_history(&mut self, video_id: &str) {
        self.watch_history.retain(|v| v.id != video_id);
        self.persist_history();
    }

    /// Adds to watch later with set semantics: a duplicate add is a no-op
    /// and never reorders the list
    pub fn add_to_watch_later(&mut self, video: Video) {
        if self.watch_later.iter().any(|v| v.id == video.id) {
            return;
        }
        self.watch_later.insert(0, video);
        self.persist_watch_later();
    }

    pub fn remove_from_watch_later(&mut self, video_id: &str) {
        self.watch_later.retain(|v| v.id != video_id);
        self.persist_watch_later();
    }

    pub fn is_in_watch_later(&self, video_id: &str) -> bool {
        self.watch_later.iter().any(|v| v.id == video_id)
    }

    /// Records a search query: most-recent-first, unique, capped at 10;
    /// blank queries are ignored
    pub fn add_to_search_history(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.search_history.retain(|q| q != query);
        self.search_history.insert(0, query.to_string());
        self.search_history.truncate(SEARCH_HISTORY_CAP);
        self.persist_search_history();
    }

    pub fn remove_from_search_history(&mut self, query: &str) {
        self.search_history.retain(|q| q != query);
        self.persist_search_history();
    }

    pub fn clear_search_history(&mut self) {
        self.search_history.clear();
        self.persist_search_history();
    }

    /// Accumulates one watch segment into the video's metrics
    ///
    /// The store always adds whatever it is given; not double-counting a
    /// single continuous segment is the caller's responsibility. The
    /// best-known category comes from watch history at first sight of the
    /// video.
    pub fn update_viewing_metrics(&mut self, video_id: &str, watch_seconds: u64, completed: bool) {
        let now = Utc::now();
        let category = self
            .watch_history
            .iter()
            .find(|v| v.id == video_id)
            .and_then(|v| v.category.clone());

        let metrics = self
            .viewing_metrics
            .entry(video_id.to_string())
            .or_insert_with(|| ViewingMetrics::new(video_id.to_string(), category, now));
        metrics.record(watch_seconds, completed, now);

        self.storage
            .set_in_background(StoreKey::ViewingMetrics, &self.viewing_metrics);
    }

    fn persist_history(&self) {
        self.storage
            .set_in_background(StoreKey::WatchHistory, &self.watch_history);
    }

    fn persist_watch_later(&self) {
        self.storage
            .set_in_background(StoreKey::WatchLater, &self.watch_later);
    }

    fn persist_search_history(&self) {
        self.storage
            .set_in_background(StoreKey::SearchHistory, &self.search_history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::create_redis_client;

    // The client is never connected in these tests; writes are
    // fire-and-forget through the writer channel
    fn test_store() -> SessionStore {
        let client = create_redis_client("redis://127.0.0.1:6379").unwrap();
        let (storage, _handle) = Storage::new(client);
        SessionStore::new(storage)
    }

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            thumbnail: String::new(),
            title: format!("Video {}", id),
            channel: "Channel".to_string(),
            channel_id: "UC1".to_string(),
            views: "0 views".to_string(),
            timestamp: "Today".to_string(),
            avatar: String::new(),
            category: Some("Science".to_string()),
        }
    }

    #[tokio::test]
    async fn test_history_readd_moves_to_front_without_duplicates() {
        let mut store = test_store();

        store.add_to_history(video("a"));
        store.add_to_history(video("b"));
        store.add_to_history(video("a"));
        store.add_to_history(video("c"));
        store.add_to_history(video("a"));

        let ids: Vec<&str> = store.watch_history().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_history_caps_at_fifty_dropping_oldest() {
        let mut store = test_store();

        for i in 0..51 {
            store.add_to_history(video(&format!("v{}", i)));
        }

        assert_eq!(store.watch_history().len(), 50);
        assert_eq!(store.watch_history()[0].id, "v50");
        assert!(!store.watch_history().iter().any(|v| v.id == "v0"));
    }

    #[tokio::test]
    async fn test_watch_later_add_is_idempotent() {
        let mut store = test_store();

        store.add_to_watch_later(video("a"));
        store.add_to_watch_later(video("b"));
        store.add_to_watch_later(video("a"));

        let ids: Vec<&str> = store.watch_later().iter().map(|v| v.id.as_str()).collect();
        // No reorder on the duplicate add
        assert_eq!(ids, vec!["b", "a"]);
        assert!(store.is_in_watch_later("a"));
        assert!(!store.is_in_watch_later("c"));
    }

    #[tokio::test]
    async fn test_watch_later_remove() {
        let mut store = test_store();

        store.add_to_watch_later(video("a"));
        store.remove_from_watch_later("a");

        assert!(store.watch_later().is_empty());
    }

    #[tokio::test]
    async fn test_search_history_bounds_and_uniqueness() {
        let mut store = test_store();

        for i in 0..12 {
            store.add_to_search_history(&format!("query {}", i));
        }
        assert_eq!(store.search_history().len(), 10);
        assert_eq!(store.search_history()[0], "query 11");

        store.add_to_search_history("query 5");
        assert_eq!(store.search_history().len(), 10);
        assert_eq!(store.search_history()[0], "query 5");
    }

    #[tokio::test]
    async fn test_search_history_ignores_blank_queries() {
        let mut store = test_store();

        store.add_to_search_history("   ");
        store.add_to_search_history("");

        assert!(store.search_history().is_empty());
    }

    #[tokio::test]
    async fn test_search_history_clear() {
        let mut store = test_store();

        store.add_to_search_history("algebra");
        store.clear_search_history();

        assert!(store.search_history().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_accumulate_and_take_category_from_history() {
        let mut store = test_store();
        store.add_to_history(video("a"));

        store.update_viewing_metrics("a", 120, false);
        store.update_viewing_metrics("a", 300, true);
        store.update_viewing_metrics("a", 10, false);

        let metrics = store.viewing_metrics().get("a").unwrap();
        assert_eq!(metrics.watch_count, 3);
        assert_eq!(metrics.watch_duration, 430);
        assert!(metrics.completed);
        assert_eq!(metrics.category.as_deref(), Some("Science"));
    }

    #[tokio::test]
    async fn test_metrics_for_unknown_video_have_no_category() {
        let mut store = test_store();

        store.update_viewing_metrics("ghost", 60, false);

        let metrics = store.viewing_metrics().get("ghost").unwrap();
        assert_eq!(metrics.category, None);
        assert_eq!(metrics.watch_count, 1);
    }
}
