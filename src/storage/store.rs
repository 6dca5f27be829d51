use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys for the persisted collection snapshots
///
/// Each key maps to one serialized full-collection blob. The key names match
/// the snapshots written by earlier versions of the client, so existing data
/// carries over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    ApiKeys,
    UserProfile,
    WatchHistory,
    WatchLater,
    SearchHistory,
    ViewingMetrics,
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreKey::ApiKeys => "youtubeApiKeys",
            StoreKey::UserProfile => "userProfile",
            StoreKey::WatchHistory => "watchHistory",
            StoreKey::WatchLater => "watchLater",
            StoreKey::SearchHistory => "searchHistory",
            StoreKey::ViewingMetrics => "viewingMetrics",
        };
        write!(f, "{}", name)
    }
}

/// Creates a Redis client for the snapshot store
pub fn create_redis_client(storage_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(storage_url)?;
    Ok(client)
}

/// Message for asynchronous snapshot writes
struct SnapshotWriteMessage {
    key: String,
    value: String,
}

/// Durable string-keyed snapshot store
///
/// Every write replaces the whole collection under its key, so persistence is
/// atomic-by-replacement at the granularity this system needs. Writes are
/// fire-and-forget through a background writer task; callers treat them as
/// durable synchronously.
#[derive(Clone)]
pub struct Storage {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<SnapshotWriteMessage>,
}

/// Handle for gracefully shutting down the snapshot writer
pub struct StorageWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl StorageWriterHandle {
    /// Signals the writer task to flush all pending snapshots and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Snapshot writer shutdown signal sent");
    }
}

impl Storage {
    /// Creates the store and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, StorageWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::snapshot_writer_task(client, write_rx, shutdown_rx).await;
        });

        let storage = Self {
            redis_client,
            write_tx,
        };

        let handle = StorageWriterHandle { shutdown_tx };

        (storage, handle)
    }

    /// Background task that applies snapshot writes in arrival order
    ///
    /// On shutdown, drains the channel so no acknowledged write is lost.
    async fn snapshot_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<SnapshotWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Snapshot writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_snapshot(&client, msg).await {
                        tracing::error!(error = %e, "Failed to persist snapshot");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0;
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_snapshot(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush snapshot during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Snapshot writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_snapshot(client: &Client, msg: SnapshotWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        // No expiry: snapshots live until the next overwrite
        let _: () = conn.set(msg.key, msg.value).await?;
        Ok(())
    }

    /// Loads the snapshot stored under `key`, if any
    ///
    /// Called once per collection at process start.
    pub async fn load<T: serde::de::DeserializeOwned>(
        &self,
        key: StoreKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(format!("{}", key)).await?;

        match stored {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Snapshot deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Replaces the snapshot under `key` without blocking the caller
    ///
    /// Serialization happens inline; the write itself is handed to the
    /// background writer. Mutators only ever persist in-memory collections
    /// that are known-valid, so a failed write never corrupts stored state.
    pub fn set_in_background<T: serde::Serialize>(&self, key: StoreKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Snapshot serialization error");
                return;
            }
        };

        let msg = SnapshotWriteMessage {
            key: format!("{}", key),
            value: json,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to enqueue snapshot write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_names_match_legacy_snapshots() {
        assert_eq!(format!("{}", StoreKey::ApiKeys), "youtubeApiKeys");
        assert_eq!(format!("{}", StoreKey::UserProfile), "userProfile");
        assert_eq!(format!("{}", StoreKey::WatchHistory), "watchHistory");
        assert_eq!(format!("{}", StoreKey::WatchLater), "watchLater");
        assert_eq!(format!("{}", StoreKey::SearchHistory), "searchHistory");
        assert_eq!(format!("{}", StoreKey::ViewingMetrics), "viewingMetrics");
    }

    #[tokio::test]
    async fn test_set_in_background_accepts_writes_without_server() {
        // Client::open never connects; enqueueing must not fail or block
        let client = create_redis_client("redis://127.0.0.1:6379").unwrap();
        let (storage, handle) = Storage::new(client);

        storage.set_in_background(StoreKey::SearchHistory, &vec!["algebra".to_string()]);
        handle.shutdown().await;
    }
}
