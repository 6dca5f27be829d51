use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    models::UserProfile,
    services::{keypool::ApiKeyPool, providers::VideoProvider, session::SessionStore},
    storage::{Storage, StoreKey},
};

/// Shared application state
///
/// Service objects are constructed once at process start and injected by
/// handle; lifecycle is the process lifetime. Shared state is mutated only
/// between suspension points on the request's control flow.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn VideoProvider>,
    pub keys: Arc<RwLock<ApiKeyPool>>,
    pub profile: Arc<RwLock<UserProfile>>,
    pub session: Arc<RwLock<SessionStore>>,
    pub storage: Storage,
}

impl AppState {
    /// Creates empty state backed by `storage`
    pub fn new(storage: Storage, provider: Arc<dyn VideoProvider>) -> Self {
        Self {
            provider,
            keys: Arc::new(RwLock::new(ApiKeyPool::new())),
            profile: Arc::new(RwLock::new(UserProfile::new())),
            session: Arc::new(RwLock::new(SessionStore::new(storage.clone()))),
            storage,
        }
    }

    /// Restores persisted state, run once at startup
    pub async fn load(storage: Storage, provider: Arc<dyn VideoProvider>) -> Self {
        let keys = match storage.load::<Vec<String>>(StoreKey::ApiKeys).await {
            Ok(Some(keys)) => ApiKeyPool::from_keys(keys),
            Ok(None) => ApiKeyPool::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load API key snapshot, starting empty");
                ApiKeyPool::new()
            }
        };

        let profile = match storage.load::<UserProfile>(StoreKey::UserProfile).await {
            Ok(Some(mut profile)) => {
                profile.normalize();
                profile
            }
            Ok(None) => UserProfile::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profile snapshot, starting empty");
                UserProfile::new()
            }
        };

        let session = SessionStore::load(storage.clone()).await;

        tracing::info!(
            keys = keys.len(),
            profile_complete = profile.is_complete(),
            "Application state restored"
        );

        Self {
            provider,
            keys: Arc::new(RwLock::new(keys)),
            profile: Arc::new(RwLock::new(profile)),
            session: Arc::new(RwLock::new(session)),
            storage,
        }
    }
}
