use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{SearchPage, UserProfile, Video, ViewingMetrics},
    services::{feed, keypool::ApiKeyPool, recommendations},
    storage::StoreKey,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddKeyRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoolResponse {
    pub keys: Vec<String>,
    pub current_index: usize,
    pub validating: bool,
    pub has_required_keys: bool,
}

impl From<&ApiKeyPool> for KeyPoolResponse {
    fn from(pool: &ApiKeyPool) -> Self {
        Self {
            keys: pool.keys().to_vec(),
            current_index: pool.cursor(),
            validating: pool.is_validating(),
            has_required_keys: pool.has_required_keys(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub complete: bool,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            profile: profile.clone(),
            complete: profile.is_complete(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWatchRequest {
    pub video_id: String,
    pub watch_seconds: u64,
    pub completed: bool,
}

// Handlers

/// The category/search feed
///
/// Non-blank queries are recorded into search history; the session store
/// observes search events system-wide.
pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<SearchPage>> {
    let query = params.q.unwrap_or_default();

    if !query.trim().is_empty() {
        state.session.write().await.add_to_search_history(&query);
    }

    let page = feed::category_feed(
        state.provider.as_ref(),
        &state.keys,
        &query,
        params.page_token,
        params.category,
    )
    .await?;

    Ok(Json(page))
}

/// The explore feed built from the profile's favorite channels
pub async fn get_explore_feed(State(state): State<AppState>) -> AppResult<Json<Vec<Video>>> {
    let profile = state.profile.read().await.clone();
    let videos = feed::explore_feed(Arc::clone(&state.provider), &state.keys, &profile).await?;
    Ok(Json(videos))
}

/// Ranked recommendations from favorite channels
pub async fn get_recommendations(State(state): State<AppState>) -> AppResult<Json<Vec<Video>>> {
    let profile = state.profile.read().await.clone();
    if profile.favorite_channels.is_empty() {
        return Ok(Json(Vec::new()));
    }

    {
        let keys = state.keys.read().await;
        if keys.is_empty() {
            return Err(AppError::NoApiKeys);
        }
    }

    let api_key = state
        .keys
        .write()
        .await
        .next_valid(state.provider.as_ref())
        .await
        .ok_or(AppError::NoValidApiKeys)?;

    let watch_history = state.session.read().await.watch_history().to_vec();
    let ranked = recommendations::gather_recommendations(
        Arc::clone(&state.provider),
        &api_key,
        &profile,
        &watch_history,
    )
    .await;

    Ok(Json(ranked))
}

/// Current key pool status
pub async fn get_keys(State(state): State<AppState>) -> Json<KeyPoolResponse> {
    let keys = state.keys.read().await;
    Json(KeyPoolResponse::from(&*keys))
}

/// Adds an API key to the rotation pool
pub async fn add_key(
    State(state): State<AppState>,
    Json(request): Json<AddKeyRequest>,
) -> AppResult<(StatusCode, Json<KeyPoolResponse>)> {
    if request.key.trim().is_empty() {
        return Err(AppError::InvalidInput("API key cannot be empty".to_string()));
    }

    let mut keys = state.keys.write().await;
    keys.add(request.key);
    state.storage.set_in_background(StoreKey::ApiKeys, &keys.keys());

    Ok((StatusCode::CREATED, Json(KeyPoolResponse::from(&*keys))))
}

/// Removes the key at a position
pub async fn remove_key(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<KeyPoolResponse>> {
    let mut keys = state.keys.write().await;
    keys.remove(index)
        .ok_or_else(|| AppError::NotFound(format!("No API key at index {}", index)))?;
    state.storage.set_in_background(StoreKey::ApiKeys, &keys.keys());

    Ok(Json(KeyPoolResponse::from(&*keys)))
}

/// Current profile with its completeness flag
pub async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let profile = state.profile.read().await;
    Json(ProfileResponse::from(&*profile))
}

/// Replaces the profile wholesale
pub async fn update_profile(
    State(state): State<AppState>,
    Json(mut new_profile): Json<UserProfile>,
) -> Json<ProfileResponse> {
    new_profile.normalize();

    let mut profile = state.profile.write().await;
    *profile = new_profile;
    state.storage.set_in_background(StoreKey::UserProfile, &*profile);

    Json(ProfileResponse::from(&*profile))
}

/// Watch history, most recent first
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Video>> {
    let session = state.session.read().await;
    Json(session.watch_history().to_vec())
}

/// Records a watched video
pub async fn add_to_history(
    State(state): State<AppState>,
    Json(video): Json<Video>,
) -> StatusCode {
    state.session.write().await.add_to_history(video);
    StatusCode::CREATED
}

pub async fn remove_from_history(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> StatusCode {
    state.session.write().await.remove_from_history(&video_id);
    StatusCode::NO_CONTENT
}

pub async fn get_watch_later(State(state): State<AppState>) -> Json<Vec<Video>> {
    let session = state.session.read().await;
    Json(session.watch_later().to_vec())
}

/// Adds to watch later; duplicate adds are no-ops
pub async fn add_to_watch_later(
    State(state): State<AppState>,
    Json(video): Json<Video>,
) -> StatusCode {
    state.session.write().await.add_to_watch_later(video);
    StatusCode::CREATED
}

pub async fn remove_from_watch_later(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> StatusCode {
    state
        .session
        .write()
        .await
        .remove_from_watch_later(&video_id);
    StatusCode::NO_CONTENT
}

pub async fn get_search_history(State(state): State<AppState>) -> Json<Vec<String>> {
    let session = state.session.read().await;
    Json(session.search_history().to_vec())
}

pub async fn remove_from_search_history(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> StatusCode {
    state
        .session
        .write()
        .await
        .remove_from_search_history(&query);
    StatusCode::NO_CONTENT
}

pub async fn clear_search_history(State(state): State<AppState>) -> StatusCode {
    state.session.write().await.clear_search_history();
    StatusCode::NO_CONTENT
}

pub async fn get_viewing_metrics(
    State(state): State<AppState>,
) -> Json<HashMap<String, ViewingMetrics>> {
    let session = state.session.read().await;
    Json(session.viewing_metrics().clone())
}

/// Records one watch segment
///
/// The store accumulates whatever it is given; callers flush each continuous
/// segment exactly once.
pub async fn record_watch_segment(
    State(state): State<AppState>,
    Json(request): Json<RecordWatchRequest>,
) -> AppResult<StatusCode> {
    if request.video_id.is_empty() {
        return Err(AppError::InvalidInput("videoId cannot be empty".to_string()));
    }

    state.session.write().await.update_viewing_metrics(
        &request.video_id,
        request.watch_seconds,
        request.completed,
    );

    Ok(StatusCode::OK)
}
