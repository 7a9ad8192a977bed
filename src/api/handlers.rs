//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::api::codec::{render_json, store_json};
use crate::cache::{CacheStore, SharedStore, TypedView};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CapacityRequest, CapacityResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the shared store and a typed view onto it; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub cache: SharedStore,
    /// Typed accessors over `cache`
    pub view: TypedView,
    /// TTL used when a set request does not carry one
    pub default_ttl: Duration,
}

impl AppState {
    /// Creates a new AppState around an existing store.
    pub fn new(cache: SharedStore, default_ttl: Duration) -> Self {
        Self {
            view: TypedView::new(cache.clone()),
            cache,
            default_ttl,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::from_config(config).shared(), config.default_ttl())
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req
        .ttl
        .map(Duration::from_secs)
        .unwrap_or(state.default_ttl);
    store_json(&state.view, &req.key, req.value, ttl);

    Ok(Json(SetResponse::new(req.key, ttl.as_secs())))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let stored = state
        .cache
        .get_raw(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    let value = render_json(&stored).ok_or_else(|| {
        CacheError::Internal(format!("Value under '{}' has no JSON representation", key))
    })?;
    let ttl_remaining = state.cache.ttl_remaining(&key).map(|ttl| ttl.as_secs());

    Ok(Json(GetResponse::new(key, value, ttl_remaining)))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for PUT /config/max-entries
///
/// Changes the capacity for every holder of the store.
pub async fn capacity_handler(
    State(state): State<AppState>,
    Json(req): Json<CapacityRequest>,
) -> Json<CapacityResponse> {
    state.cache.set_max_entries(req.max_entries);
    debug!(max_entries = req.max_entries, "capacity updated over HTTP");

    Json(CapacityResponse {
        max_entries: state.cache.max_entries(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(CacheStore::new(100).shared(), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!("test_value"),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.ttl, 300);

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!("test_value"));
        assert!(response.ttl_remaining.is_some());

        // Visible to in-process callers through the typed view
        assert_eq!(state.view.get_string("test_key"), "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_value_without_json_form() {
        let state = test_state();
        state.cache.set("opaque", 1.5_f32, Duration::from_secs(60));

        let result = get_handler(State(state), Path("opaque".to_string())).await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.view.set_int("to_delete", 1, Duration::from_secs(60));

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(test_state())).await;
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
        assert_eq!(response.stats.max_entries, 100);
    }

    #[tokio::test]
    async fn test_capacity_handler() {
        let state = test_state();
        let response =
            capacity_handler(State(state.clone()), Json(CapacityRequest { max_entries: 2 })).await;

        assert_eq!(response.max_entries, 2);
        assert_eq!(state.cache.max_entries(), 2);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
