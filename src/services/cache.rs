use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

/// Outbound edge to the cache service that owns the ranking, per-user
/// stats and head-to-head response caches.
///
/// Invalidation is fire-and-forget for the settlement engine: the caller
/// swallows failures, and a stale cache entry expires on its own TTL.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drop cached standings for the given groups
    async fn invalidate_ranking(&self, group_ids: &[Uuid]) -> AppResult<()>;

    /// Drop cached per-user statistics for the given users
    async fn invalidate_user_stats(&self, user_ids: &[Uuid]) -> AppResult<()>;

    /// Drop cached head-to-head comparisons involving the given users
    async fn invalidate_head_to_head(&self, user_ids: &[Uuid]) -> AppResult<()>;
}

/// Invalidator that calls the cache service over HTTP
pub struct HttpCacheInvalidator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCacheInvalidator {
    /// Create a new HttpCacheInvalidator for the given cache service URL
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, path: &str, payload: serde_json::Value) -> AppResult<()> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Cache service failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Cache service returned {} for {}",
                response.status(),
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate_ranking(&self, group_ids: &[Uuid]) -> AppResult<()> {
        self.post("invalidate/ranking", json!({ "group_ids": group_ids }))
            .await
    }

    async fn invalidate_user_stats(&self, user_ids: &[Uuid]) -> AppResult<()> {
        self.post("invalidate/user-stats", json!({ "user_ids": user_ids }))
            .await
    }

    async fn invalidate_head_to_head(&self, user_ids: &[Uuid]) -> AppResult<()> {
        self.post("invalidate/head-to-head", json!({ "user_ids": user_ids }))
            .await
    }
}

/// Invalidator for deployments without a cache service
pub struct NullCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NullCacheInvalidator {
    async fn invalidate_ranking(&self, _group_ids: &[Uuid]) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_user_stats(&self, _user_ids: &[Uuid]) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_head_to_head(&self, _user_ids: &[Uuid]) -> AppResult<()> {
        Ok(())
    }
}
