use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Outbound edge to the chat service.
///
/// Best-effort from the settlement engine's perspective: the caller logs
/// and swallows errors, a failed notification never rolls back a
/// settlement.
#[async_trait]
pub trait RankChangeNotifier: Send + Sync {
    /// Announce that a user climbed to `new_rank` in a group.
    /// `old_rank` is `None` for users without a previous standing.
    async fn emit_rank_change(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        old_rank: Option<i64>,
        new_rank: i64,
    ) -> AppResult<()>;
}

/// Notifier that posts rank-change messages to a chat webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    /// Create a new WebhookNotifier for the given webhook URL
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl RankChangeNotifier for WebhookNotifier {
    async fn emit_rank_change(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        old_rank: Option<i64>,
        new_rank: i64,
    ) -> AppResult<()> {
        let payload = json!({
            "type": "rank_change",
            "group_id": group_id,
            "user_id": user_id,
            "old_rank": old_rank,
            "new_rank": new_rank,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat webhook failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Chat webhook returned {}",
                response.status()
            )));
        }

        debug!(
            "Rank change announced: user {} now rank {} in group {}",
            user_id, new_rank, group_id
        );
        Ok(())
    }
}

/// Notifier for deployments without a chat integration
pub struct NullNotifier;

#[async_trait]
impl RankChangeNotifier for NullNotifier {
    async fn emit_rank_change(
        &self,
        _group_id: Uuid,
        _user_id: Uuid,
        _old_rank: Option<i64>,
        _new_rank: i64,
    ) -> AppResult<()> {
        Ok(())
    }
}
