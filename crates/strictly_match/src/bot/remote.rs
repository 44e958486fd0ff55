//! HTTP move service client.

use tracing::{debug, error, info, instrument};

use crate::bot::{BotError, BotMoveReply, BotMoveRequest, BotService};

/// Posts move requests as JSON to a remote endpoint.
#[derive(Debug, Clone)]
pub struct RemoteBotClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteBotClient {
    /// Creates a client for `endpoint`.
    #[instrument(skip(endpoint), fields(endpoint = %endpoint))]
    pub fn new(endpoint: String) -> Self {
        info!("Creating remote bot client");
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Endpoint URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl BotService for RemoteBotClient {
    #[instrument(skip(self, request), fields(session_id = %request.session_id, difficulty = %request.difficulty))]
    async fn request_move(&self, request: &BotMoveRequest) -> Result<BotMoveReply, BotError> {
        debug!(endpoint = %self.endpoint, "Sending move request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Move request failed");
                BotError::new(format!("Move request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = %status, response = %body, "Move service error");
            return Err(BotError::new(format!(
                "Move service error {}: {}",
                status, body
            )));
        }

        let reply: BotMoveReply = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse move reply");
            BotError::new(format!("Failed to parse move reply: {}", e))
        })?;

        info!(mv = %reply.mv, "Move received");
        Ok(reply)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
