//! Move source used when no remote service is configured.

use tracing::debug;

use crate::bot::{BotError, BotMoveReply, BotMoveRequest, BotService};

/// Declines every request, so each bot move is the random fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBot;

#[async_trait::async_trait]
impl BotService for OfflineBot {
    async fn request_move(&self, request: &BotMoveRequest) -> Result<BotMoveReply, BotError> {
        debug!(session_id = %request.session_id, "No move service configured");
        Err(BotError::new("no move service configured"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
