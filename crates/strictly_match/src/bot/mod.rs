//! Bot move sources and the orchestration around them.

mod offline;
mod orchestrator;
mod remote;

pub use orchestrator::{
    BotCompletion, BotMoveOrchestrator, BotSettlement, DEFAULT_BOT_TIMEOUT, MoveSource,
};
pub use offline::OfflineBot;
pub use remote::RemoteBotClient;

use serde::{Deserialize, Serialize};
use strictly_chess::{BotTicket, Difficulty};

use crate::error::located_error;

/// Request body sent to a move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMoveRequest {
    /// Session the move is for.
    pub session_id: String,
    /// Notation of the previous ply, empty at the start.
    pub last_move: String,
    /// Encoded position to move from.
    pub position: String,
    /// Requested strength.
    pub difficulty: Difficulty,
}

impl From<&BotTicket> for BotMoveRequest {
    fn from(ticket: &BotTicket) -> Self {
        Self {
            session_id: ticket.session_id().clone(),
            last_move: ticket.last_move().clone(),
            position: ticket.position().clone(),
            difficulty: *ticket.difficulty(),
        }
    }
}

/// Reply from a move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotMoveReply {
    /// Encoded position after the move, as the service sees it.
    pub position: String,
    /// The chosen move in long algebraic form.
    #[serde(rename = "move")]
    pub mv: String,
}

/// Anything that can pick a move for the bot.
#[async_trait::async_trait]
pub trait BotService: Send + Sync {
    /// Asks for a move in the request's position.
    async fn request_move(&self, request: &BotMoveRequest) -> Result<BotMoveReply, BotError>;

    /// Returns the service's display name.
    fn name(&self) -> &str;
}

located_error!(
    /// Bot service error with location tracking.
    pub struct BotError,
    "Bot error"
);

impl From<reqwest::Error> for BotError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err))
    }
}
