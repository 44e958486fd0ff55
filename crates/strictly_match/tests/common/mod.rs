//! Fake move services shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use strictly_chess::{Color, MatchSession, SessionConfig, StandardRules};
use strictly_match::{BotError, BotMoveReply, BotMoveRequest, BotService};

/// Replies with queued moves in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedBot {
    replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<BotMoveRequest>>,
}

impl ScriptedBot {
    pub fn new(moves: &[&str]) -> Self {
        Self {
            replies: Mutex::new(moves.iter().map(|m| m.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl BotService for ScriptedBot {
    async fn request_move(&self, request: &BotMoveRequest) -> Result<BotMoveReply, BotError> {
        self.requests.lock().unwrap().push(request.clone());
        let mv = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BotError::new("script exhausted"))?;
        Ok(BotMoveReply {
            position: String::new(),
            mv,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Always fails.
#[derive(Debug, Default)]
pub struct FailingBot;

#[async_trait::async_trait]
impl BotService for FailingBot {
    async fn request_move(&self, _request: &BotMoveRequest) -> Result<BotMoveReply, BotError> {
        Err(BotError::new("service unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sleeps before replying with a fixed move.
#[derive(Debug)]
pub struct SlowBot {
    pub delay: Duration,
    pub mv: String,
}

#[async_trait::async_trait]
impl BotService for SlowBot {
    async fn request_move(&self, _request: &BotMoveRequest) -> Result<BotMoveReply, BotError> {
        tokio::time::sleep(self.delay).await;
        Ok(BotMoveReply {
            position: String::new(),
            mv: self.mv.clone(),
        })
    }

    fn name(&self) -> &str {
        "slow"
    }
}

pub fn sq(name: &str) -> strictly_chess::Square {
    name.parse().expect("valid square")
}

pub fn white_session() -> MatchSession<StandardRules> {
    MatchSession::start(
        Arc::new(StandardRules::new()),
        SessionConfig::new(Color::White),
    )
}
