//! Strictly Match - the runtime around a [`strictly_chess`] match session.
//!
//! # Architecture
//!
//! - **Controller**: [`MatchController`] is the single owner of the current session
//! - **Bot**: [`BotMoveOrchestrator`] asks a [`BotService`] for moves and falls back
//!   to a random legal move
//! - **Persistence**: [`PersistenceGateway`] stores ply lists and session settings,
//!   in memory or in SQLite
//! - **Config**: [`AppConfig`] and [`LessonPlan`] are loaded from TOML

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod error;
mod bot;
mod config;
mod controller;
mod lesson;
mod persistence;

// Crate-level exports - Bot
pub use bot::{
    BotCompletion, BotError, BotMoveOrchestrator, BotMoveReply, BotMoveRequest, BotService,
    BotSettlement, DEFAULT_BOT_TIMEOUT, MoveSource, OfflineBot, RemoteBotClient,
};

// Crate-level exports - Configuration
pub use config::{AppConfig, BOT_URL_ENV, ConfigError};
pub use lesson::LessonPlan;

// Crate-level exports - Controller
pub use controller::{MatchCommand, MatchController};

// Crate-level exports - Persistence
pub use persistence::{
    InMemoryGateway, MIGRATIONS, NewPlyRow, PersistenceError, PersistenceGateway,
    PersistenceWriter, PlyRow, SessionMetaRow, SqliteGateway,
};
