//! Strictly Chess - a pure match state machine for human-versus-bot chess.
//!
//! The crate owns the authoritative match state and nothing else: no I/O, no
//! clock, no bot transport. Legality is delegated to a [`RulesEngine`];
//! [`StandardRules`] provides one backed by `shakmaty`.
//!
//! # Architecture
//!
//! - **Session**: [`MatchSession`] holds the ply history and accepts commands
//! - **Promotion**: [`PromotionWorkflow`] tracks the piece-choice sub-state
//! - **Undo**: [`find_rollback_index`] locates the human's last ply
//! - **Status**: [`derive_status`] maps a position to a [`MatchStatus`]
//! - **Bot seam**: [`BotTicket`] tags requests so stale replies are ignored
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strictly_chess::{Color, MatchSession, SessionConfig, StandardRules, SubmitOutcome};
//!
//! let rules = Arc::new(StandardRules::new());
//! let mut session = MatchSession::start(rules, SessionConfig::new(Color::White));
//! let outcome = session
//!     .submit_move("e2".parse().unwrap(), "e4".parse().unwrap())
//!     .unwrap();
//! assert!(matches!(outcome, SubmitOutcome::Applied(_)));
//! assert!(session.is_bot_turn());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod events;
mod invariants;
mod objective;
mod ply;
mod promotion;
mod rules;
mod session;
mod status;
mod types;
mod undo;

// Crate-level exports - Vocabulary
pub use types::{Color, Difficulty, MatchStatus, MoveDescriptor, NotationError, PieceKind, Square};

// Crate-level exports - Rules capability
pub use rules::{PROMOTION_CHOICES, RulesEngine, RulesError, StandardPosition, StandardRules};

// Crate-level exports - History
pub use ply::{Ply, StoredPly};
pub use status::derive_status;
pub use undo::find_rollback_index;

// Crate-level exports - Promotion
pub use promotion::{PendingPromotion, PromotionWorkflow};

// Crate-level exports - Session
pub use session::{
    BotTicket, MatchMode, MatchSession, SessionConfig, SessionError, SessionId, SessionMeta,
    SubmitOutcome,
};

// Crate-level exports - Lessons
pub use objective::{ObjectiveProgress, StructuredObjective, evaluate, evaluate_all};

// Crate-level exports - Events and invariants
pub use events::MatchEvent;
pub use invariants::{
    AlternatingMoverInvariant, Invariant, InvariantSet, InvariantViolation,
    LockConsistencyInvariant, PlyHistoryInvariant, SessionInvariants, StatusConsistentInvariant,
};
