//! First-class invariants for a match session.
//!
//! Invariants are logical properties that must hold after every session
//! command. The session checks them in debug builds; they can also be tested
//! independently.

use crate::rules::RulesEngine;
use crate::session::MatchSession;
use crate::status::derive_status;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implementations are provided for tuples of up to four invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);

/// Invariant: ply indices are contiguous from zero and only ply 0 lacks a move.
pub struct PlyHistoryInvariant;

impl<R: RulesEngine> Invariant<MatchSession<R>> for PlyHistoryInvariant {
    fn holds(session: &MatchSession<R>) -> bool {
        let plies = session.plies();
        if plies.is_empty() {
            return false;
        }
        plies.iter().enumerate().all(|(i, ply)| {
            ply.index() == i
                && (i == 0) == ply.mv().is_none()
                && (i == 0) == ply.mover().is_none()
        })
    }

    fn description() -> &'static str {
        "Ply indices run 0..n and only ply 0 has no move"
    }
}

/// Invariant: the cached status matches the current position.
pub struct StatusConsistentInvariant;

impl<R: RulesEngine> Invariant<MatchSession<R>> for StatusConsistentInvariant {
    fn holds(session: &MatchSession<R>) -> bool {
        session.status() == derive_status(session.rules(), session.current_position())
    }

    fn description() -> &'static str {
        "Cached status equals the status derived from the last ply"
    }
}

/// Invariant: each move was played by the side to move before it.
pub struct AlternatingMoverInvariant;

impl<R: RulesEngine> Invariant<MatchSession<R>> for AlternatingMoverInvariant {
    fn holds(session: &MatchSession<R>) -> bool {
        let rules = session.rules();
        session.plies().windows(2).all(|pair| {
            pair[1].mover() == Some(rules.side_to_move(pair[0].resulting_position()))
        })
    }

    fn description() -> &'static str {
        "Every ply's mover was the side to move in the previous position"
    }
}

/// Invariant: an outstanding bot request only exists while the bot is to move.
pub struct LockConsistencyInvariant;

impl<R: RulesEngine> Invariant<MatchSession<R>> for LockConsistencyInvariant {
    fn holds(session: &MatchSession<R>) -> bool {
        if !session.is_locked() {
            return true;
        }
        session.is_bot_turn() && session.pending_promotion().is_none()
    }

    fn description() -> &'static str {
        "Bot lock is held only on the bot's turn with no promotion pending"
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (
    PlyHistoryInvariant,
    StatusConsistentInvariant,
    AlternatingMoverInvariant,
    LockConsistencyInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardRules;
    use crate::session::{SessionConfig, SubmitOutcome};
    use crate::types::Color;
    use std::sync::Arc;

    fn session(human: Color) -> MatchSession<StandardRules> {
        MatchSession::start(Arc::new(StandardRules::new()), SessionConfig::new(human))
    }

    #[test]
    fn test_invariants_hold_at_start() {
        assert!(SessionInvariants::check_all(&session(Color::White)).is_ok());
    }

    #[test]
    fn test_invariants_hold_while_bot_thinks() {
        let mut game = session(Color::White);
        let outcome = game
            .submit_move("e2".parse().unwrap(), "e4".parse().unwrap())
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Applied(_)));
        game.begin_bot_request().unwrap();
        assert!(SessionInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_two_invariants_as_set() {
        type TwoInvariants = (PlyHistoryInvariant, StatusConsistentInvariant);
        assert!(TwoInvariants::check_all(&session(Color::Black)).is_ok());
    }
}
