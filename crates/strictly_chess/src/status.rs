//! Terminal-status derivation.
//!
//! Status is never stored independently of the position: the session calls
//! [`derive_status`] after every append and caches the result.

use tracing::{debug, instrument};

use crate::rules::RulesEngine;
use crate::types::MatchStatus;

/// Derives the match status of `position`.
///
/// Predicates are checked in priority order (checkmate, stalemate, draw). If a
/// faulty engine reports several at once, the first one wins.
#[instrument(skip_all)]
pub fn derive_status<R: RulesEngine>(rules: &R, position: &R::Position) -> MatchStatus {
    let status = if rules.is_checkmate(position) {
        MatchStatus::Checkmate
    } else if rules.is_stalemate(position) {
        MatchStatus::Stalemate
    } else if rules.is_draw(position) {
        MatchStatus::Draw
    } else {
        MatchStatus::Active
    };
    debug!(status = %status, "Derived status");
    status
}
