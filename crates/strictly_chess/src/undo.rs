//! Rollback-point computation for undo.

use tracing::{debug, instrument};

use crate::ply::Ply;
use crate::types::Color;

/// Finds the length `plies` should be truncated to so the human's most recent
/// move, and everything after it, is removed.
///
/// Scans backward for the last ply played by `human`. Ply 0 has no mover and is
/// never a candidate, so the result is always at least 1. Returns `None` when
/// the human has not moved yet.
#[instrument(skip(plies), fields(len = plies.len()))]
pub fn find_rollback_index<P>(plies: &[Ply<P>], human: Color) -> Option<usize> {
    let found = plies
        .iter()
        .rposition(|ply| ply.index() > 0 && ply.was_played_by(human));
    debug!(?found, "Scanned for last human ply");
    found
}
