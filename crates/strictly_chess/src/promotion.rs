//! The pending-promotion sub-state of a match.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::types::{Color, Square};

/// A pawn move onto the last rank waiting for the player's piece choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPromotion {
    /// Pawn origin.
    pub from: Square,
    /// Promotion square.
    pub to: Square,
    /// Side promoting.
    pub color: Color,
}

/// Two-state machine: idle, or awaiting a piece choice.
///
/// Owned by the match session, which is the only writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromotionWorkflow {
    /// No promotion outstanding.
    #[default]
    Idle,
    /// Waiting for the player to pick a piece.
    AwaitingChoice(PendingPromotion),
}

impl PromotionWorkflow {
    /// The outstanding promotion, if any.
    pub fn pending(&self) -> Option<PendingPromotion> {
        match self {
            Self::Idle => None,
            Self::AwaitingChoice(pending) => Some(*pending),
        }
    }

    /// Whether a choice is outstanding.
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingChoice(_))
    }

    /// `Idle -> AwaitingChoice`. Returns `None` without changing state if a
    /// promotion is already outstanding.
    #[instrument(skip(self))]
    pub(crate) fn begin(&mut self, pending: PendingPromotion) -> Option<PendingPromotion> {
        if self.is_awaiting() {
            debug!("Promotion already awaiting a choice");
            return None;
        }
        *self = Self::AwaitingChoice(pending);
        Some(pending)
    }

    /// `AwaitingChoice -> Idle`, returning what was pending.
    pub(crate) fn take(&mut self) -> Option<PendingPromotion> {
        std::mem::take(self).pending()
    }
}
