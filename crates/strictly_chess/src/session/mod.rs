//! The match session: ply history, status and the command API.
//!
//! A [`MatchSession`] is the single owner of a match. Every mutation goes
//! through one of its commands, each of which either succeeds completely or
//! returns a [`SessionError`] without touching state.

mod config;
mod error;
mod ticket;

pub use config::{MatchMode, SessionConfig, SessionMeta};
pub use error::SessionError;
pub use ticket::BotTicket;

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::invariants::{InvariantSet, SessionInvariants};
use crate::objective::{ObjectiveProgress, evaluate_all};
use crate::ply::{Ply, StoredPly};
use crate::promotion::{PendingPromotion, PromotionWorkflow};
use crate::rules::RulesEngine;
use crate::status::derive_status;
use crate::types::{Color, MatchStatus, MoveDescriptor, PieceKind, Square};
use crate::undo::find_rollback_index;

/// Unique identifier for a match session.
pub type SessionId = String;

/// Result of a successful [`MatchSession::submit_move`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<P> {
    /// The move was played.
    Applied(Ply<P>),
    /// The move needs a promotion piece; nothing was played yet.
    PromotionRequired(PendingPromotion),
}

/// A chess match between a human and a bot.
#[derive(Debug, Clone)]
pub struct MatchSession<R: RulesEngine> {
    id: SessionId,
    rules: Arc<R>,
    config: SessionConfig<R::Position>,
    plies: Vec<Ply<R::Position>>,
    status: MatchStatus,
    promotion: PromotionWorkflow,
    generation: u64,
    outstanding_bot_request: Option<u64>,
}

impl<R: RulesEngine> MatchSession<R> {
    /// Starts a new match.
    ///
    /// Ply 0 holds the configured starting position, or the standard start.
    #[instrument(skip(rules, config), fields(human = %config.human_color()))]
    pub fn start(rules: Arc<R>, config: SessionConfig<R::Position>) -> Self {
        Self::with_generation(rules, config, Uuid::new_v4().to_string(), 0)
    }

    /// Starts the match that replaces this one.
    ///
    /// The generation continues from this session so a bot response still in
    /// flight for this session is recognised as stale.
    #[instrument(skip(self, config), fields(previous = %self.id))]
    pub fn successor(&self, config: SessionConfig<R::Position>) -> Self {
        Self::with_generation(
            Arc::clone(&self.rules),
            config,
            Uuid::new_v4().to_string(),
            self.generation + 1,
        )
    }

    fn with_generation(
        rules: Arc<R>,
        config: SessionConfig<R::Position>,
        id: SessionId,
        generation: u64,
    ) -> Self {
        let start = config
            .starting_position()
            .cloned()
            .unwrap_or_else(|| rules.standard_start());
        let status = derive_status(rules.as_ref(), &start);
        info!(session_id = %id, generation, status = %status, "Match started");
        let session = Self {
            id,
            rules,
            config,
            plies: vec![Ply::initial(start)],
            status,
            promotion: PromotionWorkflow::Idle,
            generation,
            outstanding_bot_request: None,
        };
        session.check_invariants();
        session
    }

    /// Rebuilds a session from stored plies.
    ///
    /// The stored history takes precedence over the config's starting position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidHistory`] if the list is empty, ply 0 has a
    /// move, indices are not contiguous, a mover does not alternate, or a
    /// position or move fails to decode.
    #[instrument(skip(rules, config, stored), fields(session_id = %id, count = stored.len()))]
    pub fn restore(
        rules: Arc<R>,
        config: SessionConfig<R::Position>,
        id: SessionId,
        stored: &[StoredPly],
    ) -> Result<Self, SessionError> {
        let first = stored
            .first()
            .ok_or_else(|| SessionError::InvalidHistory("no plies".to_string()))?;
        if first.mv.is_some() || first.mover.is_some() {
            return Err(SessionError::InvalidHistory(
                "ply 0 must not carry a move".to_string(),
            ));
        }

        let mut plies = Vec::with_capacity(stored.len());
        for (expected, record) in stored.iter().enumerate() {
            if record.index != expected {
                return Err(SessionError::InvalidHistory(format!(
                    "expected ply {} but found {}",
                    expected, record.index
                )));
            }
            let position = rules
                .decode_position(&record.position)
                .map_err(|e| SessionError::InvalidHistory(e.to_string()))?;
            let mv = match (&record.mv, expected) {
                (None, 0) => None,
                (Some(text), i) if i > 0 => Some(
                    text.parse::<MoveDescriptor>()
                        .map_err(|e| SessionError::InvalidHistory(e.to_string()))?,
                ),
                _ => {
                    return Err(SessionError::InvalidHistory(format!(
                        "ply {} is missing its move",
                        expected
                    )));
                }
            };
            if let Some(previous) = plies.last().map(|p: &Ply<R::Position>| p.resulting_position())
                && record.mover != Some(rules.side_to_move(previous))
            {
                return Err(SessionError::InvalidHistory(format!(
                    "ply {} was played out of turn",
                    expected
                )));
            }
            plies.push(Ply::from_parts(record, position, mv));
        }

        let last = plies
            .last()
            .map(|ply: &Ply<R::Position>| ply.resulting_position().clone())
            .ok_or_else(|| SessionError::InvalidHistory("no plies".to_string()))?;
        let status = derive_status(rules.as_ref(), &last);
        info!(status = %status, "Session restored");

        let session = Self {
            id,
            rules,
            config,
            plies,
            status,
            promotion: PromotionWorkflow::Idle,
            generation: 0,
            outstanding_bot_request: None,
        };
        session.check_invariants();
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The rules engine this session consults.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Configuration the match was started with.
    pub fn config(&self) -> &SessionConfig<R::Position> {
        &self.config
    }

    /// Full ply history, ply 0 first. Never empty.
    pub fn plies(&self) -> &[Ply<R::Position>] {
        &self.plies
    }

    /// The most recent ply.
    pub fn last_ply(&self) -> &Ply<R::Position> {
        // `plies` always holds ply 0.
        &self.plies[self.plies.len() - 1]
    }

    /// Position after the most recent ply.
    pub fn current_position(&self) -> &R::Position {
        self.last_ply().resulting_position()
    }

    /// Cached match status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Counter bumped by every human-initiated mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a bot request is outstanding.
    pub fn is_locked(&self) -> bool {
        self.outstanding_bot_request.is_some()
    }

    /// The promotion awaiting a piece choice, if any.
    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.promotion.pending()
    }

    /// Side the human plays.
    pub fn human_color(&self) -> Color {
        self.config.human_color()
    }

    /// Side the bot plays.
    pub fn bot_color(&self) -> Color {
        self.config.bot_color()
    }

    /// Side whose turn it is.
    pub fn side_to_move(&self) -> Color {
        self.rules.side_to_move(self.current_position())
    }

    /// Whether the bot should move now.
    pub fn is_bot_turn(&self) -> bool {
        self.status == MatchStatus::Active && self.side_to_move() == self.bot_color()
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.rules.is_check(self.current_position())
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<MoveDescriptor> {
        self.rules.legal_moves(self.current_position())
    }

    /// Number of plies the human has played.
    pub fn human_move_count(&self) -> usize {
        let human = self.human_color();
        self.plies.iter().filter(|p| p.was_played_by(human)).count()
    }

    /// Lesson progress, or `None` outside lesson mode.
    pub fn lesson_progress(&self) -> Option<ObjectiveProgress> {
        match self.config.mode() {
            MatchMode::Lesson { objectives } => Some(evaluate_all(self, objectives)),
            _ => None,
        }
    }

    /// History in persistable form.
    pub fn stored_plies(&self) -> Vec<StoredPly> {
        self.plies
            .iter()
            .map(|ply| ply.to_stored(|position| self.rules.encode_position(position)))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    //  Human commands
    // ─────────────────────────────────────────────────────────────

    /// Submits a human move from `from` to `to`.
    ///
    /// A pawn move onto the last rank does not play anything: it opens a pending
    /// promotion that [`finalize_promotion`](Self::finalize_promotion) completes.
    ///
    /// # Errors
    ///
    /// Rejects when the match is over, the bot is thinking, a promotion is
    /// pending, it is not the human's turn, `from` does not hold a piece of the
    /// side to move, or the move is illegal.
    #[instrument(skip(self), fields(session_id = %self.id, from = %from, to = %to))]
    pub fn submit_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<SubmitOutcome<R::Position>, SessionError> {
        self.ensure_active()?;
        if self.is_locked() {
            warn!("Move submitted while bot is thinking");
            return Err(SessionError::BotThinking);
        }
        if let Some(pending) = self.promotion.pending() {
            warn!("Move submitted while promotion is pending");
            return Err(SessionError::PromotionPending(pending));
        }

        let mover = self.side_to_move();
        if mover != self.human_color() {
            warn!(to_move = %mover, "Human moved out of turn");
            return Err(SessionError::NotYourTurn(mover));
        }

        let mv = MoveDescriptor::new(from, to);
        if self.rules.piece_color_at(self.current_position(), from) != Some(mover) {
            debug!("Origin square does not hold a piece of the side to move");
            return Err(SessionError::IllegalMove(mv));
        }

        if self.rules.is_promotion_move(self.current_position(), from, to) {
            let pending = PendingPromotion {
                from,
                to,
                color: mover,
            };
            self.promotion
                .begin(pending)
                .ok_or(SessionError::PromotionPending(pending))?;
            info!("Promotion required");
            return Ok(SubmitOutcome::PromotionRequired(pending));
        }

        let ply = self.append(mv, mover)?;
        self.bump_generation();
        self.check_invariants();
        info!(ply = ply.index(), notation = %ply.notation(), status = %self.status, "Move applied");
        Ok(SubmitOutcome::Applied(ply))
    }

    /// Completes the pending promotion with `piece`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPendingPromotion`] if nothing is pending and
    /// [`SessionError::InvalidPromotionPiece`] for a pawn or king choice; the
    /// pending promotion is kept in the latter case.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn finalize_promotion(
        &mut self,
        piece: PieceKind,
    ) -> Result<Ply<R::Position>, SessionError> {
        let pending = self.promotion.pending().ok_or_else(|| {
            warn!("Promotion finalized with nothing pending");
            SessionError::NoPendingPromotion
        })?;
        if !piece.is_promotion_target() {
            return Err(SessionError::InvalidPromotionPiece(piece));
        }

        let mv = MoveDescriptor::with_promotion(pending.from, pending.to, piece);
        let ply = self.append(mv, pending.color)?;
        self.promotion.take();
        self.bump_generation();
        self.check_invariants();
        info!(ply = ply.index(), notation = %ply.notation(), status = %self.status, "Promotion applied");
        Ok(ply)
    }

    /// Drops the pending promotion, if any. History and generation are untouched.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn cancel_promotion(&mut self) -> Option<PendingPromotion> {
        let cancelled = self.promotion.take();
        debug!(cancelled = cancelled.is_some(), "Promotion cancelled");
        cancelled
    }

    /// Takes back the human's most recent move and every ply after it.
    ///
    /// Returns the index of the new last ply.
    ///
    /// # Errors
    ///
    /// Rejects when the match is over, the bot is thinking, or the human has
    /// not moved yet ([`SessionError::NothingToUndo`]).
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn undo(&mut self) -> Result<usize, SessionError> {
        self.ensure_active()?;
        if self.is_locked() {
            warn!("Undo requested while bot is thinking");
            return Err(SessionError::BotThinking);
        }

        let keep = find_rollback_index(&self.plies, self.human_color()).ok_or_else(|| {
            debug!("No human ply to take back");
            SessionError::NothingToUndo
        })?;

        self.plies.truncate(keep);
        self.status = derive_status(self.rules.as_ref(), self.current_position());
        self.promotion.take();
        self.outstanding_bot_request = None;
        self.bump_generation();
        self.check_invariants();

        let last_index = keep - 1;
        info!(last_index, generation = self.generation, "Rolled back");
        Ok(last_index)
    }

    // ─────────────────────────────────────────────────────────────
    //  Bot seam
    // ─────────────────────────────────────────────────────────────

    /// Marks a bot request as outstanding and returns its ticket.
    ///
    /// # Errors
    ///
    /// Rejects when the match is over, a request is already outstanding, or it
    /// is not the bot's turn.
    #[instrument(skip(self), fields(session_id = %self.id, generation = self.generation))]
    pub fn begin_bot_request(&mut self) -> Result<BotTicket, SessionError> {
        self.ensure_active()?;
        if self.is_locked() {
            return Err(SessionError::BotThinking);
        }
        if self.side_to_move() != self.bot_color() {
            return Err(SessionError::NotBotsTurn);
        }

        self.outstanding_bot_request = Some(self.generation);
        let ticket = BotTicket::new(
            self.id.clone(),
            self.generation,
            self.bot_color(),
            self.rules.encode_position(self.current_position()),
            self.last_ply().notation().to_string(),
            self.config.difficulty(),
            self.plies.len(),
        );
        debug!("Bot request issued");
        Ok(ticket)
    }

    /// Whether `ticket` still describes this session's outstanding request.
    pub fn is_current(&self, ticket: &BotTicket) -> bool {
        ticket.session_id() == &self.id
            && *ticket.generation() == self.generation
            && self.outstanding_bot_request == Some(*ticket.generation())
            && *ticket.ply_count() == self.plies.len()
            && self.side_to_move() == *ticket.bot_color()
    }

    /// Plays the bot's move for a current ticket and resolves the request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleTicket`] for a superseded ticket and
    /// [`SessionError::IllegalMove`] if the move is illegal; the request stays
    /// outstanding in the latter case so the caller can fall back.
    #[instrument(skip(self, ticket), fields(session_id = %self.id, mv = %mv))]
    pub fn apply_bot_move(
        &mut self,
        ticket: &BotTicket,
        mv: MoveDescriptor,
    ) -> Result<Ply<R::Position>, SessionError> {
        if !self.is_current(ticket) {
            debug!(ticket_generation = ticket.generation(), "Stale bot move ignored");
            return Err(SessionError::StaleTicket);
        }
        let ply = self.append(mv, *ticket.bot_color())?;
        self.outstanding_bot_request = None;
        self.check_invariants();
        info!(ply = ply.index(), notation = %ply.notation(), status = %self.status, "Bot move applied");
        Ok(ply)
    }

    /// Resolves a current request without a move. Returns `false` for a stale ticket.
    #[instrument(skip(self, ticket), fields(session_id = %self.id))]
    pub fn release_bot_request(&mut self, ticket: &BotTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.outstanding_bot_request = None;
        debug!("Bot request released without a move");
        true
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            debug!(status = %self.status, "Command rejected, match over");
            return Err(SessionError::MatchOver(self.status));
        }
        Ok(())
    }

    /// Applies `mv` through the rules engine and appends the resulting ply.
    fn append(
        &mut self,
        mv: MoveDescriptor,
        mover: Color,
    ) -> Result<Ply<R::Position>, SessionError> {
        let position = self.rules.apply_move(self.current_position(), &mv)?;
        let ply = Ply::after_move(
            self.plies.len(),
            position,
            mv,
            mover,
            self.rules.to_notation(&mv),
        );
        self.status = derive_status(self.rules.as_ref(), ply.resulting_position());
        self.plies.push(ply.clone());
        Ok(ply)
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
    }

    fn check_invariants(&self) {
        if let Err(violations) = SessionInvariants::check_all(self) {
            for violation in &violations {
                error!(session_id = %self.id, invariant = %violation.description, "Invariant violated");
            }
            debug_assert!(violations.is_empty(), "session invariants violated");
        }
    }
}
