//! Single owner of the current match.
//!
//! Every command and every bot completion is handled here, one at a time, so
//! the session never sees concurrent mutation. Bot network calls run on
//! spawned tasks and report back through a channel.

use strictly_chess::{
    MatchEvent, MatchSession, MatchStatus, ObjectiveProgress, PieceKind, RulesEngine,
    SessionConfig, SessionError, Square, SubmitOutcome,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::bot::{BotCompletion, BotMoveOrchestrator, BotSettlement};
use crate::persistence::PersistenceWriter;

/// Commands accepted by [`MatchController::run`].
#[derive(Debug, Clone)]
pub enum MatchCommand<P> {
    /// Move a piece.
    SubmitMove {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
    },
    /// Pick the piece for the pending promotion.
    FinalizePromotion(PieceKind),
    /// Drop the pending promotion.
    CancelPromotion,
    /// Take back the human's last move.
    Undo,
    /// Replace the current match.
    NewMatch(SessionConfig<P>),
    /// Stop the controller.
    Quit,
}

/// Owns the current session and drives bot turns.
pub struct MatchController<R: RulesEngine> {
    session: MatchSession<R>,
    orchestrator: BotMoveOrchestrator,
    events: mpsc::UnboundedSender<MatchEvent<R::Position>>,
    completions_tx: mpsc::UnboundedSender<BotCompletion>,
    completions_rx: mpsc::UnboundedReceiver<BotCompletion>,
    in_flight: Option<JoinHandle<()>>,
    persistence: Option<PersistenceWriter>,
    lesson_completed: bool,
}

impl<R: RulesEngine> MatchController<R> {
    /// Takes ownership of `session` and announces it.
    ///
    /// If the bot is to move, its request is issued immediately. Must be
    /// called from within a tokio runtime.
    #[instrument(skip_all, fields(session_id = %session.id()))]
    pub fn new(
        session: MatchSession<R>,
        orchestrator: BotMoveOrchestrator,
        events: mpsc::UnboundedSender<MatchEvent<R::Position>>,
        persistence: Option<PersistenceWriter>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            session,
            orchestrator,
            events,
            completions_tx,
            completions_rx,
            in_flight: None,
            persistence,
            lesson_completed: false,
        };
        controller.announce();
        controller
    }

    /// The current session.
    pub fn session(&self) -> &MatchSession<R> {
        &self.session
    }

    /// Whether a bot request is outstanding.
    pub fn is_bot_thinking(&self) -> bool {
        self.session.is_locked()
    }

    /// Submits a human move.
    ///
    /// # Errors
    ///
    /// Returns the session's rejection, which is also emitted as an error event.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub fn submit_move(&mut self, from: Square, to: Square) -> Result<(), SessionError> {
        let before = self.session.status();
        match self.session.submit_move(from, to) {
            Ok(SubmitOutcome::Applied(ply)) => {
                self.emit(MatchEvent::MoveApplied(ply));
                self.after_mutation(before);
                Ok(())
            }
            Ok(SubmitOutcome::PromotionRequired(pending)) => {
                self.emit(MatchEvent::PromotionRequired(pending));
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Completes the pending promotion.
    ///
    /// # Errors
    ///
    /// Returns the session's rejection, which is also emitted as an error event.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub fn finalize_promotion(&mut self, piece: PieceKind) -> Result<(), SessionError> {
        let before = self.session.status();
        match self.session.finalize_promotion(piece) {
            Ok(ply) => {
                self.emit(MatchEvent::MoveApplied(ply));
                self.after_mutation(before);
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Drops the pending promotion, if any.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub fn cancel_promotion(&mut self) {
        if self.session.cancel_promotion().is_some() {
            self.emit(MatchEvent::PromotionCancelled);
        }
    }

    /// Takes back the human's last move.
    ///
    /// # Errors
    ///
    /// Returns the session's rejection, which is also emitted as an error event.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub fn undo(&mut self) -> Result<(), SessionError> {
        let before = self.session.status();
        match self.session.undo() {
            Ok(last_index) => {
                self.emit(MatchEvent::RolledBack { last_index });
                self.after_mutation(before);
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Replaces the current match with one started from `config`.
    ///
    /// Any outstanding bot request belongs to the old session and is dropped.
    #[instrument(skip(self, config), fields(previous = %self.session.id()))]
    pub fn new_match(&mut self, config: SessionConfig<R::Position>) {
        let was_thinking = self.session.is_locked();
        self.abort_in_flight();
        self.session = self.session.successor(config);
        self.lesson_completed = false;
        if was_thinking {
            self.emit(MatchEvent::BotThinking(false));
        }
        self.announce();
    }

    /// Stops the controller, waiting for queued saves.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub async fn quit(mut self) {
        self.abort_in_flight();
        if let Some(writer) = self.persistence.take() {
            writer.flush().await;
        }
        info!("Match controller stopped");
    }

    /// Settles a bot completion into the current session.
    #[instrument(skip(self, completion), fields(session_id = %self.session.id()))]
    pub fn handle_completion(
        &mut self,
        completion: BotCompletion,
    ) -> BotSettlement<R::Position> {
        let before = self.session.status();
        let settlement = self.orchestrator.settle(&mut self.session, completion);
        match &settlement {
            BotSettlement::Applied { ply, source } => {
                info!(source = %source, notation = %ply.notation(), "Bot moved");
                self.in_flight = None;
                self.emit(MatchEvent::BotThinking(false));
                self.emit(MatchEvent::MoveApplied(ply.clone()));
                self.after_mutation(before);
            }
            BotSettlement::NoLegalMoves => {
                self.in_flight = None;
                self.emit(MatchEvent::BotThinking(false));
            }
            BotSettlement::EngineRejected { mv, reason } => {
                self.in_flight = None;
                self.emit(MatchEvent::BotThinking(false));
                self.emit(MatchEvent::Error {
                    kind: "engine_rejected",
                    detail: format!("Bot move {} was refused: {}", mv, reason),
                });
            }
            BotSettlement::DiscardedStale => debug!("Stale completion ignored"),
        }
        settlement
    }

    /// Waits for the next bot completion.
    pub async fn next_completion(&mut self) -> Option<BotCompletion> {
        self.completions_rx.recv().await
    }

    /// Handles commands and completions until `Quit` or the command channel closes.
    #[instrument(skip_all, fields(session_id = %self.session.id()))]
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<MatchCommand<R::Position>>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(MatchCommand::Quit) => break,
                    Some(command) => self.dispatch(command),
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }
        self.quit().await;
    }

    fn dispatch(&mut self, command: MatchCommand<R::Position>) {
        // Rejections are already reported as error events.
        let _ = match command {
            MatchCommand::SubmitMove { from, to } => self.submit_move(from, to),
            MatchCommand::FinalizePromotion(piece) => self.finalize_promotion(piece),
            MatchCommand::CancelPromotion => {
                self.cancel_promotion();
                Ok(())
            }
            MatchCommand::Undo => self.undo(),
            MatchCommand::NewMatch(config) => {
                self.new_match(config);
                Ok(())
            }
            MatchCommand::Quit => Ok(()),
        };
    }

    fn announce(&mut self) {
        info!(session_id = %self.session.id(), status = %self.session.status(), "Match announced");
        self.emit(MatchEvent::MatchStarted {
            session_id: self.session.id().to_string(),
        });
        self.emit(MatchEvent::StatusChanged(self.session.status()));
        self.persist();
        self.check_lesson();
        self.request_bot_if_due();
    }

    fn after_mutation(&mut self, before: MatchStatus) {
        let status = self.session.status();
        if status != before {
            info!(from = %before, to = %status, "Status changed");
            self.emit(MatchEvent::StatusChanged(status));
        }
        self.persist();
        self.check_lesson();
        self.request_bot_if_due();
    }

    fn request_bot_if_due(&mut self) {
        if !self.session.is_bot_turn() || self.session.is_locked() {
            return;
        }
        let ticket = match self.session.begin_bot_request() {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(error = %e, "Could not start bot request");
                return;
            }
        };
        self.emit(MatchEvent::BotThinking(true));

        let fetch = self.orchestrator.fetch_task(ticket);
        let tx = self.completions_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let completion = fetch.await;
            if tx.send(completion).is_err() {
                debug!("Controller gone, completion dropped");
            }
        }));
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            debug!("Aborting in-flight bot request");
            task.abort();
        }
    }

    fn persist(&self) {
        if let Some(writer) = &self.persistence {
            writer.save(
                self.session.id(),
                self.session.config().meta(),
                self.session.stored_plies(),
            );
        }
    }

    fn check_lesson(&mut self) {
        if self.lesson_completed {
            return;
        }
        if self.session.lesson_progress() == Some(ObjectiveProgress::Completed) {
            info!("Lesson completed");
            self.lesson_completed = true;
            self.emit(MatchEvent::LessonCompleted);
        }
    }

    fn reject(&self, err: SessionError) -> SessionError {
        warn!(kind = err.kind(), error = %err, "Command rejected");
        self.emit(MatchEvent::rejected(&err));
        err
    }

    fn emit(&self, event: MatchEvent<R::Position>) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}
