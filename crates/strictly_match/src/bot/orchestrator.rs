//! Bot move orchestration: remote request, random fallback, stale rejection.
//!
//! A bot turn is split in two. [`BotMoveOrchestrator::fetch`] runs off the
//! control task and never sees the session; [`BotMoveOrchestrator::settle`]
//! runs on the control task and is the only step that mutates it. A
//! completion whose ticket no longer matches the session is dropped without
//! touching anything.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use strictly_chess::{
    BotTicket, MatchSession, MoveDescriptor, Ply, RulesEngine, SessionError,
};
use tracing::{debug, error, info, instrument, warn};

use crate::bot::{BotMoveReply, BotMoveRequest, BotService};

/// Timeout applied to the remote call when none is configured.
pub const DEFAULT_BOT_TIMEOUT: Duration = Duration::from_secs(8);

/// Result of a fetch, carried back to the control task.
#[derive(Debug, Clone)]
pub struct BotCompletion {
    /// Ticket of the request this completes.
    pub ticket: BotTicket,
    /// Remote reply, or why there is none.
    pub result: Result<BotMoveReply, String>,
}

/// Where an applied bot move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MoveSource {
    /// The remote service's move.
    Remote,
    /// A uniformly random legal move.
    Fallback,
}

/// How a bot request settled. Every request settles exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum BotSettlement<P> {
    /// A move was appended and the lock released.
    Applied {
        /// The appended ply.
        ply: Ply<P>,
        /// Remote or fallback.
        source: MoveSource,
    },
    /// The session moved on; nothing was touched.
    DiscardedStale,
    /// No legal move exists; the lock was released without a ply.
    NoLegalMoves,
    /// The rules engine refused a move it had listed as legal. The lock was
    /// released without a ply.
    EngineRejected {
        /// The refused move.
        mv: MoveDescriptor,
        /// The engine's reason.
        reason: String,
    },
}

/// Requests bot moves and settles them into a session.
pub struct BotMoveOrchestrator {
    service: Arc<dyn BotService>,
    timeout: Duration,
    rng: StdRng,
}

impl std::fmt::Debug for BotMoveOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotMoveOrchestrator")
            .field("service", &self.service.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BotMoveOrchestrator {
    /// Creates an orchestrator with an OS-seeded random source.
    #[instrument(skip(service), fields(service = %service.name()))]
    pub fn new(service: Arc<dyn BotService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replaces the random source with a seeded one, for reproducible fallbacks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Bound on the remote call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The future that performs the remote call for `ticket`.
    ///
    /// Owns everything it needs, so it can be spawned onto another task.
    pub fn fetch_task(&self, ticket: BotTicket) -> impl Future<Output = BotCompletion> + Send + 'static {
        Self::fetch(Arc::clone(&self.service), ticket, self.timeout)
    }

    /// Calls `service` for `ticket`, giving up after `timeout`.
    #[instrument(skip(service, ticket), fields(service = %service.name(), session_id = %ticket.session_id(), generation = ticket.generation()))]
    pub async fn fetch(
        service: Arc<dyn BotService>,
        ticket: BotTicket,
        timeout: Duration,
    ) -> BotCompletion {
        let request = BotMoveRequest::from(&ticket);
        let result = match tokio::time::timeout(timeout, service.request_move(&request)).await {
            Ok(Ok(reply)) => {
                debug!(mv = %reply.mv, "Bot replied");
                Ok(reply)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Bot request failed");
                Err(e.message)
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Bot request timed out");
                Err(format!("timed out after {:?}", timeout))
            }
        };
        BotCompletion { ticket, result }
    }

    /// Applies a completion to `session` if its ticket is still current.
    ///
    /// A remote move that does not parse or is illegal counts as a failed
    /// request and falls back to a random legal move.
    #[instrument(skip(self, session, completion), fields(session_id = %session.id(), generation = completion.ticket.generation()))]
    pub fn settle<R: RulesEngine>(
        &mut self,
        session: &mut MatchSession<R>,
        completion: BotCompletion,
    ) -> BotSettlement<R::Position> {
        let BotCompletion { ticket, result } = completion;

        if !session.is_current(&ticket) {
            debug!("Discarding stale bot completion");
            return BotSettlement::DiscardedStale;
        }

        match result {
            Ok(reply) => match self.apply_remote(session, &ticket, &reply) {
                Ok(ply) => {
                    return BotSettlement::Applied {
                        ply,
                        source: MoveSource::Remote,
                    };
                }
                Err(reason) => warn!(reason = %reason, "Remote move rejected, using fallback"),
            },
            Err(reason) => info!(reason = %reason, "Remote bot unavailable, using fallback"),
        }

        self.apply_fallback(session, &ticket)
    }

    /// Runs a whole bot turn inline: begin, fetch, settle.
    ///
    /// # Errors
    ///
    /// Returns the session's rejection if a bot request cannot begin.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn request_move<R: RulesEngine>(
        &mut self,
        session: &mut MatchSession<R>,
    ) -> Result<BotSettlement<R::Position>, SessionError> {
        let ticket = session.begin_bot_request()?;
        let completion = self.fetch_task(ticket).await;
        Ok(self.settle(session, completion))
    }

    fn apply_remote<R: RulesEngine>(
        &self,
        session: &mut MatchSession<R>,
        ticket: &BotTicket,
        reply: &BotMoveReply,
    ) -> Result<Ply<R::Position>, String> {
        let mv: MoveDescriptor = reply
            .mv
            .parse()
            .map_err(|e| format!("unparseable move '{}': {}", reply.mv, e))?;
        let ply = session
            .apply_bot_move(ticket, mv)
            .map_err(|e| e.to_string())?;

        let local = session.rules().encode_position(ply.resulting_position());
        if !reply.position.is_empty() && reply.position != local {
            warn!(remote = %reply.position, local = %local, "Bot position disagrees, keeping local");
        }
        Ok(ply)
    }

    fn apply_fallback<R: RulesEngine>(
        &mut self,
        session: &mut MatchSession<R>,
        ticket: &BotTicket,
    ) -> BotSettlement<R::Position> {
        let legal = session.legal_moves();
        let Some(mv) = legal.choose(&mut self.rng).copied() else {
            session.release_bot_request(ticket);
            info!(status = %session.status(), "No legal moves for bot");
            return BotSettlement::NoLegalMoves;
        };

        match session.apply_bot_move(ticket, mv) {
            Ok(ply) => BotSettlement::Applied {
                ply,
                source: MoveSource::Fallback,
            },
            Err(e) => {
                error!(error = %e, mv = %mv, "Rules engine rejected its own legal move");
                session.release_bot_request(ticket);
                BotSettlement::EngineRejected {
                    mv,
                    reason: e.to_string(),
                }
            }
        }
    }
}
