//! Tests for bot move orchestration.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{FailingBot, ScriptedBot, SlowBot, sq, white_session};
use strictly_chess::{
    Color, MatchSession, MatchStatus, MoveDescriptor, RulesEngine, RulesError, SessionConfig,
    SessionError, Square,
};
use strictly_match::{BotMoveOrchestrator, BotService, BotSettlement, MoveSource};

fn orchestrator(bot: Arc<dyn BotService>, timeout: Duration) -> BotMoveOrchestrator {
    BotMoveOrchestrator::new(bot, timeout).with_seed(7)
}

#[tokio::test]
async fn test_remote_move_is_applied() {
    let bot = Arc::new(ScriptedBot::new(&["e7e5"]));
    let mut orch = orchestrator(bot.clone(), Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let settlement = orch.request_move(&mut session).await.unwrap();
    match settlement {
        BotSettlement::Applied { ply, source } => {
            assert_eq!(source, MoveSource::Remote);
            assert_eq!(ply.notation(), "e7e5");
            assert_eq!(ply.mover(), Some(Color::Black));
        }
        other => panic!("Expected applied move, got {:?}", other),
    }
    assert!(!session.is_locked());
    assert_eq!(session.plies().len(), 3);

    let requests = bot.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].last_move, "e2e4");
    assert_eq!(requests[0].session_id, session.id());
}

#[tokio::test]
async fn test_timeout_falls_back_within_bound() {
    let bot = Arc::new(SlowBot {
        delay: Duration::from_secs(5),
        mv: "e7e5".to_string(),
    });
    let mut orch = orchestrator(bot, Duration::from_millis(50));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let started = Instant::now();
    let settlement = orch.request_move(&mut session).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(50) + Duration::from_secs(1));

    match settlement {
        BotSettlement::Applied { ply, source } => {
            assert_eq!(source, MoveSource::Fallback);
            assert_eq!(ply.mover(), Some(Color::Black));
        }
        other => panic!("Expected fallback move, got {:?}", other),
    }
    assert!(!session.is_locked());
    assert_eq!(session.plies().len(), 3);
    assert_eq!(session.side_to_move(), Color::White);
}

#[tokio::test]
async fn test_failed_service_falls_back() {
    let mut orch = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("d2"), sq("d4")).unwrap();

    let settlement = orch.request_move(&mut session).await.unwrap();
    assert!(matches!(
        settlement,
        BotSettlement::Applied {
            source: MoveSource::Fallback,
            ..
        }
    ));
    assert!(!session.is_locked());
}

#[tokio::test]
async fn test_illegal_remote_move_falls_back() {
    // White's move offered to Black.
    let bot = Arc::new(ScriptedBot::new(&["d2d4"]));
    let mut orch = orchestrator(bot, Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let settlement = orch.request_move(&mut session).await.unwrap();
    match settlement {
        BotSettlement::Applied { ply, source } => {
            assert_eq!(source, MoveSource::Fallback);
            assert_eq!(ply.mover(), Some(Color::Black));
        }
        other => panic!("Expected fallback move, got {:?}", other),
    }
}

#[tokio::test]
async fn test_garbage_remote_move_falls_back() {
    let bot = Arc::new(ScriptedBot::new(&["resign"]));
    let mut orch = orchestrator(bot, Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let settlement = orch.request_move(&mut session).await.unwrap();
    assert!(matches!(
        settlement,
        BotSettlement::Applied {
            source: MoveSource::Fallback,
            ..
        }
    ));
}

#[tokio::test]
async fn test_same_seed_same_fallback() {
    let mut first = white_session();
    let mut second = white_session();
    for session in [&mut first, &mut second] {
        session.submit_move(sq("e2"), sq("e4")).unwrap();
    }

    let mut a = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    let mut b = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    a.request_move(&mut first).await.unwrap();
    b.request_move(&mut second).await.unwrap();

    assert_eq!(first.last_ply().mv(), second.last_ply().mv());
}

#[tokio::test]
async fn test_completion_after_new_match_is_discarded() {
    let bot = Arc::new(ScriptedBot::new(&["e7e5"]));
    let mut orch = orchestrator(bot, Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let ticket = session.begin_bot_request().unwrap();
    let completion = orch.fetch_task(ticket).await;

    let mut next = session.successor(SessionConfig::new(Color::White));
    let settlement = orch.settle(&mut next, completion);

    assert_eq!(settlement, BotSettlement::DiscardedStale);
    assert_eq!(next.plies().len(), 1);
    assert!(!next.is_locked());
}

#[tokio::test]
async fn test_duplicate_completion_is_discarded() {
    let bot = Arc::new(ScriptedBot::new(&["e7e5"]));
    let mut orch = orchestrator(bot, Duration::from_secs(1));
    let mut session = white_session();
    session.submit_move(sq("e2"), sq("e4")).unwrap();

    let ticket = session.begin_bot_request().unwrap();
    let completion = orch.fetch_task(ticket).await;

    let first = orch.settle(&mut session, completion.clone());
    assert!(matches!(first, BotSettlement::Applied { .. }));
    let second = orch.settle(&mut session, completion);
    assert_eq!(second, BotSettlement::DiscardedStale);
    assert_eq!(session.plies().len(), 3);
}

#[tokio::test]
async fn test_request_on_human_turn_is_rejected() {
    let mut orch = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    let mut session = white_session();
    let result = orch.request_move(&mut session).await;
    assert_eq!(result.unwrap_err(), SessionError::NotBotsTurn);
    assert!(!session.is_locked());
}

/// Rules where the side to move never has a move yet the game is not over.
#[derive(Debug, Default)]
/// Lists `offered` as legal but refuses to play anything.
struct FrozenRules {
    offered: Vec<MoveDescriptor>,
}

impl RulesEngine for FrozenRules {
    type Position = Color;

    fn standard_start(&self) -> Color {
        Color::White
    }

    fn side_to_move(&self, position: &Color) -> Color {
        *position
    }

    fn is_check(&self, _position: &Color) -> bool {
        false
    }

    fn piece_color_at(&self, _position: &Color, _square: Square) -> Option<Color> {
        None
    }

    fn piece_count(&self, _position: &Color, _color: Color) -> usize {
        1
    }

    fn apply_move(&self, _position: &Color, mv: &MoveDescriptor) -> Result<Color, RulesError> {
        Err(RulesError::IllegalMove(*mv))
    }

    fn legal_moves(&self, _position: &Color) -> Vec<MoveDescriptor> {
        self.offered.clone()
    }

    fn is_checkmate(&self, _position: &Color) -> bool {
        false
    }

    fn is_stalemate(&self, _position: &Color) -> bool {
        false
    }

    fn is_draw(&self, _position: &Color) -> bool {
        false
    }

    fn is_promotion_move(&self, _position: &Color, _from: Square, _to: Square) -> bool {
        false
    }

    fn encode_position(&self, position: &Color) -> String {
        position.to_string()
    }

    fn decode_position(&self, encoded: &str) -> Result<Color, RulesError> {
        encoded.parse().map_err(|_| RulesError::InvalidPosition {
            encoded: encoded.to_string(),
            reason: "not a color".to_string(),
        })
    }
}

#[tokio::test]
async fn test_no_legal_moves_releases_lock() {
    let mut orch = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    let mut session = MatchSession::start(
        Arc::new(FrozenRules { offered: Vec::new() }),
        SessionConfig::new(Color::Black),
    );
    assert!(session.is_bot_turn());

    let settlement = orch.request_move(&mut session).await.unwrap();
    assert_eq!(settlement, BotSettlement::NoLegalMoves);
    assert!(!session.is_locked());
    assert_eq!(session.plies().len(), 1);
    assert_eq!(session.status(), MatchStatus::Active);
}

#[tokio::test]
async fn test_engine_refusing_listed_move_is_reported() {
    let mut orch = orchestrator(Arc::new(FailingBot), Duration::from_secs(1));
    let listed: MoveDescriptor = "e2e4".parse().unwrap();
    let mut session = MatchSession::start(
        Arc::new(FrozenRules {
            offered: vec![listed],
        }),
        SessionConfig::new(Color::Black),
    );

    let settlement = orch.request_move(&mut session).await.unwrap();
    match settlement {
        BotSettlement::EngineRejected { mv, reason } => {
            assert_eq!(mv, listed);
            assert!(!reason.is_empty());
        }
        other => panic!("expected an engine rejection, got {:?}", other),
    }
    assert!(!session.is_locked());
    assert_eq!(session.plies().len(), 1);
}
