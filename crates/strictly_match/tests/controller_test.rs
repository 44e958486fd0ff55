//! Tests for the match controller's command and event flow.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingBot, ScriptedBot, SlowBot, sq, white_session};
use strictly_chess::{
    Color, MatchEvent, MatchMode, MatchSession, MatchStatus, PieceKind, RulesEngine,
    SessionConfig, SessionError, StandardPosition, StandardRules, StructuredObjective,
};
use strictly_match::{
    BotMoveOrchestrator, BotService, BotSettlement, InMemoryGateway, MatchCommand,
    MatchController, MoveSource, PersistenceGateway, PersistenceWriter,
};
use tokio::sync::mpsc;

type Events = mpsc::UnboundedReceiver<MatchEvent<StandardPosition>>;

fn controller(
    session: MatchSession<StandardRules>,
    bot: Arc<dyn BotService>,
    timeout: Duration,
) -> (MatchController<StandardRules>, Events) {
    let (tx, rx) = mpsc::unbounded_channel();
    let orch = BotMoveOrchestrator::new(bot, timeout).with_seed(11);
    (MatchController::new(session, orch, tx, None), rx)
}

fn drain(rx: &mut Events) -> Vec<MatchEvent<StandardPosition>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count_moves(events: &[MatchEvent<StandardPosition>]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, MatchEvent::MoveApplied(_)))
        .count()
}

#[tokio::test]
async fn test_start_announces_match() {
    let (ctrl, mut rx) = controller(white_session(), Arc::new(FailingBot), Duration::from_secs(1));
    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            MatchEvent::MatchStarted {
                session_id: ctrl.session().id().to_string()
            },
            MatchEvent::StatusChanged(MatchStatus::Active),
        ]
    );
    assert!(!ctrl.is_bot_thinking());
}

#[tokio::test]
async fn test_bot_reply_after_human_move() {
    let bot = Arc::new(ScriptedBot::new(&["e7e5"]));
    let (mut ctrl, mut rx) = controller(white_session(), bot, Duration::from_secs(1));
    drain(&mut rx);

    ctrl.submit_move(sq("e2"), sq("e4")).unwrap();
    assert!(ctrl.is_bot_thinking());

    let completion = tokio::time::timeout(Duration::from_secs(2), ctrl.next_completion())
        .await
        .expect("completion in time")
        .expect("channel open");
    let settlement = ctrl.handle_completion(completion);
    assert!(matches!(
        settlement,
        BotSettlement::Applied {
            source: MoveSource::Remote,
            ..
        }
    ));

    let events = drain(&mut rx);
    assert_eq!(count_moves(&events), 2);
    assert!(matches!(events[0], MatchEvent::MoveApplied(_)));
    assert_eq!(events[1], MatchEvent::BotThinking(true));
    assert_eq!(events[2], MatchEvent::BotThinking(false));
    assert_eq!(ctrl.session().plies().len(), 3);
}

#[tokio::test]
async fn test_timeout_applies_single_fallback() {
    let bot = Arc::new(SlowBot {
        delay: Duration::from_secs(5),
        mv: "e7e5".to_string(),
    });
    let (mut ctrl, mut rx) = controller(white_session(), bot, Duration::from_millis(50));
    drain(&mut rx);

    ctrl.submit_move(sq("e2"), sq("e4")).unwrap();
    let completion = tokio::time::timeout(Duration::from_secs(2), ctrl.next_completion())
        .await
        .expect("timeout bound respected")
        .expect("channel open");
    let settlement = ctrl.handle_completion(completion);
    assert!(matches!(
        settlement,
        BotSettlement::Applied {
            source: MoveSource::Fallback,
            ..
        }
    ));
    assert!(!ctrl.is_bot_thinking());

    let events = drain(&mut rx);
    assert_eq!(count_moves(&events), 2);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, MatchEvent::PromotionRequired(_)))
    );
}

#[tokio::test]
async fn test_new_match_drops_outstanding_request() {
    let bot = Arc::new(SlowBot {
        delay: Duration::from_millis(100),
        mv: "e7e5".to_string(),
    });
    let (mut ctrl, mut rx) = controller(white_session(), bot, Duration::from_secs(1));
    ctrl.submit_move(sq("e2"), sq("e4")).unwrap();
    let old_id = ctrl.session().id().to_string();
    assert!(ctrl.is_bot_thinking());

    ctrl.new_match(SessionConfig::new(Color::White));
    assert_ne!(ctrl.session().id(), old_id);
    assert!(!ctrl.is_bot_thinking());

    // The aborted request never reports back.
    let late = tokio::time::timeout(Duration::from_millis(300), ctrl.next_completion()).await;
    assert!(late.is_err());
    assert_eq!(ctrl.session().plies().len(), 1);

    let events = drain(&mut rx);
    assert!(events.contains(&MatchEvent::BotThinking(false)));
    assert!(matches!(
        events.last(),
        Some(MatchEvent::StatusChanged(MatchStatus::Active))
    ));
}

#[tokio::test]
async fn test_rejection_is_reported() {
    let (mut ctrl, mut rx) = controller(white_session(), Arc::new(FailingBot), Duration::from_secs(1));
    drain(&mut rx);

    assert_eq!(ctrl.undo(), Err(SessionError::NothingToUndo));
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        MatchEvent::Error {
            kind: "nothing_to_undo",
            ..
        }
    ));
}

#[tokio::test]
async fn test_bot_opens_when_human_plays_black() {
    let bot = Arc::new(ScriptedBot::new(&["d2d4"]));
    let session = MatchSession::start(
        Arc::new(StandardRules::new()),
        SessionConfig::new(Color::Black),
    );
    let (mut ctrl, _rx) = controller(session, bot, Duration::from_secs(1));
    assert!(ctrl.is_bot_thinking());

    let completion = ctrl.next_completion().await.unwrap();
    ctrl.handle_completion(completion);
    assert_eq!(ctrl.session().side_to_move(), Color::Black);
    assert_eq!(ctrl.session().last_ply().notation(), "d2d4");
}

#[tokio::test]
async fn test_promotion_events() {
    let rules = Arc::new(StandardRules::new());
    let start = rules
        .decode_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1")
        .unwrap();
    let session = MatchSession::start(
        rules,
        SessionConfig::new(Color::White).with_starting_position(start),
    );
    let (mut ctrl, mut rx) = controller(session, Arc::new(FailingBot), Duration::from_secs(1));
    drain(&mut rx);

    ctrl.submit_move(sq("e7"), sq("e8")).unwrap();
    ctrl.cancel_promotion();
    ctrl.submit_move(sq("e7"), sq("e8")).unwrap();
    ctrl.finalize_promotion(PieceKind::Queen).unwrap();

    let events = drain(&mut rx);
    assert!(matches!(events[0], MatchEvent::PromotionRequired(_)));
    assert_eq!(events[1], MatchEvent::PromotionCancelled);
    assert!(matches!(events[2], MatchEvent::PromotionRequired(_)));
    assert!(matches!(events[3], MatchEvent::MoveApplied(_)));
    assert_eq!(count_moves(&events), 1);
}

#[tokio::test]
async fn test_lesson_completion_emitted_once() {
    let config = SessionConfig::new(Color::White).with_mode(MatchMode::Lesson {
        objectives: vec![StructuredObjective::MoveCountAtLeast(1)],
    });
    let session = MatchSession::start(Arc::new(StandardRules::new()), config);
    let bot = Arc::new(ScriptedBot::new(&["e7e5", "b8c6"]));
    let (mut ctrl, mut rx) = controller(session, bot, Duration::from_secs(1));

    ctrl.submit_move(sq("e2"), sq("e4")).unwrap();
    let completion = ctrl.next_completion().await.unwrap();
    ctrl.handle_completion(completion);
    ctrl.submit_move(sq("g1"), sq("f3")).unwrap();

    let completed = drain(&mut rx)
        .into_iter()
        .filter(|e| *e == MatchEvent::LessonCompleted)
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn test_every_mutation_is_saved() {
    let gateway = InMemoryGateway::new();
    let writer = PersistenceWriter::spawn(Arc::new(gateway.clone()));
    let (tx, _rx) = mpsc::unbounded_channel();
    let orch = BotMoveOrchestrator::new(Arc::new(ScriptedBot::new(&["e7e5"])), Duration::from_secs(1));
    let mut ctrl = MatchController::new(white_session(), orch, tx, Some(writer));
    let session_id = ctrl.session().id().to_string();

    ctrl.submit_move(sq("e2"), sq("e4")).unwrap();
    let completion = ctrl.next_completion().await.unwrap();
    ctrl.handle_completion(completion);
    ctrl.quit().await;

    let stored = gateway.load(&session_id).unwrap().expect("saved");
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].mv.as_deref(), Some("e7e5"));

    let meta = gateway.load_meta(&session_id).unwrap().expect("meta saved");
    assert_eq!(meta.human_color, Color::White);
    assert_eq!(meta.mode, MatchMode::FreePlay);
}

#[tokio::test]
async fn test_run_loop_until_quit() {
    let bot = Arc::new(ScriptedBot::new(&["e7e5"]));
    let (ctrl, mut rx) = controller(white_session(), bot, Duration::from_secs(1));
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(ctrl.run(command_rx));

    command_tx
        .send(MatchCommand::SubmitMove {
            from: sq("e2"),
            to: sq("e4"),
        })
        .unwrap();

    // Wait for the bot's reply to come through the loop.
    let mut moves = 0;
    while moves < 2 {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open");
        if matches!(event, MatchEvent::MoveApplied(_)) {
            moves += 1;
        }
    }

    command_tx.send(MatchCommand::Quit).unwrap();
    task.await.unwrap();
}
