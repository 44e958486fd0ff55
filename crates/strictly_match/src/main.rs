//! Strictly Match - terminal front end
//!
//! Reads moves from stdin and prints the board after each event.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use strictly_chess::{
    Color, Difficulty, MatchEvent, MatchMode, MatchSession, MoveDescriptor, PieceKind, RulesEngine,
    SessionConfig, StandardPosition, StandardRules,
};
use strictly_match::{
    AppConfig, BotMoveOrchestrator, BotService, InMemoryGateway, LessonPlan, MatchCommand,
    MatchController, OfflineBot, PersistenceGateway, PersistenceWriter, RemoteBotClient,
    SqliteGateway,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load_or_default(&cli.config)?.with_env_overrides();
    if let Some(db_path) = cli.db_path {
        config = config.with_db_path(db_path);
    }

    let rules = Arc::new(StandardRules::new());
    let store = open_store(&config);

    let session = match cli.command {
        Command::Play { color, difficulty } => {
            let human = color.unwrap_or(*config.human_color());
            let session_config = SessionConfig::new(human)
                .with_difficulty(difficulty.unwrap_or(*config.difficulty()));
            MatchSession::start(Arc::clone(&rules), session_config)
        }
        Command::Lesson { path } => {
            let plan = LessonPlan::from_file(&path)?;
            println!("{}", plan.title());
            if !plan.description().is_empty() {
                println!("{}", plan.description());
            }
            for objective in plan.objectives() {
                println!("  - {}", objective);
            }
            let session_config = plan.session_config(rules.as_ref())?;
            MatchSession::start(Arc::clone(&rules), session_config)
        }
        Command::Import { fen, color } => {
            let start = rules.decode_position(&fen)?;
            let human = color.unwrap_or_else(|| rules.side_to_move(&start));
            let session_config = SessionConfig::new(human)
                .with_difficulty(*config.difficulty())
                .with_starting_position(start)
                .with_mode(MatchMode::Imported);
            MatchSession::start(Arc::clone(&rules), session_config)
        }
        Command::Resume { session_id, color } => {
            let Some(session_id) = session_id else {
                return list_sessions(&config);
            };
            let stored = store
                .load(&session_id)?
                .with_context(|| format!("No saved session '{}'", session_id))?;
            let session_config = match store.load_meta(&session_id)? {
                Some(meta) => {
                    if color.is_some_and(|c| c != meta.human_color) {
                        warn!(stored = %meta.human_color, "Ignoring --color, session keeps its side");
                    }
                    meta.into_config()
                }
                None => {
                    let human = color.unwrap_or(*config.human_color());
                    SessionConfig::new(human).with_difficulty(*config.difficulty())
                }
            };
            MatchSession::restore(Arc::clone(&rules), session_config, session_id, &stored)?
        }
    };

    play(session, &config, store).await
}

/// Opens the configured database, falling back to memory on failure.
#[instrument(skip(config), fields(db_path = %config.db_path()))]
fn open_store(config: &AppConfig) -> Arc<dyn PersistenceGateway> {
    match SqliteGateway::open(config.db_path().clone()) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            warn!(error = %e, "Database unavailable, sessions will not be saved");
            Arc::new(InMemoryGateway::new())
        }
    }
}

/// Prints saved session ids.
fn list_sessions(config: &AppConfig) -> Result<()> {
    let gateway = SqliteGateway::open(config.db_path().clone())?;
    let sessions = gateway.list_sessions()?;
    if sessions.is_empty() {
        println!("No saved sessions.");
    }
    for id in sessions {
        println!("{}", id);
    }
    Ok(())
}

/// Runs the match until the player quits or stdin closes.
#[instrument(skip_all, fields(session_id = %session.id()))]
async fn play(
    session: MatchSession<StandardRules>,
    config: &AppConfig,
    store: Arc<dyn PersistenceGateway>,
) -> Result<()> {
    let human = session.human_color();
    let difficulty = session.config().difficulty();
    println!("You play {}. Enter moves like e2e4, or 'help'.", human);
    print_board(session.current_position());

    let service: Arc<dyn BotService> = match config.bot_url() {
        Some(url) => Arc::new(RemoteBotClient::new(url.clone())),
        None => {
            info!("No bot endpoint configured, bot plays random legal moves");
            Arc::new(OfflineBot)
        }
    };
    let orchestrator = BotMoveOrchestrator::new(service, config.bot_timeout());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let writer = PersistenceWriter::spawn(store);
    let controller = MatchController::new(session, orchestrator, event_tx, Some(writer));
    let controller_task = tokio::spawn(controller.run(command_rx));

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event, human);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let commands = match parse_input(input, human, difficulty) {
            Some(commands) => commands,
            None if input == "help" => {
                print_help();
                continue;
            }
            None => {
                println!("Unrecognised input '{}'. Type 'help'.", input);
                continue;
            }
        };
        let quitting = commands.iter().any(|c| matches!(c, MatchCommand::Quit));
        for command in commands {
            if command_tx.send(command).is_err() {
                warn!("Controller stopped");
                break;
            }
        }
        if quitting {
            break;
        }
    }

    drop(command_tx);
    controller_task.await?;
    printer.await?;
    Ok(())
}

/// Turns a line of input into controller commands.
fn parse_input(
    input: &str,
    human: Color,
    difficulty: Difficulty,
) -> Option<Vec<MatchCommand<StandardPosition>>> {
    let lower = input.to_ascii_lowercase();
    let commands = match lower.as_str() {
        "quit" | "exit" => vec![MatchCommand::Quit],
        "undo" | "u" => vec![MatchCommand::Undo],
        "cancel" => vec![MatchCommand::CancelPromotion],
        "new" => vec![MatchCommand::NewMatch(
            SessionConfig::new(human).with_difficulty(difficulty),
        )],
        _ => {
            let mut chars = lower.chars();
            if let (Some(c), None) = (chars.next(), chars.next())
                && let Some(piece) = PieceKind::from_char(c)
            {
                return Some(vec![MatchCommand::FinalizePromotion(piece)]);
            }
            let mv: MoveDescriptor = lower.parse().ok()?;
            let mut commands = vec![MatchCommand::SubmitMove {
                from: mv.from,
                to: mv.to,
            }];
            if let Some(piece) = mv.promotion {
                commands.push(MatchCommand::FinalizePromotion(piece));
            }
            commands
        }
    };
    Some(commands)
}

fn print_help() {
    println!("  e2e4     move a piece (append q/r/b/n to promote, e.g. e7e8q)");
    println!("  q r b n  choose a promotion piece");
    println!("  cancel   cancel a pending promotion");
    println!("  undo     take back your last move");
    println!("  new      start a new game");
    println!("  quit     leave");
}

fn print_event(event: &MatchEvent<StandardPosition>, human: Color) {
    match event {
        MatchEvent::MatchStarted { session_id } => println!("Game {}", session_id),
        MatchEvent::MoveApplied(ply) => {
            let who = if ply.was_played_by(human) { "You" } else { "Bot" };
            println!("{} played {}", who, ply.notation());
            print_board(ply.resulting_position());
        }
        MatchEvent::PromotionRequired(pending) => {
            println!("Promote {}{} to q, r, b or n?", pending.from, pending.to)
        }
        MatchEvent::PromotionCancelled => println!("Promotion cancelled"),
        MatchEvent::RolledBack { last_index } => println!("Took back to ply {}", last_index),
        MatchEvent::StatusChanged(status) => println!("Status: {}", status),
        MatchEvent::BotThinking(true) => println!("Bot is thinking..."),
        MatchEvent::BotThinking(false) => {}
        MatchEvent::LessonCompleted => println!("Lesson complete!"),
        MatchEvent::Error { detail, .. } => println!("{}", detail),
    }
}

/// Draws the board from White's side.
fn print_board(position: &StandardPosition) {
    let fen = position.fen();
    let placement = fen.split(' ').next().unwrap_or_default();
    for (i, row) in placement.split('/').enumerate() {
        let mut line = String::new();
        for c in row.chars() {
            match c.to_digit(10) {
                Some(n) => (0..n).for_each(|_| line.push_str(" .")),
                None => {
                    line.push(' ');
                    line.push(c);
                }
            }
        }
        println!("{}{}", 8 - i, line);
    }
    println!("  a b c d e f g h");
}
