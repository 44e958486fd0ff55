//! Command-line interface for strictly_match.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strictly_chess::{Color, Difficulty};

/// Strictly Match - play chess against a remote bot with a local fallback
#[derive(Parser, Debug)]
#[command(name = "strictly_match")]
#[command(about = "Human versus bot chess in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "strictly_match.toml")]
    pub config: PathBuf,

    /// Override the database path from the configuration
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Free play from the standard start
    Play {
        /// Side to play (white or black)
        #[arg(long)]
        color: Option<Color>,

        /// Bot difficulty (easy, medium, hard)
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Play a guided lesson from a TOML lesson plan
    Lesson {
        /// Path to the lesson file
        path: PathBuf,
    },

    /// Play from a position given as FEN
    Import {
        /// Position in FEN
        fen: String,

        /// Side to play (white or black)
        #[arg(long)]
        color: Option<Color>,
    },

    /// Resume a saved session, or list saved sessions when no id is given
    Resume {
        /// Session id to resume
        session_id: Option<String>,

        /// Side the human played, used only when the session has no stored settings
        #[arg(long)]
        color: Option<Color>,
    },
}
