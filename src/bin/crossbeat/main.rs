//! crossbeat - two-voice polyrhythm player for the terminal
//!
//! Run with: cargo run -- --left 3 --right 4

mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::Crossbeat;
use crossbeat::config::SessionConfig;

const LOG_ENV: &str = "CROSSBEAT_LOG";

#[derive(Parser)]
#[command(name = "crossbeat")]
#[command(about = "Play one rhythm against another", long_about = None)]
struct Cli {
    /// Session file (TOML) with starting values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base rhythm beat count
    #[arg(short, long)]
    left: Option<u32>,

    /// Cross rhythm beat count
    #[arg(short, long)]
    right: Option<u32>,

    /// Pitch of the base voice (Bb3..A4)
    #[arg(long)]
    left_note: Option<String>,

    /// Pitch of the cross voice (Bb2..A3)
    #[arg(long)]
    right_note: Option<String>,

    /// Tempo, 20-300
    #[arg(short, long)]
    tempo: Option<f64>,

    /// Output level in dB, -45 to -5
    #[arg(short, long, allow_negative_numbers = true)]
    volume: Option<f32>,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run without audio for this many seconds and print every note
    #[arg(long, value_name = "SECONDS")]
    simulate: Option<f64>,
}

impl Cli {
    fn session(&self) -> EyreResult<SessionConfig> {
        let mut session = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };

        if let Some(left) = self.left {
            session.rhythm.left_beats = left;
        }
        if let Some(right) = self.right {
            session.rhythm.right_beats = right;
        }
        if let Some(note) = &self.left_note {
            session.notes.left = note.clone();
        }
        if let Some(note) = &self.right_note {
            session.notes.right = note.clone();
        }
        if let Some(tempo) = self.tempo {
            session.tempo = tempo;
        }
        if let Some(volume) = self.volume {
            session.volume = volume;
        }
        Ok(session)
    }
}

fn init_logging(cli: &Cli) -> EyreResult<()> {
    let filter = || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    match (&cli.log_file, cli.simulate) {
        (Some(path), _) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, Some(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
        // Nothing may write to the terminal under the TUI
        (None, None) => {}
    }
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli)?;
    let app = Crossbeat::new().session(cli.session()?);

    match cli.simulate {
        Some(seconds) => app.simulate(seconds),
        None => app.run(),
    }
}
