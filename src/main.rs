//! Flashpile - a timed flashcard pile for the terminal
//!
//! Swipe through a stack of prompt/answer cards before the clock runs out.

mod config;
mod models;
mod session;
mod storage;
mod ui;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides};
use storage::{CardStore, FileStore, KeyValueStore};
use ui::App;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "flashpile")]
#[command(author, version, about = "Timed flashcard pile for the terminal", long_about = None)]
struct Args {
    /// Directory holding the saved cards
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file to use
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Import cards from a CSV file
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Replace the saved cards instead of appending to them on import
    #[arg(long, requires = "import")]
    replace: bool,

    /// Session length in seconds
    #[arg(short, long)]
    seconds: Option<u32>,

    /// Show explicit wrong/correct buttons
    #[arg(long)]
    accessible: bool,

    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.unwrap_or_else(default_log_path);
    if let Err(err) = init_logging(&log_path) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    // Initialize storage
    let data_dir = args.data_dir.unwrap_or_else(FileStore::default_path);
    let mut store = CardStore::new(FileStore::new(data_dir)?);

    // Handle import if requested
    if let Some(csv_path) = args.import {
        let count = store.import_csv(&csv_path, args.replace)?;
        info!(count, path = ?csv_path, "imported cards");
        println!("✓ Imported {} cards", count);
        return Ok(());
    }

    // Load config
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).unwrap_or_else(|err| {
        warn!(error = %err, "using default config");
        Config::default()
    });
    let overrides = Overrides {
        session_seconds: args.seconds,
        voice_assistance: args.accessible,
    };
    let config = overrides.apply(config);

    // Run TUI
    run_tui(store, config, config_path)
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashpile")
        .join("flashpile.log")
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
    }
    File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let file = open_log_file(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_tui<S: KeyValueStore>(
    store: CardStore<S>,
    config: Config,
    config_path: PathBuf,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(store, config, config_path);

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    let snapshot = app.session.snapshot();
    info!(
        remaining_time = snapshot.remaining_time,
        is_active = snapshot.is_active,
        cards_left = snapshot.cards_left,
        "session closed"
    );

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    while app.running {
        if app.take_redraw() {
            terminal.draw(|frame| app.render(frame))?;
        }
        app.handle_events()?;
    }
    Ok(())
}
