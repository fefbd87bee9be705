mod alert;
mod app;
mod config;
mod error;
mod schedule;
mod session;
mod stats;
mod storage;
mod timer;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::alert::{AmbientPlayer, DesktopAlert};
use crate::app::App;
use crate::config::Config;
use crate::schedule::SystemClock;
use crate::storage::{FileStore, HistoryStore};

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const FRAME_RATE: Duration = Duration::from_millis(50);
const DEFAULT_DATA_DIR: &str = "focusbar";
const LOG_FILE: &str = "focusbar.log";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Clone)]
#[command(author, version, about = "⏱ focusbar - a compact terminal focus timer")]
struct Args {
    /// Focus duration in minutes, snapped to the nearest offered choice
    #[arg(short, long)]
    duration: Option<u32>,
    /// Ambient volume, 0-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,
    #[arg(long)]
    mute: bool,
    /// Disable the completion chime
    #[arg(long)]
    no_sound: bool,
    /// Disable desktop notifications
    #[arg(long)]
    no_notify: bool,
    /// Audio file looped while a session is running
    #[arg(long)]
    ambient: Option<PathBuf>,
    /// Where history, config and logs live
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(d) = self.duration { config.default_minutes = d; }
        if let Some(v) = self.volume { config.volume = v; }
        if self.mute { config.muted = true; }
        if self.no_sound { config.sound_enabled = false; }
        if self.no_notify { config.notifications_enabled = false; }
        if let Some(a) = &self.ambient { config.ambient_sound = Some(a.clone()); }
        config.normalized()
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Logs go to a file so they never draw over the terminal UI.
fn init_logging(data_dir: &Path) {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE));
    let Ok(file) = file else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".").join(DEFAULT_DATA_DIR));
    fs::create_dir_all(&data_dir)?;
    init_logging(&data_dir);

    let store = FileStore::new(&data_dir);
    let config = args.apply(Config::load(&store));
    info!(dir = %data_dir.display(), minutes = config.default_minutes, "starting focusbar");

    let alert = DesktopAlert::new(
        config.sound_enabled,
        config.notifications_enabled,
        config.chime_sound.clone(),
    );
    let mut app = App::new(
        &config,
        HistoryStore::new(Box::new(store)),
        Box::new(alert),
        Box::new(AmbientPlayer::new(config.ambient_sound.clone())),
        Box::new(SystemClock),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("focusbar exited");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render_ui(f, app))?;

        let timeout = app
            .ticks()
            .until_next(Instant::now())
            .map_or(FRAME_RATE, |due| due.min(FRAME_RATE));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = app.action_for(key) {
                        if app.apply(action, Instant::now()) {
                            return Ok(());
                        }
                    }
                }
            }
        }

        app.update(Instant::now());
    }
}
