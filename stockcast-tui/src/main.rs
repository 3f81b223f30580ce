//! Stockcast TUI entry point.

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use stockcast_runner::{Dashboard, DashboardConfig};
use stockcast_tui::app::AppState;
use stockcast_tui::{input, persistence, ui};

#[derive(Parser)]
#[command(name = "stockcast-tui", about = "Terminal stock dashboard with ARIMA forecasts")]
struct Args {
    /// Config file (default: <config_dir>/stockcast/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use deterministic offline data instead of Yahoo Finance
    #[arg(long)]
    synthetic: bool,

    /// Log file (default: next to the saved UI state)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let state_path = persistence::default_path();
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| state_path.with_file_name("stockcast.log"));
    init_logging(&log_path)?;

    let mut config = DashboardConfig::load(args.config.as_deref())
        .with_context(|| "failed to load configuration")?;
    if args.synthetic {
        config.provider.synthetic = true;
    }
    let universe = config.universe()?;
    let provider = config
        .build_provider()
        .context("failed to build data provider")?;
    tracing::info!(provider = provider.name(), "starting dashboard");
    let dashboard = config.dashboard(provider);

    let persisted = persistence::load(&state_path);
    let mut app = AppState::new(universe, state_path.clone());
    persistence::apply(&mut app, persisted);
    app.request_load();

    // Restore the terminal before printing a panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &dashboard);

    if let Err(e) = persistence::save(&state_path, &persistence::extract(&app)) {
        tracing::warn!(error = %e, "failed to save UI state");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file; stdout belongs to the alternate screen.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to open {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    dashboard: &Dashboard,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // The loading frame is on screen; now block on the pipeline.
        if app.is_loading() {
            app.run_pending(dashboard);
            continue;
        }

        // 50ms poll, ~20 FPS tick.
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}
