//! Terminal dashboard for an mcphub backend.

mod app;
mod follow;
mod platform;
mod theme;
mod ui;
mod views;

use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use mcphub_api_client::ApiClient;
use mcphub_dashboard::{ApiBackend, Backend, Dashboard, DashboardOptions};
use mcphub_runtime_config::HubConfig;
use ratatui::prelude::*;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Log file written next to the config; stdout belongs to the terminal UI.
pub const LOG_FILE_NAME: &str = "mcphub.log";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Config file to read instead of the default location.
    pub config_path: Option<PathBuf>,
    /// Backend URL overriding the config file and environment.
    pub server_url: Option<String>,
}

/// Launch the TUI and block until the operator quits.
pub fn run(options: RunOptions) -> Result<()> {
    let mut config = mcphub_runtime_config::load(options.config_path.as_deref())?;
    if let Some(url) = options.server_url {
        config.server.url = url;
    }
    init_file_logging();

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let client = ApiClient::new(&config.server.url, config.server.request_timeout())
        .context("Failed to build HTTP client")?;
    let mut dash = Dashboard::new(
        Arc::new(ApiBackend::new(client)),
        dashboard_options(&config),
    );
    info!(server = %config.server.url, "starting dashboard");
    dash.check_session();
    let mut app = App::new(dash);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

pub fn dashboard_options(config: &HubConfig) -> DashboardOptions {
    DashboardOptions {
        server_url: config.server.url.clone(),
        poll_interval: config.dashboard.poll_interval(),
        ide_port: config.dashboard.ide_port,
    }
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App<B>,
) -> Result<()> {
    loop {
        app.dash.drain();
        app.sync_selection();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn init_file_logging() {
    let path = match mcphub_runtime_config::config_dir() {
        Ok(dir) => {
            if std::fs::create_dir_all(&dir).is_err() {
                return;
            }
            dir.join(LOG_FILE_NAME)
        }
        Err(_) => return,
    };
    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(_) => return,
    };
    if tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_err()
    {
        warn!("tracing subscriber already installed");
    }
}
