use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use streetquiz::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    dataset::{spawn_loader, DatasetKind},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    ui, Action, App,
};
use tracing::{error, info};

const TICK_RATE_MS: u64 = 50;

/// street and intersection quiz on a terminal map
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Learn a city's streets: name highlighted streets and intersections on a map, then review the ones you missed."
)]
pub struct Cli {
    /// GeoJSON file with the streets
    #[clap(long)]
    streets: Option<PathBuf>,

    /// GeoJSON file with the intersections
    #[clap(long)]
    intersections: Option<PathBuf>,

    /// milliseconds to show the answer feedback before the next question
    #[clap(short = 'd', long)]
    answer_delay_ms: Option<u64>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// file to write logs to
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command line values win over the config file.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.streets {
            config.streets_path = path.clone();
        }
        if let Some(path) = &self.intersections {
            config.intersections_path = path.clone();
        }
        if let Some(ms) = self.answer_delay_ms {
            config.answer_delay_ms = ms;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        // logging is best effort; the quiz works without it
        let _ = logging::init_file_logging(&path);
    }

    let config = cli.apply(cli.config_store().load());
    info!(?config, "starting");

    let events = CrosstermEventSource::new();
    spawn_loader(
        DatasetKind::Streets,
        config.streets_path.clone(),
        events.sender(),
    );
    spawn_loader(
        DatasetKind::Intersections,
        config.intersections_path.clone(),
        events.sender(),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let result = start_tui(&mut terminal, &mut app, &runner);
    if let Err(err) = &result {
        error!(error = %err, "ui loop failed");
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: QuizEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let now = Instant::now();

        match runner.step() {
            QuizEvent::Tick => {
                // Only redraw when the pending question actually changed
                if app.is_advancing() {
                    app.on_tick(now);
                    if !app.is_advancing() {
                        terminal.draw(|f| ui::draw(app, f))?;
                    }
                }
            }
            QuizEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            QuizEvent::Dataset(ev) => {
                app.on_dataset(ev);
                terminal.draw(|f| ui::draw(app, f))?;
            }
            QuizEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                app.on_mouse(mouse, Rect::new(0, 0, size.width, size.height));
                terminal.draw(|f| ui::draw(app, f))?;
            }
            QuizEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.on_key(key, now) == Some(Action::Quit) {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use streetquiz::runtime::TestEventSource;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["streetquiz"]);

        assert_eq!(cli.streets, None);
        assert_eq!(cli.intersections, None);
        assert_eq!(cli.answer_delay_ms, None);
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_file, None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "streetquiz",
            "--streets",
            "kyoto/street.geojson",
            "-d",
            "1500",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.streets_path, PathBuf::from("kyoto/street.geojson"));
        assert_eq!(
            config.intersections_path,
            Config::default().intersections_path
        );
        assert_eq!(config.answer_delay_ms, 1500);
    }

    #[test]
    fn test_cli_keeps_config_values_when_absent() {
        let cli = Cli::parse_from(["streetquiz"]);
        let custom = Config {
            streets_path: "a.geojson".into(),
            intersections_path: "b.geojson".into(),
            answer_delay_ms: 10,
        };
        assert_eq!(cli.apply(custom.clone()), custom);
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(TICK_RATE_MS, 50);
    }

    #[test]
    fn test_start_tui_quits_on_key() {
        let (tx, rx) = mpsc::channel();
        tx.send(QuizEvent::Resize).unwrap();
        tx.send(QuizEvent::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
        )))
        .unwrap();

        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut app = App::new(Config::default());

        start_tui(&mut terminal, &mut app, &runner).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Street quiz (loading...)"));
    }
}
