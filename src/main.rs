pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use flashbrain::{
    app_dirs::AppDirs,
    catalog::{self, Catalog, TrainingData},
    config::{FileSettingsStore, Settings, SettingsError, SettingsStore},
    presenter::PhaseClock,
    runtime::{CrosstermEventSource, FixedTicker, Runner, SessionEvent},
    session::{Phase, SessionController},
};
use log::LevelFilter;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

const TICK_RATE_MS: u64 = 50;

/// flash images and text for memorization, reading each text word by word
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Presents training classes item by item: the image first, then its text for a time proportional to its word count, highlighting one word at a time."
)]
pub struct Cli {
    /// training class to present (defaults to the newest class in the catalog)
    class_id: Option<String>,

    /// present a single training.json file instead of a catalog class
    #[clap(short = 'f', long, conflicts_with = "class_id")]
    file: Option<PathBuf>,

    /// directory with one sub-directory (holding a training.json) per class
    #[clap(long)]
    classes_dir: Option<PathBuf>,

    /// list the available classes and exit
    #[clap(long)]
    list: bool,

    /// seconds each word keeps the text on screen
    #[clap(short = 'r', long)]
    seconds_per_word: Option<f64>,

    /// shortest time any text stays on screen, in milliseconds
    #[clap(long)]
    min_duration: Option<u64>,

    /// longest time any text stays on screen, in milliseconds
    #[clap(long)]
    max_duration: Option<u64>,

    /// how long the image is shown alone before its text, in milliseconds
    #[clap(long)]
    image_dwell: Option<u64>,

    /// do not highlight words while the text is showing
    #[clap(long)]
    no_highlight: bool,

    /// start with debug mode on (more detail on screen and in the log)
    #[clap(long)]
    debug: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_settings: bool,
}

impl Cli {
    /// Layer command line overrides on top of stored settings.
    fn apply_to(&self, settings: &mut Settings) -> Result<(), SettingsError> {
        if let Some(rate) = self.seconds_per_word {
            settings.set_seconds_per_word(rate)?;
        }
        if self.min_duration.is_some() || self.max_duration.is_some() {
            let current = settings.bounds();
            let min = self
                .min_duration
                .unwrap_or(current.min.as_millis() as u64);
            let max = self
                .max_duration
                .unwrap_or(current.max.as_millis() as u64);
            settings.set_duration_bounds(min, max)?;
        }
        if let Some(dwell) = self.image_dwell {
            settings.set_image_dwell(dwell);
        }
        if self.no_highlight {
            settings.set_highlight_words(false);
        }
        if self.debug {
            settings.set_debug_mode(true);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Presenting,
    Finished,
}

#[derive(Debug)]
pub struct App {
    pub settings: Settings,
    pub controller: SessionController,
    pub clock: PhaseClock,
    pub state: AppState,
    pub title: String,
    /// Kept so the class can be restarted after `reset` dropped it.
    source: Option<TrainingData>,
}

impl App {
    pub fn new(settings: Settings, data: Option<TrainingData>) -> Self {
        let title = data
            .as_ref()
            .map(|d| d.meta.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "flashbrain".to_string());

        let mut app = Self {
            settings,
            controller: SessionController::new(),
            clock: PhaseClock::new(),
            state: AppState::Presenting,
            title,
            source: data,
        };
        app.controller.start(app.source.clone());
        app.sync_state();
        app
    }

    pub fn restart(&mut self) {
        self.controller.reset();
        self.controller.start(self.source.clone());
        self.sync_state();
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.clock
            .on_elapsed(&mut self.controller, &self.settings, elapsed);
        self.sync_state();
    }

    pub fn skip(&mut self) {
        self.clock.skip(&mut self.controller);
        self.sync_state();
    }

    pub fn toggle_debug_mode(&mut self) {
        let on = self.settings.toggle_debug_mode();
        log::set_max_level(level_for(on));
        log::info!("debug mode {}", if on { "on" } else { "off" });
    }

    pub fn highlighted_word(&self) -> Option<usize> {
        self.clock.highlighted_word(&self.controller, &self.settings)
    }

    fn sync_state(&mut self) {
        self.state = if self.controller.phase() == Phase::Idle {
            AppState::Finished
        } else {
            AppState::Presenting
        };
    }
}

fn level_for(debug_mode: bool) -> LevelFilter {
    if debug_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Log to a file while the TUI owns the terminal, to stderr otherwise.
/// `debug_mode` only moves the runtime max level; the logger itself
/// accepts debug records so toggling works without re-initialising.
fn init_logging(settings: &Settings, to_file: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Debug).parse_default_env();

    if to_file {
        let file = AppDirs::log_path().and_then(|path| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).ok()?;
            }
            OpenOptions::new().create(true).append(true).open(path).ok()
        });
        match file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(LevelFilter::Off);
            }
        }
    }

    if let Err(e) = builder.try_init() {
        eprintln!("logger already initialised, keeping it: {e}");
    }
    log::set_max_level(level_for(settings.debug_mode()));
}

fn load_training_data(cli: &Cli, catalog: &Catalog) -> Option<TrainingData> {
    let loaded = if let Some(path) = &cli.file {
        catalog::load_file(path)
    } else {
        let class_id = match &cli.class_id {
            Some(id) => id.clone(),
            None => match catalog.learning_paths() {
                Ok(paths) => paths.into_iter().next()?.id,
                Err(e) => {
                    log::warn!("could not list classes: {e}");
                    return None;
                }
            },
        };
        catalog.load(&class_id)
    };

    match loaded {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("{e}; starting an empty session");
            None
        }
    }
}

fn print_learning_paths(catalog: &Catalog) -> Result<(), Box<dyn Error>> {
    let paths = catalog.learning_paths()?;
    if paths.is_empty() {
        println!("no training classes found");
    }
    for path in paths {
        println!(
            "{:<24} {} ({}, items: {})",
            path.id,
            path.title,
            if path.date.is_empty() { "undated" } else { path.date.as_str() },
            path.item_count
        );
        if !path.description.is_empty() {
            println!("{:<24} {}", "", path.description);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileSettingsStore::new();
    let mut settings = store.load();
    if let Err(e) = cli.apply_to(&mut settings) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e.to_string()).exit();
    }

    init_logging(&settings, !cli.list);

    if cli.save_settings {
        store.save(&settings)?;
        log::info!("saved settings to {}", store.path().display());
    }

    let catalog = Catalog::discover(cli.classes_dir.as_deref());
    if cli.list {
        return print_learning_paths(&catalog);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let data = load_training_data(&cli, &catalog);
    let mut app = App::new(settings, data);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.controller.reset();
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            SessionEvent::Tick(elapsed) => app.on_tick(elapsed),
            SessionEvent::Resize => {}
            SessionEvent::Key(key) => {
                if handle_key(app, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Esc => return Flow::Quit,
        // ctrl+c to quit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Flow::Quit
        }
        KeyCode::Char(' ') | KeyCode::Right => {
            if app.state == AppState::Presenting {
                app.skip();
            }
        }
        KeyCode::Char('r') => app.restart(),
        KeyCode::Char('d') => app.toggle_debug_mode(),
        _ => {}
    }
    Flow::Continue
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
