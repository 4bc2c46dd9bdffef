use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use pairflip::{
    app::{App, Control},
    app_dirs::AppDirs,
    board::{Board, Catalog},
    config::{Config, ConfigStore, FileConfigStore, RuntimeSettings},
    logging,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    scores::ScoreDb,
    ui::screen,
    util::format_millis,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

/// match terms with their definitions against the clock
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal memory game: every board is a set of term/definition pairs shuffled into cards. Pick a term and its definition to clear them; clear the board before the time limit runs out."
)]
pub struct Cli {
    /// board to play, by id (see --list)
    #[clap(short = 'b', long)]
    board: Option<String>,

    /// add a board from a .json or .csv file and start on it (repeatable)
    #[clap(short = 'f', long = "board-file")]
    board_file: Vec<PathBuf>,

    /// session time limit in seconds
    #[clap(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    time_limit: Option<u64>,

    /// disable the terminal bell on matches and misses
    #[clap(long)]
    mute: bool,

    /// list available boards and exit
    #[clap(long)]
    list: bool,

    /// print best times per board and exit
    #[clap(long)]
    scores: bool,
}

impl Cli {
    /// Stored preferences with command line overrides applied
    fn settings(&self, cfg: &Config, file_board: Option<&str>) -> RuntimeSettings {
        let mut settings = RuntimeSettings::from(cfg);
        if let Some(id) = self.board.as_deref().or(file_board) {
            settings.board_id = Some(id.to_string());
        }
        if let Some(secs) = self.time_limit {
            settings.time_limit_secs = secs;
        }
        if self.mute {
            settings.sound = false;
        }
        settings
    }

    /// Built-in boards plus any board files; returns the id of the last file board
    fn catalog(&self) -> Result<(Catalog, Option<String>), Box<dyn Error>> {
        let mut catalog = Catalog::builtin();
        let mut last = None;
        for path in &self.board_file {
            let board = Board::from_path(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            info!(board = %board.id, path = %path.display(), "loaded board file");
            last = Some(board.id.clone());
            catalog.add(board);
        }
        Ok((catalog, last))
    }
}

fn list_boards(catalog: &Catalog) -> String {
    catalog
        .boards()
        .iter()
        .map(|b| format!("{}  {}  {}", b.id, b.title, b.pairs.len()))
        .join("\n")
}

fn list_scores(db: &ScoreDb, catalog: &Catalog) -> Result<String, Box<dyn Error>> {
    let bests = db.best_per_board()?;
    if bests.is_empty() {
        return Ok("no finished boards yet".to_string());
    }
    Ok(bests
        .iter()
        .map(|b| {
            let title = catalog.find(&b.board_id).map_or(b.board_id.as_str(), |board| {
                board.title.as_str()
            });
            format!(
                "{}  {}  best {}  runs {}",
                b.board_id,
                title,
                format_millis(b.best_ms),
                b.runs
            )
        })
        .join("\n"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        // Without a log file the game still runs, just unobserved
        let _ = logging::init(&path);
    }

    let (catalog, file_board) = match cli.catalog() {
        Ok(loaded) => loaded,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    if cli.list {
        println!("{}", list_boards(&catalog));
        return Ok(());
    }
    if cli.scores {
        let db = ScoreDb::new()?;
        println!("{}", list_scores(&db, &catalog)?);
        return Ok(());
    }

    if let Some(id) = cli.board.as_deref() {
        if catalog.find(id).is_none() {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                format!("unknown board '{id}' (see --list)"),
            )
            .exit();
        }
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = cli.settings(&store.load(), file_board.as_deref());
    let scores = match ScoreDb::new() {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, "score database unavailable, playing without best times");
            None
        }
    };
    let mut app = App::new(catalog, settings, scores)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&Config::from(&app.settings)) {
        warn!(error = %e, path = %store.path().display(), "failed to save config");
    }
    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| screen::draw(app, f))?;

    loop {
        let step = runner.step();
        app.on_tick(step.elapsed);

        match step.event {
            AppEvent::Key(key) => {
                if app.handle_key(key) == Control::Quit {
                    info!(board = app.board_id(), "quit");
                    break;
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }
        terminal.draw(|f| screen::draw(app, f))?;
    }

    Ok(())
}
