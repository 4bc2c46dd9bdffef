use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;
use tracing::{info, warn};

use crate::board::{Board, Catalog};
use crate::config::RuntimeSettings;
use crate::scores::{ScoreDb, ScoreRecord};
use crate::session::{GameSession, SessionEnd, SessionHooks, Tally};
use crate::sound::{Silent, SoundPlayer, TerminalBell};
use crate::ui::grid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no boards available")]
    NoBoards,
    #[error("unknown board {0}")]
    UnknownBoard(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Results,
    Scores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// What the results screen shows about the run that just ended
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub board_id: String,
    pub end: SessionEnd,
    pub tally: Tally,
    pub best_ms: Option<u64>,
    pub new_best: bool,
}

#[derive(Debug, Default)]
pub struct ScoresState {
    pub scroll_offset: usize,
}

#[derive(Debug)]
pub struct App {
    pub catalog: Catalog,
    pub session: GameSession,
    pub state: AppState,
    pub cursor: usize,
    pub settings: RuntimeSettings,
    pub scores: Option<ScoreDb>,
    pub scores_state: ScoresState,
    pub last_result: Option<RunResult>,
    board_id: String,
    ended: Rc<Cell<Option<SessionEnd>>>,
}

impl App {
    /// Falls back to the first catalog board if the configured one is gone
    pub fn new(
        catalog: Catalog,
        settings: RuntimeSettings,
        scores: Option<ScoreDb>,
    ) -> Result<Self, AppError> {
        let first = catalog.get(0).ok_or(AppError::NoBoards)?;
        let board = match settings.board_id.as_deref() {
            Some(id) => catalog.find(id).unwrap_or_else(|| {
                warn!(board = id, "configured board not found, using first board");
                first
            }),
            None => first,
        };
        let board_id = board.id.clone();

        let ended = Rc::new(Cell::new(None));
        let session = GameSession::new(board.pairs.clone(), settings.session_config())
            .with_hooks(completion_hooks(&ended));

        let mut app = Self {
            catalog,
            session,
            state: AppState::Playing,
            cursor: 0,
            settings,
            scores,
            scores_state: ScoresState::default(),
            last_result: None,
            board_id,
            ended,
        };
        app.settings.board_id = Some(app.board_id.clone());
        app.session.set_sound(app.sound_player());
        Ok(app)
    }

    fn sound_player(&self) -> Box<dyn SoundPlayer> {
        if self.settings.sound {
            Box::new(TerminalBell::stdout())
        } else {
            Box::new(Silent)
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn board(&self) -> Option<&Board> {
        self.catalog.find(&self.board_id)
    }

    pub fn switch_board(&mut self, id: &str) -> Result<(), AppError> {
        let board = self
            .catalog
            .find(id)
            .ok_or_else(|| AppError::UnknownBoard(id.to_string()))?;

        // Boards that happen to share pair ids still get a fresh deck
        if !self.session.load_board(board.pairs.clone()) {
            self.session.reset();
        }
        self.board_id = board.id.clone();
        self.settings.board_id = Some(self.board_id.clone());
        self.ended.set(None);
        self.cursor = 0;
        self.last_result = None;
        self.state = AppState::Playing;
        info!(board = %self.board_id, "switched board");
        Ok(())
    }

    pub fn next_board(&mut self) {
        if let Some(id) = self.catalog.next_id(&self.board_id).map(str::to_string) {
            if let Err(e) = self.switch_board(&id) {
                warn!(error = %e, "board switch failed");
            }
        }
    }

    pub fn previous_board(&mut self) {
        if let Some(id) = self.catalog.previous_id(&self.board_id).map(str::to_string) {
            if let Err(e) = self.switch_board(&id) {
                warn!(error = %e, "board switch failed");
            }
        }
    }

    pub fn replay(&mut self) {
        self.session.reset();
        self.ended.set(None);
        self.cursor = 0;
        self.last_result = None;
        self.state = AppState::Playing;
    }

    /// Advance session time and pick up a finish or timeout if one fired
    pub fn on_tick(&mut self, dt: Duration) {
        self.session.advance(dt);
        self.settle();
    }

    pub fn select_at_cursor(&mut self) {
        if !self.session.has_started() {
            self.session.start();
        }
        self.session.select(self.cursor);
    }

    pub fn move_cursor(&mut self, dir: grid::Direction) {
        let len = self.session.faces().len();
        self.cursor = grid::step(self.cursor, len, grid::columns_for(len), dir);
    }

    fn clamp_cursor(&mut self) {
        let len = self.session.faces().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    fn settle(&mut self) {
        self.clamp_cursor();
        let Some(end) = self.ended.take() else {
            return;
        };

        let previous_best = self.best_time();
        let mut new_best = false;
        if let SessionEnd::Finished { elapsed_ms } = end {
            new_best = previous_best.map_or(true, |best| elapsed_ms < best);
            self.record_score(elapsed_ms);
        }

        self.last_result = Some(RunResult {
            board_id: self.board_id.clone(),
            end,
            tally: self.session.tally(),
            best_ms: self.best_time(),
            new_best,
        });
        self.state = AppState::Results;
    }

    fn best_time(&self) -> Option<u64> {
        let db = self.scores.as_ref()?;
        match db.best_for_board(&self.board_id) {
            Ok(best) => best,
            Err(e) => {
                warn!(error = %e, "failed to read best time");
                None
            }
        }
    }

    fn record_score(&mut self, elapsed_ms: u64) {
        let Some(db) = self.scores.as_ref() else {
            return;
        };
        let tally = self.session.tally();
        let record = ScoreRecord {
            board_id: self.board_id.clone(),
            elapsed_ms,
            matches: tally.matches,
            mismatches: tally.mismatches,
            timestamp: Local::now(),
        };
        if let Err(e) = db.record(&record) {
            warn!(error = %e, "failed to record score");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Control::Quit;
        }

        match self.state {
            AppState::Playing => match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.move_cursor(grid::Direction::Left),
                KeyCode::Right | KeyCode::Char('l') => self.move_cursor(grid::Direction::Right),
                KeyCode::Up | KeyCode::Char('k') => self.move_cursor(grid::Direction::Up),
                KeyCode::Down | KeyCode::Char('j') => self.move_cursor(grid::Direction::Down),
                KeyCode::Char(' ') | KeyCode::Enter => self.select_at_cursor(),
                KeyCode::Char('s') => self.session.toggle(),
                KeyCode::Char('r') => self.replay(),
                KeyCode::Char('n') => self.next_board(),
                KeyCode::Char('p') => self.previous_board(),
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.replay(),
                KeyCode::Char('n') => self.next_board(),
                KeyCode::Char('p') => self.previous_board(),
                KeyCode::Char('s') => {
                    self.scores_state = ScoresState::default();
                    self.state = AppState::Scores;
                }
                _ => {}
            },
            AppState::Scores => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                KeyCode::Up => {
                    self.scores_state.scroll_offset = self.scores_state.scroll_offset.saturating_sub(1)
                }
                // Upper bound is clamped while rendering
                KeyCode::Down => self.scores_state.scroll_offset += 1,
                KeyCode::Home => self.scores_state.scroll_offset = 0,
                _ => {}
            },
        }
        self.settle();
        Control::Continue
    }
}

fn completion_hooks(slot: &Rc<Cell<Option<SessionEnd>>>) -> SessionHooks {
    let on_finish = Rc::clone(slot);
    let on_timeout = Rc::clone(slot);
    SessionHooks::new()
        .on_finish(move |elapsed_ms| on_finish.set(Some(SessionEnd::Finished { elapsed_ms })))
        .on_timeout(move || on_timeout.set(Some(SessionEnd::TimedOut)))
}
