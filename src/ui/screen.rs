use ratatui::Frame;

use crate::{
    app::{App, AppState},
    ui::scores::render_scores,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Card grid, clock and tally
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Per-board best times; clamps the scroll offset while drawing
pub struct ScoresScreen;

impl Screen for ScoresScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_scores(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Scores => Box::new(ScoresScreen),
    }
}

/// Draw whichever screen the app is on
pub fn draw(app: &mut App, f: &mut Frame) {
    current_screen(app.state).render(app, f);
}
