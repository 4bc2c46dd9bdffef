// Library surface for headless/integration tests and reuse.
// Terminal setup and argument parsing stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod board;
pub mod config;
pub mod deck;
pub mod logging;
pub mod resolver;
pub mod runtime;
pub mod scores;
pub mod session;
pub mod sound;
pub mod timer;
pub mod ui;
pub mod util;

pub use app::{App, AppError, AppState, Control};
pub use session::{GameSession, SessionConfig, SessionEnd};
