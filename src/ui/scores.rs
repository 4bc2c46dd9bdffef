use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{app::App, scores::BoardBest, util::format_millis};

pub struct ScoreRowData {
    pub title: String,
    pub best_ms: u64,
    pub avg_ms: f64,
    pub runs: i64,
    pub current: bool,
}

/// Pure presenter for a single per-board row
pub fn present_row(data: &ScoreRowData) -> Row<'static> {
    let title_style = if data.current {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    Row::new(vec![
        Cell::from(data.title.clone()).style(title_style),
        Cell::from(format_millis(data.best_ms)).style(Style::default().fg(Color::Green)),
        Cell::from(format_millis(data.avg_ms.round() as u64)),
        Cell::from(data.runs.to_string()),
    ])
}

fn row_data(app: &App, best: &BoardBest) -> ScoreRowData {
    let title = app
        .catalog
        .find(&best.board_id)
        .map_or_else(|| best.board_id.clone(), |b| b.title.clone());
    ScoreRowData {
        title,
        best_ms: best.best_ms,
        avg_ms: best.avg_ms,
        runs: best.runs,
        current: best.board_id == app.board_id(),
    }
}

/// Render the per-board best times screen
pub fn render_scores(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("Best Times")
        .block(Block::default().borders(Borders::ALL).title("Scores"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let bests = match app.scores.as_ref().map(|db| db.best_per_board()) {
        Some(Ok(bests)) => bests,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "failed to load scores");
            Vec::new()
        }
        None => Vec::new(),
    };

    if bests.is_empty() {
        let no_data = Paragraph::new("No finished boards yet. Clear a board to set a time.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = bests.len().saturating_sub(table_height);
        if app.scores_state.scroll_offset > max_scroll {
            app.scores_state.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Board"),
            Cell::from("Best"),
            Cell::from("Average"),
            Cell::from("Runs"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = bests
            .iter()
            .skip(app.scores_state.scroll_offset)
            .take(table_height)
            .map(|best| present_row(&row_data(app, best)))
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(6),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Boards"))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (Home) top  (b/backspace) back  (esc)ape")
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Catalog};
    use crate::config::RuntimeSettings;
    use crate::deck::Pair;
    use crate::scores::{ScoreDb, ScoreRecord};
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};

    fn app_with_scores(records: &[(&str, u64)]) -> App {
        let boards = ["capitals", "rust-terms"]
            .iter()
            .map(|id| Board {
                id: id.to_string(),
                title: format!("{id} title"),
                pairs: vec![Pair::new(format!("{id}-1"), "a", "b")],
            })
            .collect();
        let db = ScoreDb::open_in_memory().unwrap();
        for (board_id, elapsed_ms) in records {
            db.record(&ScoreRecord {
                board_id: board_id.to_string(),
                elapsed_ms: *elapsed_ms,
                matches: 1,
                mismatches: 0,
                timestamp: Local::now(),
            })
            .unwrap();
        }
        let settings = RuntimeSettings {
            sound: false,
            ..RuntimeSettings::default()
        };
        App::new(Catalog::new(boards), settings, Some(db)).unwrap()
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render_scores(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_row_data_marks_current_board() {
        let app = app_with_scores(&[]);
        let best = BoardBest {
            board_id: "capitals".into(),
            best_ms: 12_000,
            runs: 3,
            avg_ms: 15_049.6,
        };
        let data = row_data(&app, &best);
        assert_eq!(data.title, "capitals title");
        assert!(data.current);

        let other = BoardBest {
            board_id: "rust-terms".into(),
            ..best
        };
        assert!(!row_data(&app, &other).current);
    }

    #[test]
    fn test_render_lists_boards_by_title() {
        let mut app = app_with_scores(&[("capitals", 9_000), ("rust-terms", 4_000)]);
        let out = draw(&mut app);
        assert!(out.contains("capitals title"));
        assert!(out.contains("rust-terms title"));
        assert!(out.contains("4.0s"));
        assert!(out.contains("9.0s"));
    }

    #[test]
    fn test_render_unknown_board_falls_back_to_id() {
        let mut app = app_with_scores(&[("imported", 1_500)]);
        let out = draw(&mut app);
        assert!(out.contains("imported"));
    }

    #[test]
    fn test_render_empty_and_scroll_clamped() {
        let mut app = app_with_scores(&[]);
        app.scores_state.scroll_offset = 5;
        let out = draw(&mut app);
        assert!(out.contains("No finished boards yet"));

        let mut app = app_with_scores(&[("capitals", 1_000)]);
        app.scores_state.scroll_offset = 5;
        draw(&mut app);
        assert_eq!(app.scores_state.scroll_offset, 0);
    }
}
