pub mod grid;
pub mod scores;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState, RunResult},
    session::{FaceStatus, SessionEnd},
    util::{format_clock, format_millis, truncate_to_width},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn status_style(status: FaceStatus) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match status {
        FaceStatus::Idle => Style::default(),
        FaceStatus::Selected => bold.fg(Color::Yellow),
        FaceStatus::Success => bold.fg(Color::Green),
        FaceStatus::Failure => bold.fg(Color::Red),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.state, &self.last_result) {
            (AppState::Results, Some(result)) => render_results(self, result, area, buf),
            _ => render_board(self, area, buf),
        }
    }
}

fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title + clock
            Constraint::Length(1), // tally / state
            Constraint::Min(3),    // cards
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = app.board().map_or(app.board_id(), |b| b.title.as_str());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(title.to_string(), bold_style.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format_clock(session.elapsed_secs()), bold_style),
        Span::styled(
            format!("  ({} left)", format_clock(session.remaining_secs())),
            dim_bold_style,
        ),
    ]))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    let tally = session.tally();
    let state_text = if session.is_running() {
        format!("{} matched   {} missed", tally.matches, tally.mismatches)
    } else if !session.has_started() && session.ended().is_none() {
        "press space to begin".to_string()
    } else {
        "PAUSED - press s to continue".to_string()
    };
    let state_style = if session.is_running() {
        dim_bold_style
    } else {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC)
    };
    Paragraph::new(Span::styled(state_text, state_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let faces = session.faces();
    for (idx, rect) in grid::cell_rects(chunks[2], faces.len()).into_iter().enumerate() {
        // Cards past the bottom of a short terminal are clipped to nothing
        if rect.is_empty() {
            continue;
        }
        let style = status_style(session.status(idx));
        let border_style = if idx == app.cursor {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if idx == app.cursor {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(border_style);

        let text_width = rect.width.saturating_sub(2) as usize;
        let card = Paragraph::new(Span::styled(
            truncate_to_width(&faces[idx].value, text_width.saturating_mul(2)),
            style,
        ))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        card.render(rect, buf);
    }

    Paragraph::new(Span::styled(
        "(←↓↑→/hjkl) move / (space) pick / (s)tart·pause / (r)eset / (n)ext / (p)rev / (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_results(app: &App, result: &RunResult, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // headline
            Constraint::Length(1), // time / best
            Constraint::Length(1), // tally
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = app.board().map_or(result.board_id.as_str(), |b| b.title.as_str());
    let (headline, headline_style) = match result.end {
        SessionEnd::Finished { .. } if result.new_best => (
            format!("{title} cleared - new best!"),
            bold_style.fg(Color::Magenta),
        ),
        SessionEnd::Finished { .. } => (format!("{title} cleared"), bold_style.fg(Color::Green)),
        SessionEnd::TimedOut => (format!("{title} - time's up"), bold_style.fg(Color::Red)),
    };
    Paragraph::new(Span::styled(headline, headline_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let best = result
        .best_ms
        .map(format_millis)
        .unwrap_or_else(|| "-".to_string());
    let time_line = match result.end {
        SessionEnd::Finished { elapsed_ms } => {
            format!("time {}   best {}", format_millis(elapsed_ms), best)
        }
        SessionEnd::TimedOut => format!(
            "limit {}   best {}",
            format_clock(app.session.config().time_limit_secs),
            best
        ),
    };
    Paragraph::new(Span::styled(time_line, bold_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} matched   {} missed",
            result.tally.matches, result.tally.mismatches
        ),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)eplay / (n)ext / (p)rev / (s)cores / (esc)ape",
        italic_style,
    ))
    .render(chunks[5], buf);
}
