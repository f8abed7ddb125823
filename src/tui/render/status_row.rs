use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode;

const NAVIGATE_HINTS: &str = "space check  enter open  s timer  n notes  ? help  q quit";
const NOTES_HINTS: &str = "Esc/Enter done";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let bg = p.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    let hint = match app.mode {
        Mode::EditNotes => {
            spans.push(Span::styled(
                " -- NOTES --",
                Style::default()
                    .fg(p.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ));
            Some(NOTES_HINTS)
        }
        Mode::Navigate | Mode::ConfirmReset => {
            if let Some(msg) = &app.status_message {
                let color = if msg.starts_with("warning") || msg.starts_with("reset failed") {
                    p.red
                } else {
                    p.text
                };
                spans.push(Span::styled(
                    format!(" {}", unicode::truncate_to_width(msg, width.saturating_sub(1))),
                    Style::default().fg(color).bg(bg),
                ));
                None
            } else if app.ui.show_key_hints {
                Some(NAVIGATE_HINTS)
            } else {
                None
            }
        }
    };

    // Right-aligned: hints, then the theme name
    let theme = format!(" {} ", app.store.theme());
    let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let mut right = Vec::new();
    let mut right_width = theme.len();
    if let Some(hint) = hint
        && content_width + hint.len() + theme.len() + 2 < width
    {
        right.push(Span::styled(hint, Style::default().fg(p.dim).bg(bg)));
        right_width += hint.len();
    }
    right.push(Span::styled(theme, Style::default().fg(p.dim).bg(bg)));

    if content_width + right_width <= width {
        let padding = width - content_width - right_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.extend(right);
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
