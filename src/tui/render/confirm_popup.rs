use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::centered_rect_fixed;

/// Render the "reset everything" confirmation popup
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let bg = p.background;

    let header_style = Style::default()
        .fg(p.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(p.text).bg(bg);
    let warn_style = Style::default().fg(p.red).bg(bg);
    let key_style = Style::default()
        .fg(p.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let progress = app.store.progress();
    let lines = vec![
        Line::from(Span::styled(" Reset checklist?", header_style)),
        Line::from(Span::styled("", text_style)),
        Line::from(Span::styled(
            format!(
                "  Unchecks {} of {} tasks, zeroes every",
                progress.completed, progress.total
            ),
            text_style,
        )),
        Line::from(Span::styled("  timer and clears every note.", text_style)),
        Line::from(Span::styled("", text_style)),
        Line::from(Span::styled("  This cannot be undone.", warn_style)),
        Line::from(Span::styled("", text_style)),
        Line::from(vec![
            Span::styled("  ", text_style),
            Span::styled("y", key_style),
            Span::styled(" reset  ", text_style),
            Span::styled("n", key_style),
            Span::styled(" cancel", text_style),
        ]),
    ];

    let popup_w: u16 = 44.min(area.width.saturating_sub(2));
    let popup_h = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.highlight).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));

    frame.render_widget(paragraph, overlay_area);
}
