use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode;

/// Title row and overall progress bar
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let p = &app.palette;
    let bg = p.background;
    let width = area.width as usize;
    let progress = app.store.progress();

    // Row 1: " ▶ Title" ... "2/5 tasks"
    let count = format!("{}/{} tasks ", progress.completed, progress.total);
    let title_budget = width.saturating_sub(unicode::display_width(&count) + 4);
    let title = unicode::truncate_to_width(&app.checklist.title, title_budget);
    let used = 3 + unicode::display_width(&title) + unicode::display_width(&count);
    let title_line = Line::from(vec![
        Span::styled(" \u{25B6} ", Style::default().fg(p.highlight).bg(bg)),
        Span::styled(
            title,
            Style::default()
                .fg(p.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ".repeat(width.saturating_sub(used)), Style::default().bg(bg)),
        Span::styled(count, Style::default().fg(p.dim).bg(bg)),
    ]);

    // Row 2: " ███████░░░░░░░ 40%"
    let label = format!(" {:>3}%", progress.percentage);
    let bar_w = width.saturating_sub(label.len() + 1);
    let filled = bar_w * progress.percentage as usize / 100;
    let bar_line = Line::from(vec![
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled("\u{2588}".repeat(filled), Style::default().fg(p.gauge).bg(bg)),
        Span::styled(
            "\u{2591}".repeat(bar_w - filled),
            Style::default().fg(p.dim).bg(bg),
        ),
        Span::styled(label, Style::default().fg(p.text_bright).bg(bg)),
    ]);

    let paragraph = Paragraph::new(vec![title_line, bar_line]).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn shows_title_count_and_percentage() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        app.store.record_task_change("p1-a", true).unwrap();
        app.store.record_task_change("p2-a", true).unwrap();
        let out = render_to_string(TERM_W, 2, |frame, area| {
            render_header(frame, &app, area);
        });
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("Launch"), "{}", out);
        assert!(lines[0].ends_with("2/5 tasks"), "{}", out);
        assert!(lines[1].ends_with(" 40%"), "{}", out);
        let filled = lines[1].matches('\u{2588}').count();
        let empty = lines[1].matches('\u{2591}').count();
        assert_eq!(filled + empty, TERM_W as usize - 6);
        assert_eq!(filled, (TERM_W as usize - 6) * 40 / 100);
    }

    #[test]
    fn long_title_is_truncated() {
        let md = format!("# {}\n\n## Only {{#p}}\n\n- `t` Task\n", "Very long title ".repeat(10));
        let app = app_with_checklist(&md);
        let out = render_to_string(40, 2, |frame, area| {
            render_header(frame, &app, area);
        });
        let first = out.lines().next().unwrap();
        assert!(first.contains('\u{2026}'), "{}", out);
        assert!(first.ends_with("0/1 tasks"), "{}", out);
    }
}
