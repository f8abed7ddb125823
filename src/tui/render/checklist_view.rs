use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::format::format_elapsed;
use crate::tui::app::{App, FlatItem, Mode};
use crate::tui::theme::Palette;
use crate::util::unicode;

/// Indent for task and notes rows under a phase header
const CHILD_INDENT: &str = "    ";

/// Render the phase list, scrolling so the cursor row stays visible
pub fn render_checklist(frame: &mut Frame, app: &mut App, area: Rect) {
    let items = app.flat_items();
    let height = area.height as usize;

    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if height > 0 && app.cursor >= app.scroll_offset + height {
        app.scroll_offset = app.cursor + 1 - height;
    }

    let bg = app.palette.background;
    if items.is_empty() {
        let line = Line::from(Span::styled(
            "  No phases. Add `## Phase` headings to the checklist file.",
            Style::default().fg(app.palette.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    let width = area.width as usize;
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
        .map(|(i, item)| {
            let selected = i == app.cursor;
            match *item {
                FlatItem::Phase(pi) => phase_line(app, pi, selected, width),
                FlatItem::Task { phase, task } => task_line(app, phase, task, selected, width),
                FlatItem::Notes(pi) => notes_line(app, pi, selected, width),
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn row_bg(p: &Palette, selected: bool) -> ratatui::style::Color {
    if selected { p.selection_bg } else { p.background }
}

/// "▾ Phase name ......... 1/2  03:15 ●"
fn phase_line(app: &App, pi: usize, selected: bool, width: usize) -> Line<'static> {
    let p = &app.palette;
    let bg = row_bg(p, selected);
    let (Some(phase), Some(section)) = (app.phase(pi), app.section(pi)) else {
        return Line::default();
    };

    let progress = app
        .store
        .state()
        .progress_of(phase.tasks.iter().map(|t| t.id.as_str()));
    let running = section.timer.is_running();

    let marker = if section.expanded { "\u{25BE}" } else { "\u{25B8}" };
    let count = format!("{}/{}", progress.completed, progress.total);
    let timer = format_elapsed(section.elapsed);
    let dot = if running { " \u{25CF} " } else { "   " };

    // " ▸ " + name + "  " + count + "  " + timer + dot
    let right_w = 2 + count.len() + 2 + timer.len() + 3;
    let name_w = width.saturating_sub(3 + right_w);
    let name = unicode::fit_to_width(&phase.name, name_w);

    let complete = progress.total > 0 && progress.completed == progress.total;
    let name_style = Style::default()
        .fg(if complete { p.green } else { p.text_bright })
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let timer_color = if running {
        p.yellow
    } else if section.elapsed > 0 {
        p.text
    } else {
        p.dim
    };

    Line::from(vec![
        Span::styled(format!(" {} ", marker), Style::default().fg(p.highlight).bg(bg)),
        Span::styled(name, name_style),
        Span::styled(format!("  {}", count), Style::default().fg(p.dim).bg(bg)),
        Span::styled(format!("  {}", timer), Style::default().fg(timer_color).bg(bg)),
        Span::styled(dot, Style::default().fg(p.red).bg(bg)),
    ])
}

/// "    [x] Task title"
fn task_line(app: &App, pi: usize, ti: usize, selected: bool, width: usize) -> Line<'static> {
    let p = &app.palette;
    let bg = row_bg(p, selected);
    let Some(task) = app.phase(pi).and_then(|ph| ph.tasks.get(ti)) else {
        return Line::default();
    };
    let done = app.store.state().is_completed(&task.id);

    let (mark, mark_color, title_style) = if done {
        (
            "[x]",
            p.green,
            Style::default()
                .fg(p.dim)
                .bg(bg)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ]", p.text, Style::default().fg(p.text).bg(bg))
    };

    let title_w = width.saturating_sub(CHILD_INDENT.len() + 4);
    Line::from(vec![
        Span::styled(CHILD_INDENT, Style::default().bg(bg)),
        Span::styled(mark, Style::default().fg(mark_color).bg(bg)),
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(unicode::fit_to_width(&task.title, title_w), title_style),
    ])
}

/// "    ✎ notes text", with a cursor while editing
fn notes_line(app: &App, pi: usize, selected: bool, width: usize) -> Line<'static> {
    let p = &app.palette;
    let bg = row_bg(p, selected);
    let notes = app.section(pi).map(|s| s.notes.as_str()).unwrap_or("");
    let avail = width.saturating_sub(CHILD_INDENT.len() + 2);

    let mut spans = vec![
        Span::styled(CHILD_INDENT, Style::default().bg(bg)),
        Span::styled("\u{270E} ", Style::default().fg(p.highlight).bg(bg)),
    ];

    let editing = selected && app.mode == Mode::EditNotes;
    if editing {
        let cursor = app.notes_cursor.min(notes.len());
        let (before, after) = notes.split_at(cursor);
        let before = scroll_to_fit(before, avail.saturating_sub(1));
        let after_w = avail.saturating_sub(unicode::display_width(before) + 1);
        let text_style = Style::default().fg(p.text_bright).bg(bg);
        spans.push(Span::styled(before.to_string(), text_style));
        spans.push(Span::styled("\u{258C}", Style::default().fg(p.highlight).bg(bg)));
        spans.push(Span::styled(
            unicode::truncate_to_width(after, after_w),
            text_style,
        ));
    } else if notes.is_empty() {
        spans.push(Span::styled(
            unicode::truncate_to_width("no notes (n to edit)", avail),
            Style::default().fg(p.dim).bg(bg).add_modifier(Modifier::ITALIC),
        ));
    } else {
        spans.push(Span::styled(
            unicode::truncate_to_width(notes, avail),
            Style::default().fg(p.text).bg(bg),
        ));
    }
    Line::from(spans)
}

/// Drop leading graphemes until `s` fits in `cells`
fn scroll_to_fit(s: &str, cells: usize) -> &str {
    let mut start = 0;
    while unicode::display_width(&s[start..]) > cells {
        match unicode::next_grapheme_boundary(s, start) {
            Some(next) => start = next,
            None => break,
        }
    }
    &s[start..]
}
