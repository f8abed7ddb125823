use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::TimerState;
use crate::tui::app::{App, FlatItem, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Help overlay intercepts ? and Esc
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,

        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.cursor = app.flat_items().len().saturating_sub(1);
        }

        KeyCode::Char(' ') | KeyCode::Char('x') => toggle_current_task(app),
        KeyCode::Enter | KeyCode::Tab => toggle_current_phase(app),
        KeyCode::Char('E') => {
            app.store.expand_all();
        }
        KeyCode::Char('C') => collapse_all(app),

        KeyCode::Char('s') => toggle_current_timer(app),
        KeyCode::Char('r') => reset_current_timer(app),
        KeyCode::Char('n') => begin_notes(app),

        KeyCode::Char('t') => {
            app.store.toggle_theme();
            app.apply_theme();
        }
        KeyCode::Char('R') => app.mode = Mode::ConfirmReset,
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.flat_items().len();
    if len == 0 {
        return;
    }
    let next = app.cursor as isize + delta;
    app.cursor = next.clamp(0, len as isize - 1) as usize;
}

/// Space/x: flip the task under the cursor
fn toggle_current_task(app: &mut App) {
    let Some(FlatItem::Task { phase, task }) = app.current_item() else {
        return;
    };
    let Some(id) = app
        .phase(phase)
        .and_then(|p| p.tasks.get(task))
        .map(|t| t.id.clone())
    else {
        return;
    };
    if let Ok((done, progress)) = app.store.toggle_task(&id) {
        let verb = if done { "checked" } else { "unchecked" };
        app.status_message = Some(format!("{} {} ({}%)", verb, id, progress.percentage));
    }
}

/// Enter/Tab: expand or collapse the phase the cursor is in
fn toggle_current_phase(app: &mut App) {
    let Some(pi) = app.current_phase() else {
        return;
    };
    let Some(id) = app.phase(pi).map(|p| p.id.clone()) else {
        return;
    };
    if let Ok(false) = app.store.toggle_section(&id) {
        app.select(FlatItem::Phase(pi));
    }
}

/// C: collapse everything, leaving the cursor on the header of its phase
fn collapse_all(app: &mut App) {
    let pi = app.current_phase().unwrap_or(0);
    app.store.collapse_all();
    // With every phase collapsed, row index == phase index
    app.cursor = pi;
    app.clamp_cursor();
}

fn toggle_current_timer(app: &mut App) {
    let Some(id) = current_phase_id(app) else {
        return;
    };
    if let Ok(state) = app.store.toggle_timer(&id, Instant::now()) {
        let verb = match state {
            TimerState::Running => "started",
            TimerState::Stopped => "paused",
        };
        app.status_message = Some(format!("timer {} for {}", verb, id));
    }
}

fn reset_current_timer(app: &mut App) {
    let Some(id) = current_phase_id(app) else {
        return;
    };
    if app.store.reset_timer(&id).is_ok() {
        app.status_message = Some(format!("timer reset for {}", id));
    }
}

/// n: open the notes row of the current phase for editing, expanding it first
fn begin_notes(app: &mut App) {
    let Some(pi) = app.current_phase() else {
        return;
    };
    let Some(id) = app.phase(pi).map(|p| p.id.clone()) else {
        return;
    };
    if app.store.set_expanded(&id, true).is_err() {
        return;
    }
    app.select(FlatItem::Notes(pi));
    app.notes_cursor = app.section(pi).map_or(0, |s| s.notes.len());
    app.mode = Mode::EditNotes;
}

fn current_phase_id(app: &App) -> Option<String> {
    let pi = app.current_phase()?;
    app.phase(pi).map(|p| p.id.clone())
}
