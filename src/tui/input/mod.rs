mod confirm;
mod navigate;
mod notes;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Mode};

use confirm::handle_confirm;
use navigate::handle_navigate;
use notes::handle_notes;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.status_message = None;

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::EditNotes => handle_notes(app, key),
        Mode::ConfirmReset => handle_confirm(app, key),
    }
    app.flush_warnings();
}
