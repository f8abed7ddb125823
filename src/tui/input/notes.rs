use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, FlatItem, Mode};
use crate::util::unicode;

/// Notes editing. Every change is written through to storage immediately;
/// Esc and Enter both leave the editor since nothing is pending.
pub(super) fn handle_notes(app: &mut App, key: KeyEvent) {
    let Some(FlatItem::Notes(pi)) = app.current_item() else {
        app.mode = Mode::Navigate;
        return;
    };
    let Some(id) = app.phase(pi).map(|p| p.id.clone()) else {
        app.mode = Mode::Navigate;
        return;
    };
    let mut text = app.section(pi).map(|s| s.notes.clone()).unwrap_or_default();
    let mut cursor = app.notes_cursor.min(text.len());

    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) | (_, KeyCode::Enter) => {
            app.mode = Mode::Navigate;
            return;
        }

        // Cursor movement
        (_, KeyCode::Left) => {
            if let Some(prev) = unicode::prev_grapheme_boundary(&text, cursor) {
                cursor = prev;
            }
        }
        (_, KeyCode::Right) => {
            if let Some(next) = unicode::next_grapheme_boundary(&text, cursor) {
                cursor = next;
            }
        }
        (_, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => cursor = 0,
        (_, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => cursor = text.len(),

        // Deletion
        (_, KeyCode::Backspace) => {
            let Some(prev) = unicode::prev_grapheme_boundary(&text, cursor) else {
                return;
            };
            text.replace_range(prev..cursor, "");
            cursor = prev;
            save(app, &id, &text);
        }
        (_, KeyCode::Delete) => {
            let Some(next) = unicode::next_grapheme_boundary(&text, cursor) else {
                return;
            };
            text.replace_range(cursor..next, "");
            save(app, &id, &text);
        }
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
            let start = unicode::word_boundary_left(&text, cursor);
            if start == cursor {
                return;
            }
            text.replace_range(start..cursor, "");
            cursor = start;
            save(app, &id, &text);
        }
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            if cursor == 0 {
                return;
            }
            text.replace_range(..cursor, "");
            cursor = 0;
            save(app, &id, &text);
        }

        // Insertion
        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
            text.insert(cursor, c);
            cursor += c.len_utf8();
            save(app, &id, &text);
        }
        _ => {}
    }

    app.notes_cursor = cursor;
}

fn save(app: &mut App, id: &str, text: &str) {
    if let Err(e) = app.store.set_notes(id, text) {
        app.status_message = Some(format!("could not save notes: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv::KeyValueStore;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{ch, ctrl, key, type_str};
    use crate::tui::render::test_helpers::{SIMPLE_CHECKLIST_MD, app_with_checklist};

    fn editing_app() -> App {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        handle_key(&mut app, ch('n'));
        assert_eq!(app.mode, Mode::EditNotes);
        app
    }

    fn notes(app: &App) -> String {
        app.section(0).unwrap().notes.clone()
    }

    fn stored_notes(app: &App) -> Option<String> {
        app.store.storage().get("notes_p1").unwrap()
    }

    #[test]
    fn every_keystroke_is_persisted() {
        let mut app = editing_app();
        handle_key(&mut app, ch('h'));
        assert_eq!(stored_notes(&app).as_deref(), Some("h"));
        handle_key(&mut app, ch('i'));
        assert_eq!(stored_notes(&app).as_deref(), Some("hi"));
        assert_eq!(notes(&app), "hi");
    }

    #[test]
    fn save_reports_unknown_phase() {
        let mut app = editing_app();
        save(&mut app, "ghost", "lost");
        assert_eq!(
            app.status_message.as_deref(),
            Some("could not save notes: unknown phase: ghost")
        );
    }

    #[test]
    fn typing_q_does_not_quit() {
        let mut app = editing_app();
        type_str(&mut app, "quiet");
        assert!(!app.should_quit);
        assert_eq!(notes(&app), "quiet");
    }

    #[test]
    fn esc_and_enter_leave_editing_with_text_kept() {
        let mut app = editing_app();
        type_str(&mut app, "call vendor");
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(stored_notes(&app).as_deref(), Some("call vendor"));

        handle_key(&mut app, ch('n'));
        assert_eq!(app.notes_cursor, "call vendor".len());
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn backspace_and_delete_respect_graphemes() {
        let mut app = editing_app();
        type_str(&mut app, "ae\u{301}b");
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(notes(&app), "ab");

        handle_key(&mut app, key(KeyCode::Home));
        handle_key(&mut app, key(KeyCode::Delete));
        assert_eq!(notes(&app), "b");
        assert_eq!(stored_notes(&app).as_deref(), Some("b"));
    }

    #[test]
    fn insert_in_the_middle() {
        let mut app = editing_app();
        type_str(&mut app, "ac");
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, ch('b'));
        assert_eq!(notes(&app), "abc");
        assert_eq!(app.notes_cursor, 2);
    }

    #[test]
    fn ctrl_w_deletes_previous_word() {
        let mut app = editing_app();
        type_str(&mut app, "ship the build");
        handle_key(&mut app, ctrl('w'));
        assert_eq!(notes(&app), "ship the ");
        handle_key(&mut app, ctrl('u'));
        assert_eq!(notes(&app), "");
        assert_eq!(stored_notes(&app).as_deref(), Some(""));
    }

    #[test]
    fn backspace_at_start_writes_nothing() {
        let mut app = editing_app();
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(stored_notes(&app), None);
    }
}
