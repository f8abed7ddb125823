use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

/// Reset confirmation: y confirms, n or Esc cancels, anything else is ignored
pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.mode = Mode::Navigate;
            app.reset_all();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.mode = Mode::Navigate;
            app.status_message = Some("reset cancelled".to_string());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::io::kv::{KeyValueStore, MemoryStore};
    use crate::ops::store::PersistedStateStore;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{ch, key, type_str};
    use crate::tui::render::test_helpers::{SIMPLE_CHECKLIST_MD, app_with_checklist};

    fn busy_app() -> App {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        app.store.record_task_change("p1-a", true).unwrap();
        app.store.record_task_change("p2-c", true).unwrap();
        app.store.set_notes("p2", "waiting on legal").unwrap();
        let now = Instant::now();
        app.store.start_timer("p1", now).unwrap();
        app.tick(now + Duration::from_secs(4));
        app
    }

    #[test]
    fn y_resets_everything() {
        let mut app = busy_app();
        handle_key(&mut app, ch('R'));
        handle_key(&mut app, ch('y'));

        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.store.progress().percentage, 0);
        assert!(!app.store.any_timer_running());
        let section = app.section(0).unwrap();
        assert_eq!(section.elapsed, 0);
        assert_eq!(app.section(1).unwrap().notes, "");
        assert_eq!(app.store.storage().get("timer_p1").unwrap().as_deref(), Some("0"));
        assert_eq!(app.store.storage().get("p1-a").unwrap(), None);
        assert_eq!(app.status_message.as_deref(), Some("checklist reset"));
    }

    #[test]
    fn n_and_esc_cancel() {
        for cancel in [ch('n'), key(KeyCode::Esc)] {
            let mut app = busy_app();
            handle_key(&mut app, ch('R'));
            handle_key(&mut app, cancel);
            assert_eq!(app.mode, Mode::Navigate);
            assert!(app.store.state().is_completed("p1-a"));
            assert!(app.store.any_timer_running());
            assert_eq!(app.section(1).unwrap().notes, "waiting on legal");
        }
    }

    #[test]
    fn other_keys_keep_popup_open() {
        let mut app = busy_app();
        handle_key(&mut app, ch('R'));
        type_str(&mut app, "jkq");
        assert_eq!(app.mode, Mode::ConfirmReset);
        assert!(!app.should_quit);
        assert!(app.store.state().is_completed("p1-a"));
    }

    #[test]
    fn failed_reset_reports_and_keeps_state() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        let mut storage = MemoryStore::new();
        storage.set("p1-a", "true").unwrap();
        storage.set_quota(Some(8));
        let boxed: Box<dyn KeyValueStore> = Box::new(storage);
        app.store = PersistedStateStore::open(boxed, &app.checklist);
        app.flush_warnings();

        handle_key(&mut app, ch('R'));
        handle_key(&mut app, ch('y'));
        let msg = app.status_message.clone().unwrap();
        assert!(msg.starts_with("reset failed"), "{}", msg);
        assert!(app.store.state().is_completed("p1-a"));
    }
}
