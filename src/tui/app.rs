use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::kv::KeyValueStore;
use crate::io::project_io::{discover_project, load_project, open_storage};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::{Checklist, Phase, SectionState, UiConfig};
use crate::ops::store::PersistedStateStore;

use super::input;
use super::render;
use super::theme::Palette;

/// Longest the event loop sleeps when no timer is due sooner
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the notes of one phase
    EditNotes,
    /// "Reset everything?" popup is open
    ConfirmReset,
}

/// A row in the checklist view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatItem {
    /// Phase header (index into `checklist.phases`)
    Phase(usize),
    /// Task row inside an expanded phase
    Task { phase: usize, task: usize },
    /// Notes row at the end of an expanded phase
    Notes(usize),
}

impl FlatItem {
    pub fn phase(self) -> usize {
        match self {
            FlatItem::Phase(p) | FlatItem::Notes(p) => p,
            FlatItem::Task { phase, .. } => phase,
        }
    }
}

/// Main application state
pub struct App {
    pub checklist: Checklist,
    pub store: PersistedStateStore<Box<dyn KeyValueStore>>,
    /// Where warnings are logged; `None` keeps them on the status row only
    pub data_dir: Option<PathBuf>,
    pub ui: UiConfig,
    pub palette: Palette,
    pub mode: Mode,
    pub should_quit: bool,
    /// Cursor index into the flat visible items list
    pub cursor: usize,
    /// Scroll offset (first visible row)
    pub scroll_offset: usize,
    /// Byte offset into the notes being edited
    pub notes_cursor: usize,
    pub show_help: bool,
    /// Latest warning or result, shown on the status row until the next key
    pub status_message: Option<String>,
}

impl App {
    pub fn new(
        checklist: Checklist,
        storage: Box<dyn KeyValueStore>,
        ui: UiConfig,
        data_dir: Option<PathBuf>,
    ) -> Self {
        let store = PersistedStateStore::open(storage, &checklist);
        let palette = Palette::for_theme(store.theme(), &ui);
        let mut app = App {
            checklist,
            store,
            data_dir,
            ui,
            palette,
            mode: Mode::Navigate,
            should_quit: false,
            cursor: 0,
            scroll_offset: 0,
            notes_cursor: 0,
            show_help: false,
            status_message: None,
        };
        app.flush_warnings();
        app
    }

    /// Rows currently visible, in display order
    pub fn flat_items(&self) -> Vec<FlatItem> {
        let mut items = Vec::new();
        for (pi, phase) in self.checklist.phases.iter().enumerate() {
            items.push(FlatItem::Phase(pi));
            if self.section(pi).is_some_and(|s| s.expanded) {
                items.extend((0..phase.tasks.len()).map(|ti| FlatItem::Task {
                    phase: pi,
                    task: ti,
                }));
                items.push(FlatItem::Notes(pi));
            }
        }
        items
    }

    pub fn current_item(&self) -> Option<FlatItem> {
        self.flat_items().get(self.cursor).copied()
    }

    /// Phase the cursor is in (on its header, one of its tasks, or its notes)
    pub fn current_phase(&self) -> Option<usize> {
        self.current_item().map(FlatItem::phase)
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.checklist.phases.get(index)
    }

    pub fn section(&self, index: usize) -> Option<&SectionState> {
        let phase = self.phase(index)?;
        self.store.state().section(&phase.id)
    }

    /// Move the cursor onto a specific row, if it is visible
    pub fn select(&mut self, item: FlatItem) {
        if let Some(pos) = self.flat_items().iter().position(|i| *i == item) {
            self.cursor = pos;
        }
    }

    /// Keep the cursor on a visible row after rows were hidden
    pub fn clamp_cursor(&mut self) {
        let len = self.flat_items().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    /// Re-resolve the palette after a theme change
    pub fn apply_theme(&mut self) {
        self.palette = Palette::for_theme(self.store.theme(), &self.ui);
    }

    /// Route store warnings to the recovery log and the status row.
    pub fn flush_warnings(&mut self) {
        for warning in self.store.take_warnings() {
            if let Some(dir) = &self.data_dir {
                recovery::log_recovery(dir, warning.to_recovery_entry());
            }
            self.status_message = Some(format!("warning: {}", warning));
        }
    }

    /// Apply due timer ticks. Returns true if any timer advanced.
    pub fn tick(&mut self, now: Instant) -> bool {
        let ticked = !self.store.advance_timers(now).is_empty();
        self.flush_warnings();
        ticked
    }

    /// How long the event loop may block before the next tick is due
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        match self.store.next_tick_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    /// Clear everything in one storage batch.
    pub fn reset_all(&mut self) {
        match self.store.reset_all() {
            Ok(_) => {
                self.notes_cursor = 0;
                self.status_message = Some("checklist reset".to_string());
            }
            Err(e) => {
                if let Some(dir) = &self.data_dir {
                    recovery::log_recovery(
                        dir,
                        RecoveryEntry::new(RecoveryCategory::Reset, "reset failed")
                            .body(e.to_string()),
                    );
                }
                self.status_message = Some(format!("reset failed: {}", e));
            }
        }
    }

    /// Pause every running timer so the stored marker reads "false" on exit.
    pub fn stop_timers(&mut self) {
        let ids: Vec<String> = self.checklist.phase_ids().map(str::to_string).collect();
        for id in ids {
            if let Err(e) = self.store.pause_timer(&id) {
                self.status_message = Some(format!("could not pause timer: {}", e));
            }
        }
        self.flush_warnings();
    }
}

/// Run the TUI application
pub fn run(project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    // Discover and load project
    let start = match project_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let root = discover_project(&start)?;
    let project = load_project(&root)?;

    let storage = open_storage(&project);
    let mut app = App::new(
        project.checklist.clone(),
        Box::new(storage),
        project.config.ui.clone(),
        Some(project.data_dir.clone()),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    app.stop_timers();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(app.poll_timeout(Instant::now()))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv::MemoryStore;
    use crate::tui::render::test_helpers::{SIMPLE_CHECKLIST_MD, app_with_checklist};

    #[test]
    fn collapsed_phases_show_only_headers() {
        let app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        assert_eq!(
            app.flat_items(),
            vec![FlatItem::Phase(0), FlatItem::Phase(1)]
        );
    }

    #[test]
    fn expanded_phase_lists_tasks_then_notes() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        app.store.set_expanded("p1", true).unwrap();
        assert_eq!(
            app.flat_items(),
            vec![
                FlatItem::Phase(0),
                FlatItem::Task { phase: 0, task: 0 },
                FlatItem::Task { phase: 0, task: 1 },
                FlatItem::Notes(0),
                FlatItem::Phase(1),
            ]
        );
        app.cursor = 2;
        assert_eq!(app.current_phase(), Some(0));
    }

    #[test]
    fn clamp_cursor_after_collapse() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        app.store.expand_all();
        app.cursor = app.flat_items().len() - 1;
        app.store.collapse_all();
        app.clamp_cursor();
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn poll_timeout_waits_for_next_tick() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        let now = Instant::now();
        assert_eq!(app.poll_timeout(now), IDLE_POLL);

        app.store.start_timer("p1", now).unwrap();
        assert_eq!(app.poll_timeout(now), IDLE_POLL);
        let near = now + Duration::from_millis(900);
        assert_eq!(app.poll_timeout(near), Duration::from_millis(100));
        assert_eq!(app.poll_timeout(now + Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn tick_advances_running_timers() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        let now = Instant::now();
        app.store.start_timer("p2", now).unwrap();
        assert!(!app.tick(now));
        assert!(app.tick(now + Duration::from_secs(3)));
        assert_eq!(app.section(1).unwrap().elapsed, 3);
    }

    #[test]
    fn storage_warnings_reach_status_row() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        let mut disabled = MemoryStore::new();
        disabled.set_disabled(true);
        let boxed: Box<dyn KeyValueStore> = Box::new(disabled);
        app.store = PersistedStateStore::open(boxed, &app.checklist);
        app.store.toggle_task("p1-a").unwrap();
        app.flush_warnings();
        let msg = app.status_message.clone().unwrap();
        assert!(msg.starts_with("warning: storage unavailable"), "{}", msg);
        assert!(app.store.state().is_completed("p1-a"));
    }

    #[test]
    fn stop_timers_pauses_everything() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        let now = Instant::now();
        app.store.start_timer("p1", now).unwrap();
        app.store.start_timer("p2", now).unwrap();
        app.stop_timers();
        assert!(!app.store.any_timer_running());
        assert_eq!(app.store.next_tick_deadline(), None);
    }

    #[test]
    fn stop_timers_reports_phase_missing_from_store() {
        let mut app = app_with_checklist(SIMPLE_CHECKLIST_MD);
        app.checklist.phases.push(crate::model::checklist::Phase {
            id: "ghost".to_string(),
            name: "Ghost".to_string(),
            tasks: Vec::new(),
        });
        app.stop_timers();
        assert_eq!(
            app.status_message.as_deref(),
            Some("could not pause timer: unknown phase: ghost")
        );
    }
}
