use std::fmt;
use std::time::Instant;

use crate::io::kv::{KeyValueStore, KvWrite, StorageError};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry};
use crate::model::checklist::Checklist;
use crate::model::state::{ChecklistState, ProgressSummary, SectionState, Theme, TimerState};
use crate::ops::keys;
use crate::ops::ticker::Ticker;

/// Error type for store operations that can fail outright
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown task: {0}")]
    UnknownTask(String),
    #[error("unknown phase: {0}")]
    UnknownSection(String),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// What went wrong in a swallowed storage operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Quota exceeded, storage disabled, or an I/O failure
    StorageUnavailable,
    /// A stored value could not be interpreted
    ParseFailure,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::StorageUnavailable => write!(f, "storage unavailable"),
            WarningKind::ParseFailure => write!(f, "unreadable value"),
        }
    }
}

/// A non-fatal problem the store worked around
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWarning {
    pub kind: WarningKind,
    pub key: String,
    pub detail: String,
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.key, self.detail)
    }
}

impl StoreWarning {
    pub fn to_recovery_entry(&self) -> RecoveryEntry {
        let category = match self.kind {
            WarningKind::StorageUnavailable => RecoveryCategory::Storage,
            WarningKind::ParseFailure => RecoveryCategory::Parser,
        };
        RecoveryEntry::new(category, self.kind.to_string())
            .field("Key", self.key.clone())
            .body(self.detail.clone())
    }
}

/// Owns the mapping between checklist entities and durable key/value storage.
///
/// In-memory state is authoritative for the session: failed writes are
/// recorded as warnings and the next successful write supersedes them.
pub struct PersistedStateStore<S: KeyValueStore> {
    storage: S,
    task_ids: Vec<String>,
    section_ids: Vec<String>,
    state: ChecklistState,
    ticker: Ticker,
    warnings: Vec<StoreWarning>,
}

impl<S: KeyValueStore> PersistedStateStore<S> {
    /// Create a store for `checklist` and load its state from `storage`.
    pub fn open(storage: S, checklist: &Checklist) -> Self {
        let mut store = PersistedStateStore {
            storage,
            task_ids: checklist.task_ids().map(str::to_string).collect(),
            section_ids: checklist.phase_ids().map(str::to_string).collect(),
            state: ChecklistState::default(),
            ticker: Ticker::new(),
            warnings: Vec::new(),
        };
        store.load();
        store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn state(&self) -> &ChecklistState {
        &self.state
    }

    pub fn progress(&self) -> ProgressSummary {
        self.state.progress()
    }

    /// Drain warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    // -----------------------------------------------------------------------
    // Storage access
    // -----------------------------------------------------------------------

    fn read(&mut self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(v) => v,
            Err(e) => {
                self.warn(WarningKind::StorageUnavailable, key, e.to_string());
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            self.warn(WarningKind::StorageUnavailable, key, e.to_string());
        }
    }

    fn warn(&mut self, kind: WarningKind, key: &str, detail: String) {
        self.warnings.push(StoreWarning {
            kind,
            key: key.to_string(),
            detail,
        });
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Rebuild the in-memory snapshot from storage.
    ///
    /// Every timer comes back Stopped at its last saved value; the running
    /// marker is ignored.
    pub fn load(&mut self) -> &ChecklistState {
        self.ticker.cancel_all();

        let mut state = ChecklistState::default();

        for id in self.task_ids.clone() {
            let done = self.read(keys::task_key(&id)).as_deref() == Some("true");
            state.tasks.insert(id, done);
        }

        for id in self.section_ids.clone() {
            let expanded = self.read(&keys::expanded_key(&id)).as_deref() == Some("true");
            let elapsed = self.read_elapsed(&id);
            let notes = self.read(&keys::notes_key(&id)).unwrap_or_default();
            state.sections.insert(
                id,
                SectionState {
                    expanded,
                    elapsed,
                    timer: TimerState::Stopped,
                    notes,
                },
            );
        }

        state.theme = self.read_theme();
        self.state = state;
        &self.state
    }

    fn read_elapsed(&mut self, section_id: &str) -> u64 {
        let key = keys::timer_key(section_id);
        let Some(raw) = self.read(&key) else {
            return 0;
        };
        match raw.trim().parse::<u64>() {
            Ok(secs) => secs,
            Err(e) => {
                self.warn(WarningKind::ParseFailure, &key, format!("{:?}: {}", raw, e));
                0
            }
        }
    }

    fn read_theme(&mut self) -> Theme {
        match self.read(keys::THEME_KEY) {
            Some(raw) => match Theme::parse_theme(&raw) {
                Some(theme) => theme,
                None => {
                    self.warn(
                        WarningKind::ParseFailure,
                        keys::THEME_KEY,
                        format!("{:?} is not a theme", raw),
                    );
                    self.write(keys::THEME_KEY, Theme::Dark.as_str());
                    Theme::Dark
                }
            },
            None => {
                self.write(keys::THEME_KEY, Theme::Dark.as_str());
                Theme::Dark
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Set a task's completion flag, persist it, and return the new progress.
    pub fn record_task_change(
        &mut self,
        task_id: &str,
        completed: bool,
    ) -> Result<ProgressSummary, StoreError> {
        let flag = self
            .state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::UnknownTask(task_id.to_string()))?;
        *flag = completed;
        self.write(keys::task_key(task_id), keys::bool_value(completed));
        Ok(self.progress())
    }

    /// Flip a task's completion flag. Returns the new flag and progress.
    pub fn toggle_task(&mut self, task_id: &str) -> Result<(bool, ProgressSummary), StoreError> {
        let completed = !self
            .state
            .tasks
            .get(task_id)
            .copied()
            .ok_or_else(|| StoreError::UnknownTask(task_id.to_string()))?;
        let progress = self.record_task_change(task_id, completed)?;
        Ok((completed, progress))
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    fn section_mut(&mut self, section_id: &str) -> Result<&mut SectionState, StoreError> {
        self.state
            .sections
            .get_mut(section_id)
            .ok_or_else(|| StoreError::UnknownSection(section_id.to_string()))
    }

    /// Flip a section's expanded flag and persist it. Returns the new flag.
    pub fn toggle_section(&mut self, section_id: &str) -> Result<bool, StoreError> {
        let section = self.section_mut(section_id)?;
        section.expanded = !section.expanded;
        let expanded = section.expanded;
        self.write(&keys::expanded_key(section_id), keys::bool_value(expanded));
        Ok(expanded)
    }

    /// Set a section's expanded flag. Persists only when the flag changes;
    /// returns whether it did.
    pub fn set_expanded(&mut self, section_id: &str, expanded: bool) -> Result<bool, StoreError> {
        let section = self.section_mut(section_id)?;
        if section.expanded == expanded {
            return Ok(false);
        }
        section.expanded = expanded;
        self.write(&keys::expanded_key(section_id), keys::bool_value(expanded));
        Ok(true)
    }

    /// Expand every section. Returns how many changed.
    pub fn expand_all(&mut self) -> usize {
        self.set_all_expanded(true)
    }

    /// Collapse every section. Returns how many changed.
    pub fn collapse_all(&mut self) -> usize {
        self.set_all_expanded(false)
    }

    fn set_all_expanded(&mut self, expanded: bool) -> usize {
        let mut changed = 0;
        for id in self.section_ids.clone() {
            if let Ok(true) = self.set_expanded(&id, expanded) {
                changed += 1;
            }
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Stopped→Running. A running timer is left alone. Returns whether the
    /// state changed.
    pub fn start_timer(&mut self, section_id: &str, now: Instant) -> Result<bool, StoreError> {
        let section = self.section_mut(section_id)?;
        if section.timer.is_running() {
            return Ok(false);
        }
        section.timer = TimerState::Running;
        self.ticker.schedule(section_id, now);
        self.write(&keys::running_key(section_id), keys::bool_value(true));
        Ok(true)
    }

    /// Running→Stopped. The ticking process is cancelled before this
    /// returns. A stopped timer is left alone. Returns whether the state changed.
    pub fn pause_timer(&mut self, section_id: &str) -> Result<bool, StoreError> {
        let section = self.section_mut(section_id)?;
        if !section.timer.is_running() {
            return Ok(false);
        }
        section.timer = TimerState::Stopped;
        self.ticker.cancel(section_id);
        self.write(&keys::running_key(section_id), keys::bool_value(false));
        Ok(true)
    }

    /// Start if stopped, pause if running. Returns the new state.
    pub fn toggle_timer(&mut self, section_id: &str, now: Instant) -> Result<TimerState, StoreError> {
        let running = self
            .state
            .section(section_id)
            .ok_or_else(|| StoreError::UnknownSection(section_id.to_string()))?
            .timer
            .is_running();
        if running {
            self.pause_timer(section_id)?;
            Ok(TimerState::Stopped)
        } else {
            self.start_timer(section_id, now)?;
            Ok(TimerState::Running)
        }
    }

    /// Pause, then zero the elapsed time.
    pub fn reset_timer(&mut self, section_id: &str) -> Result<(), StoreError> {
        self.pause_timer(section_id)?;
        self.section_mut(section_id)?.elapsed = 0;
        self.write(&keys::timer_key(section_id), "0");
        Ok(())
    }

    /// Apply one tick. Ignored unless the timer is running.
    pub fn tick(&mut self, section_id: &str) -> Result<bool, StoreError> {
        self.apply_ticks(section_id, 1)
    }

    fn apply_ticks(&mut self, section_id: &str, count: u64) -> Result<bool, StoreError> {
        let section = self.section_mut(section_id)?;
        if !section.timer.is_running() || count == 0 {
            return Ok(false);
        }
        section.elapsed += count;
        let elapsed = section.elapsed.to_string();
        self.write(&keys::timer_key(section_id), &elapsed);
        Ok(true)
    }

    /// Apply every tick that came due by `now`. Returns the sections that ticked.
    pub fn advance_timers(&mut self, now: Instant) -> Vec<String> {
        let mut ticked = Vec::new();
        for (id, count) in self.ticker.due(now) {
            if let Ok(true) = self.apply_ticks(&id, count) {
                ticked.push(id);
            }
        }
        ticked
    }

    /// When the event loop next needs to call `advance_timers`
    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.ticker.next_deadline()
    }

    pub fn any_timer_running(&self) -> bool {
        self.state.sections.values().any(|s| s.timer.is_running())
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    /// Replace a section's notes and persist them verbatim.
    pub fn set_notes(&mut self, section_id: &str, text: &str) -> Result<(), StoreError> {
        let section = self.section_mut(section_id)?;
        section.notes.clear();
        section.notes.push_str(text);
        self.write(&keys::notes_key(section_id), text);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Theme
    // -----------------------------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
        self.write(keys::THEME_KEY, theme.as_str());
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.state.theme.toggled();
        self.set_theme(theme);
        theme
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Clear every task, zero and stop every timer, and clear every note.
    ///
    /// All writes go out as one batch. If the batch fails nothing in memory
    /// changes and the error is returned.
    pub fn reset_all(&mut self) -> Result<ProgressSummary, StoreError> {
        let mut batch = Vec::with_capacity(self.task_ids.len() + self.section_ids.len() * 3);
        for id in &self.task_ids {
            batch.push(KvWrite::remove(keys::task_key(id)));
        }
        for id in &self.section_ids {
            batch.push(KvWrite::set(keys::timer_key(id), "0"));
            batch.push(KvWrite::set(keys::running_key(id), keys::bool_value(false)));
            batch.push(KvWrite::remove(keys::notes_key(id)));
        }
        self.storage.apply(&batch)?;

        self.ticker.cancel_all();
        for done in self.state.tasks.values_mut() {
            *done = false;
        }
        for section in self.state.sections.values_mut() {
            section.timer = TimerState::Stopped;
            section.elapsed = 0;
            section.notes.clear();
        }
        Ok(self.progress())
    }
}
