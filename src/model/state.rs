use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Run state of a phase timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

impl TimerState {
    pub fn is_running(self) -> bool {
        self == TimerState::Running
    }
}

/// Color scheme persisted under the `theme` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse_theme(s: &str) -> Option<Self> {
        match s {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory state of one phase section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionState {
    pub expanded: bool,
    /// Whole seconds on the phase timer
    pub elapsed: u64,
    pub timer: TimerState,
    pub notes: String,
}

/// Derived progress over all tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

impl ProgressSummary {
    /// `round(100 * completed / total)`, rounding halves up; 0 for an empty list.
    pub fn compute(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            let completed = completed.min(total) as u64;
            ((completed * 200 + total as u64) / (total as u64 * 2)) as u8
        };
        ProgressSummary {
            completed,
            total,
            percentage,
        }
    }
}

/// Snapshot of all persisted UI state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChecklistState {
    /// Task ID → completed, in checklist order
    pub tasks: IndexMap<String, bool>,
    /// Section ID → section state, in checklist order
    pub sections: IndexMap<String, SectionState>,
    pub theme: Theme,
}

impl ChecklistState {
    pub fn is_completed(&self, task_id: &str) -> bool {
        self.tasks.get(task_id).copied().unwrap_or(false)
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionState> {
        self.sections.get(section_id)
    }

    pub fn progress(&self) -> ProgressSummary {
        let completed = self.tasks.values().filter(|done| **done).count();
        ProgressSummary::compute(completed, self.tasks.len())
    }

    /// Progress restricted to the given task IDs (e.g. one phase)
    pub fn progress_of<'a>(&self, task_ids: impl IntoIterator<Item = &'a str>) -> ProgressSummary {
        let mut total = 0;
        let mut completed = 0;
        for id in task_ids {
            total += 1;
            if self.is_completed(id) {
                completed += 1;
            }
        }
        ProgressSummary::compute(completed, total)
    }
}
