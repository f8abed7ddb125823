use serde::Serialize;

use crate::model::checklist::{Checklist, Phase};
use crate::model::state::{ChecklistState, ProgressSummary, SectionState};
use crate::ops::format::format_elapsed;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusJson {
    pub title: String,
    pub progress: ProgressSummary,
    pub theme: String,
    pub phases: Vec<PhaseStatusJson>,
}

#[derive(Serialize)]
pub struct PhaseStatusJson {
    pub id: String,
    pub name: String,
    pub progress: ProgressSummary,
    pub expanded: bool,
    pub elapsed: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

#[derive(Serialize)]
pub struct PhaseTasksJson {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub done: bool,
}

#[derive(Serialize)]
pub struct TimerJson {
    pub phase: String,
    pub elapsed: u64,
    pub display: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn phase_progress(phase: &Phase, state: &ChecklistState) -> ProgressSummary {
    state.progress_of(phase.tasks.iter().map(|t| t.id.as_str()))
}

fn section_of<'a>(phase: &Phase, state: &'a ChecklistState) -> std::borrow::Cow<'a, SectionState> {
    match state.section(&phase.id) {
        Some(s) => std::borrow::Cow::Borrowed(s),
        None => std::borrow::Cow::Owned(SectionState::default()),
    }
}

pub fn status_to_json(checklist: &Checklist, state: &ChecklistState) -> StatusJson {
    StatusJson {
        title: checklist.title.clone(),
        progress: state.progress(),
        theme: state.theme.to_string(),
        phases: checklist
            .phases
            .iter()
            .map(|phase| {
                let section = section_of(phase, state);
                PhaseStatusJson {
                    id: phase.id.clone(),
                    name: phase.name.clone(),
                    progress: phase_progress(phase, state),
                    expanded: section.expanded,
                    elapsed: section.elapsed,
                    notes: section.notes.clone(),
                }
            })
            .collect(),
    }
}

pub fn phase_tasks_to_json(phase: &Phase, state: &ChecklistState) -> PhaseTasksJson {
    PhaseTasksJson {
        id: phase.id.clone(),
        name: phase.name.clone(),
        tasks: phase
            .tasks
            .iter()
            .map(|t| TaskJson {
                id: t.id.clone(),
                title: t.title.clone(),
                done: state.is_completed(&t.id),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `[######----] 60%` style bar, `width` cells between the brackets
pub fn format_progress_bar(percentage: u8, width: usize) -> String {
    let filled = (percentage as usize * width + 50) / 100;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percentage
    )
}

pub fn format_progress_line(progress: &ProgressSummary) -> String {
    format!(
        "{} ({}/{})",
        format_progress_bar(progress.percentage, 20),
        progress.completed,
        progress.total
    )
}

pub fn format_status(checklist: &Checklist, state: &ChecklistState) -> String {
    let mut out = String::new();
    out.push_str(&checklist.title);
    out.push('\n');
    out.push_str(&format_progress_line(&state.progress()));
    out.push('\n');
    if checklist.phases.is_empty() {
        out.push_str("\n(no phases)\n");
        return out;
    }
    out.push('\n');

    let id_width = checklist.phases.iter().map(|p| p.id.len()).max().unwrap_or(0);
    for phase in &checklist.phases {
        let section = section_of(phase, state);
        let progress = phase_progress(phase, state);
        let marker = if section.expanded { '▾' } else { '▸' };
        out.push_str(&format!(
            "{} {:<width$}  {:>3}/{:<3} {:>8}  {}",
            marker,
            phase.id,
            progress.completed,
            progress.total,
            format_elapsed(section.elapsed),
            phase.name,
            width = id_width,
        ));
        if !section.notes.is_empty() {
            out.push_str("  [notes]");
        }
        out.push('\n');
    }
    out
}

pub fn format_phase_tasks(phase: &Phase, state: &ChecklistState) -> String {
    let mut out = format!("{} ({})\n", phase.name, phase.id);
    if phase.tasks.is_empty() {
        out.push_str("  (no tasks)\n");
    }
    for task in &phase.tasks {
        let mark = if state.is_completed(&task.id) { 'x' } else { ' ' };
        out.push_str(&format!("  [{}] {}  {}\n", mark, task.id, task.title));
    }
    out
}
