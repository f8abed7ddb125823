//! Storage key layout. All keys share one flat namespace.

pub const THEME_KEY: &str = "theme";

const EXPANDED_PREFIX: &str = "expanded_";
const TIMER_PREFIX: &str = "timer_";
const NOTES_PREFIX: &str = "notes_";
const RUNNING_SUFFIX: &str = "_running";

/// Completion flag of a task: the task ID itself
pub fn task_key(task_id: &str) -> &str {
    task_id
}

pub fn expanded_key(section_id: &str) -> String {
    format!("{}{}", EXPANDED_PREFIX, section_id)
}

/// Elapsed seconds of a section timer
pub fn timer_key(section_id: &str) -> String {
    format!("{}{}", TIMER_PREFIX, section_id)
}

/// Written on start/pause, never read back
pub fn running_key(section_id: &str) -> String {
    format!("{}{}{}", TIMER_PREFIX, section_id, RUNNING_SUFFIX)
}

pub fn notes_key(section_id: &str) -> String {
    format!("{}{}", NOTES_PREFIX, section_id)
}

pub fn bool_value(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// True if a task ID would collide with a section or theme key
pub fn is_reserved_task_id(task_id: &str) -> bool {
    task_id == THEME_KEY
        || task_id.starts_with(EXPANDED_PREFIX)
        || task_id.starts_with(TIMER_PREFIX)
        || task_id.starts_with(NOTES_PREFIX)
}

/// True if a section's elapsed key would be another section's running
/// marker (`timer_a_running` for both `a_running` and `a`)
pub fn is_reserved_section_id(section_id: &str) -> bool {
    section_id.ends_with(RUNNING_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(task_key("p1-a"), "p1-a");
        assert_eq!(expanded_key("phase-1"), "expanded_phase-1");
        assert_eq!(timer_key("phase-1"), "timer_phase-1");
        assert_eq!(running_key("phase-1"), "timer_phase-1_running");
        assert_eq!(notes_key("phase-1"), "notes_phase-1");
        assert_eq!(bool_value(true), "true");
    }

    #[test]
    fn reserved_ids() {
        assert!(is_reserved_task_id("theme"));
        assert!(is_reserved_task_id("timer_x"));
        assert!(is_reserved_task_id("notes_"));
        assert!(!is_reserved_task_id("timers"));
        assert!(!is_reserved_task_id("p1-a"));
    }

    #[test]
    fn running_suffix_is_reserved_for_sections() {
        assert!(is_reserved_section_id("a_running"));
        assert_eq!(timer_key("a_running"), running_key("a"));
        assert!(!is_reserved_section_id("running"));
        assert!(!is_reserved_section_id("a-running"));
    }
}
