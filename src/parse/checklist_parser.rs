use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::checklist::{Checklist, Phase, TaskDef};
use crate::ops::keys::{is_reserved_section_id, is_reserved_task_id};

/// `## Phase name {#phase-id}`: the id suffix is optional
static PHASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+?)(?:\s+\{#([A-Za-z0-9_-]+)\})?\s*$").unwrap());

/// `- [ ] `task-id` Title`: checkbox and id are both optional
static TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*]\s+(?:\[[ xX]\]\s+)?(?:`([^`\s]+)`\s*)?(.*)$").unwrap()
});

/// Parse a checklist definition from markdown.
///
/// Returns the checklist and a list of human-readable warnings for lines
/// that were dropped (tasks outside a phase, duplicate ids, empty titles).
pub fn parse_checklist(source: &str) -> (Checklist, Vec<String>) {
    let mut checklist = Checklist::default();
    let mut warnings = Vec::new();
    let mut seen_tasks: HashSet<String> = HashSet::new();
    let mut seen_phases: HashSet<String> = HashSet::new();
    let mut title_set = false;
    // Set while inside a phase that was dropped as a duplicate
    let mut skipping_phase = false;

    for (lineno, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        let lineno = lineno + 1;

        if let Some(title) = trimmed.strip_prefix("# ") {
            if !title_set {
                checklist.title = title.trim().to_string();
                title_set = true;
            }
            continue;
        }

        if let Some(caps) = PHASE_RE.captures(trimmed) {
            let name = caps[1].trim().to_string();
            let id = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| slugify(&name));
            if is_reserved_section_id(&id) {
                warnings.push(format!("line {}: phase id \"{}\" is reserved", lineno, id));
                skipping_phase = true;
                continue;
            }
            if id.is_empty() || !seen_phases.insert(id.clone()) {
                warnings.push(format!("line {}: duplicate or empty phase id \"{}\"", lineno, id));
                skipping_phase = true;
                continue;
            }
            skipping_phase = false;
            checklist.phases.push(Phase {
                id,
                name,
                tasks: Vec::new(),
            });
            continue;
        }

        // Only top-level list items are tasks
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some(caps) = TASK_RE.captures(trimmed) else {
            continue;
        };
        if skipping_phase {
            warnings.push(format!("line {}: task under dropped phase: {}", lineno, trimmed));
            continue;
        }
        let Some(phase) = checklist.phases.last_mut() else {
            warnings.push(format!("line {}: task outside any phase: {}", lineno, trimmed));
            continue;
        };

        let title = caps[2].trim().to_string();
        if title.is_empty() {
            warnings.push(format!("line {}: task without a title", lineno));
            continue;
        }
        let id = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| format!("{}-{}", phase.id, phase.tasks.len() + 1));
        if is_reserved_task_id(&id) {
            warnings.push(format!("line {}: task id \"{}\" is reserved", lineno, id));
            continue;
        }
        if !seen_tasks.insert(id.clone()) {
            warnings.push(format!("line {}: duplicate task id \"{}\"", lineno, id));
            continue;
        }
        phase.tasks.push(TaskDef { id, title });
    }

    (checklist, warnings)
}

/// Lowercase, alphanumerics kept, every other run collapsed to one hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# Launch Checklist

Some intro text that is ignored.

## Phase 1: Foundation {#phase-1}

- [ ] `p1-domain` Register the domain
- [x] `p1-repo` Create the repository
  - a nested note line

## Phase 2: Build

- Write the README
- [ ] Ship it
";

    #[test]
    fn parses_phases_and_tasks() {
        let (c, warnings) = parse_checklist(SAMPLE);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(c.title, "Launch Checklist");
        assert_eq!(c.phases.len(), 2);

        let p1 = &c.phases[0];
        assert_eq!(p1.id, "phase-1");
        assert_eq!(p1.name, "Phase 1: Foundation");
        let ids: Vec<&str> = p1.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["p1-domain", "p1-repo"]);
        assert_eq!(p1.tasks[1].title, "Create the repository");

        let p2 = &c.phases[1];
        assert_eq!(p2.id, "phase-2-build");
        assert_eq!(p2.tasks[0].id, "phase-2-build-1");
        assert_eq!(p2.tasks[1].id, "phase-2-build-2");
        assert_eq!(p2.tasks[1].title, "Ship it");
    }

    #[test]
    fn task_before_any_phase_is_dropped() {
        let (c, warnings) = parse_checklist("- orphan\n## A\n- kept\n");
        assert_eq!(c.total_tasks(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("outside any phase"));
    }

    #[test]
    fn phase_id_ending_in_running_is_dropped() {
        let src = "## A {#a}\n- `t1` One\n## B {#a_running}\n- `t2` Lost\n";
        let (c, warnings) = parse_checklist(src);
        let ids: Vec<&str> = c.phase_ids().collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(c.total_tasks(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("\"a_running\" is reserved"), "{:?}", warnings);
        assert!(warnings[1].contains("dropped phase"), "{:?}", warnings);
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let src = "## A {#a}\n- `t1` One\n- `t1` Again\n## B {#a}\n- `t2` Lost\n";
        let (c, warnings) = parse_checklist(src);
        assert_eq!(c.phases.len(), 1);
        assert_eq!(c.total_tasks(), 1);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn reserved_task_ids_are_dropped() {
        let (c, warnings) = parse_checklist("## A\n- `theme` Pick colors\n- `timer_a` Clash\n- `ok` Fine\n");
        assert_eq!(c.total_tasks(), 1);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("reserved"));
    }

    #[test]
    fn empty_source_gives_default_title() {
        let (c, warnings) = parse_checklist("");
        assert_eq!(c.title, "Checklist");
        assert!(c.phases.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Phase 1: Foundation!"), "phase-1-foundation");
        assert_eq!(slugify("  --Ünïcode  ok"), "ünïcode-ok");
        assert_eq!(slugify("!!!"), "");
    }
}
