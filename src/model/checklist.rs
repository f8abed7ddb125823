use serde::{Deserialize, Serialize};

/// A single checklist item. Completion state lives in storage, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDef {
    /// Stable task ID, doubles as the storage key for its completion flag
    pub id: String,
    pub title: String,
}

/// A named group of tasks with its own expand state, timer and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Stable section ID (from `{#id}` or the slugified heading)
    pub id: String,
    pub name: String,
    pub tasks: Vec<TaskDef>,
}

/// The static checklist definition parsed from `checklist.md`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub title: String,
    pub phases: Vec<Phase>,
}

impl Default for Checklist {
    fn default() -> Self {
        Checklist {
            title: "Checklist".to_string(),
            phases: Vec::new(),
        }
    }
}

impl Checklist {
    /// All task IDs in display order
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.phases
            .iter()
            .flat_map(|p| p.tasks.iter().map(|t| t.id.as_str()))
    }

    /// All phase IDs in display order
    pub fn phase_ids(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|p| p.id.as_str())
    }

    pub fn total_tasks(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    pub fn find_phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    /// Find a task and the phase that owns it
    pub fn find_task(&self, task_id: &str) -> Option<(&Phase, &TaskDef)> {
        self.phases.iter().find_map(|p| {
            p.tasks
                .iter()
                .find(|t| t.id == task_id)
                .map(|t| (p, t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checklist {
        Checklist {
            title: "Launch".into(),
            phases: vec![
                Phase {
                    id: "phase-1".into(),
                    name: "Foundation".into(),
                    tasks: vec![
                        TaskDef {
                            id: "p1-a".into(),
                            title: "A".into(),
                        },
                        TaskDef {
                            id: "p1-b".into(),
                            title: "B".into(),
                        },
                    ],
                },
                Phase {
                    id: "phase-2".into(),
                    name: "Build".into(),
                    tasks: vec![TaskDef {
                        id: "p2-a".into(),
                        title: "C".into(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn task_ids_in_order() {
        let c = sample();
        let ids: Vec<&str> = c.task_ids().collect();
        assert_eq!(ids, vec!["p1-a", "p1-b", "p2-a"]);
        assert_eq!(c.total_tasks(), 3);
    }

    #[test]
    fn find_task_returns_owner() {
        let c = sample();
        let (phase, task) = c.find_task("p2-a").unwrap();
        assert_eq!(phase.id, "phase-2");
        assert_eq!(task.title, "C");
        assert!(c.find_task("nope").is_none());
    }
}
