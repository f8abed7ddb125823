mod init;
pub use init::cmd_init;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::kv::FileStore;
use crate::io::lock::with_lock;
use crate::io::project_io::{self, ProjectError};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::checklist::Phase;
use crate::model::project::Project;
use crate::model::state::Theme;
use crate::ops::format::format_elapsed;
use crate::ops::store::{PersistedStateStore, StoreError};

/// Global override for project directory (set by -C flag)
static PROJECT_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    if let Some(ref dir) = cli.project_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        if let Ok(mut guard) = PROJECT_DIR_OVERRIDE.lock() {
            guard.replace(abs);
        }
    }

    match cli.command {
        None => Err("no subcommand given (run `pl` without arguments for the TUI)".into()),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, &start_dir()?),

            // Read commands
            Commands::Status => cmd_status(json),
            Commands::List(args) => cmd_list(args, json),
            Commands::Recovery(args) => cmd_recovery(args, json),

            // Write commands
            Commands::Check(args) => cmd_set_tasks(args, true, json),
            Commands::Uncheck(args) => cmd_set_tasks(args, false, json),
            Commands::Expand(args) => cmd_expand(args, true),
            Commands::Collapse(args) => cmd_expand(args, false),
            Commands::Toggle(args) => cmd_toggle(args),
            Commands::Timer(args) => cmd_timer(args, json),
            Commands::Notes(args) => cmd_notes(args, json),
            Commands::Theme(args) => cmd_theme(args, json),
            Commands::Reset(args) => cmd_reset(args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The -C directory, or the current directory
fn start_dir() -> Result<PathBuf, ProjectError> {
    let override_dir = PROJECT_DIR_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone());
    match override_dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(ProjectError::IoError),
    }
}

fn load_project_cwd() -> Result<Project, ProjectError> {
    let root = project_io::discover_project(&start_dir()?)?;
    project_io::load_project(&root)
}

/// Load the project, open the store, run `f`, then route any store
/// warnings to stderr and the recovery log. Each storage write takes the
/// data lock itself.
fn with_store<T>(
    f: impl FnOnce(&Project, &mut PersistedStateStore<FileStore>) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let project = load_project_cwd()?;
    let mut store = PersistedStateStore::open(project_io::open_storage(&project), &project.checklist);
    let result = f(&project, &mut store);
    report_warnings(&project, &mut store);
    result
}

fn report_warnings(project: &Project, store: &mut PersistedStateStore<FileStore>) {
    for warning in store.take_warnings() {
        eprintln!("warning: {}", warning);
        recovery::log_recovery(&project.data_dir, warning.to_recovery_entry());
    }
}

fn find_phase<'a>(project: &'a Project, phase_id: &str) -> Result<&'a Phase, StoreError> {
    project
        .checklist
        .find_phase(phase_id)
        .ok_or_else(|| StoreError::UnknownSection(phase_id.to_string()))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_status(json: bool) -> CmdResult {
    with_store(|project, store| {
        if json {
            print_json(&status_to_json(&project.checklist, store.state()))
        } else {
            print!("{}", format_status(&project.checklist, store.state()));
            Ok(())
        }
    })
}

fn cmd_list(args: ListArgs, json: bool) -> CmdResult {
    with_store(|project, store| {
        let phases: Vec<&Phase> = match &args.phase {
            Some(id) => vec![find_phase(project, id)?],
            None => project.checklist.phases.iter().collect(),
        };
        if json {
            let out: Vec<PhaseTasksJson> = phases
                .iter()
                .map(|p| phase_tasks_to_json(p, store.state()))
                .collect();
            return print_json(&out);
        }
        let blocks: Vec<String> = phases
            .iter()
            .map(|p| format_phase_tasks(p, store.state()))
            .collect();
        print!("{}", blocks.join("\n"));
        Ok(())
    })
}

fn cmd_recovery(args: RecoveryCmd, json: bool) -> CmdResult {
    let project = load_project_cwd()?;
    if let Some(RecoveryAction::Prune(prune)) = args.action {
        let removed = with_lock(&project.data_dir, || {
            recovery::prune_recovery(&project.data_dir, None, prune.all)
        })??;
        println!("pruned {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&project.data_dir, args.tail);
    if json {
        let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        return print_json(&values);
    }
    let Some(summary) = recovery::recovery_summary(&project.data_dir) else {
        println!("recovery log is empty");
        return Ok(());
    };
    let oldest = summary
        .oldest
        .map(|t| format!(", oldest {}", t.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    println!(
        "{} entr{} in recovery log{}\n",
        summary.entry_count,
        if summary.entry_count == 1 { "y" } else { "ies" },
        oldest
    );
    for entry in &entries {
        print!("{}", entry.to_display_markdown());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_set_tasks(args: TaskIdsArgs, completed: bool, json: bool) -> CmdResult {
    with_store(|project, store| {
        // Reject the whole command before writing if any id is unknown
        if let Some(bad) = args
            .ids
            .iter()
            .find(|id| project.checklist.find_task(id).is_none())
        {
            return Err(StoreError::UnknownTask(bad.clone()).into());
        }

        let mut progress = store.progress();
        for id in &args.ids {
            progress = store.record_task_change(id, completed)?;
            if !json {
                println!("{} {}", if completed { "checked" } else { "unchecked" }, id);
            }
        }
        if json {
            print_json(&progress)
        } else {
            println!("{}", format_progress_line(&progress));
            Ok(())
        }
    })
}

fn cmd_expand(args: SectionArgs, expanded: bool) -> CmdResult {
    let verb = if expanded { "expanded" } else { "collapsed" };
    with_store(|_project, store| {
        if args.all {
            let changed = if expanded {
                store.expand_all()
            } else {
                store.collapse_all()
            };
            println!("{} {} phase{}", verb, changed, if changed == 1 { "" } else { "s" });
            return Ok(());
        }
        let phase = args.phase.as_deref().unwrap_or_default();
        store.set_expanded(phase, expanded)?;
        println!("{} {}", verb, phase);
        Ok(())
    })
}

fn cmd_toggle(args: PhaseArg) -> CmdResult {
    with_store(|_project, store| {
        let expanded = store.toggle_section(&args.phase)?;
        println!(
            "{} {}",
            if expanded { "expanded" } else { "collapsed" },
            args.phase
        );
        Ok(())
    })
}

fn cmd_timer(args: TimerCmd, json: bool) -> CmdResult {
    with_store(|project, store| match args.action {
        TimerAction::Show(target) => {
            let phases: Vec<&Phase> = match &target.phase {
                Some(id) => vec![find_phase(project, id)?],
                None => project.checklist.phases.iter().collect(),
            };
            let timers: Vec<TimerJson> = phases
                .iter()
                .map(|p| {
                    let elapsed = store.state().section(&p.id).map_or(0, |s| s.elapsed);
                    TimerJson {
                        phase: p.id.clone(),
                        elapsed,
                        display: format_elapsed(elapsed),
                    }
                })
                .collect();
            if json {
                return print_json(&timers);
            }
            for t in &timers {
                println!("{:>8}  {}", t.display, t.phase);
            }
            Ok(())
        }
        TimerAction::Reset(target) => {
            store.reset_timer(&target.phase)?;
            println!("reset timer for {}", target.phase);
            Ok(())
        }
    })
}

fn cmd_notes(args: NotesArgs, json: bool) -> CmdResult {
    with_store(|_project, store| {
        let new_text = if args.clear { Some(String::new()) } else { args.text };
        match new_text {
            Some(text) => {
                store.set_notes(&args.phase, &text)?;
                if text.is_empty() {
                    println!("cleared notes for {}", args.phase);
                } else {
                    println!("updated notes for {}", args.phase);
                }
                Ok(())
            }
            None => {
                let notes = store
                    .state()
                    .section(&args.phase)
                    .ok_or_else(|| StoreError::UnknownSection(args.phase.clone()))?
                    .notes
                    .clone();
                if json {
                    return print_json(&serde_json::json!({ "phase": args.phase, "notes": notes }));
                }
                if !notes.is_empty() {
                    println!("{}", notes);
                }
                Ok(())
            }
        }
    })
}

fn cmd_theme(args: ThemeArgs, json: bool) -> CmdResult {
    with_store(|_project, store| {
        let theme = match args.theme {
            None => store.theme(),
            Some(ThemeChoice::Toggle) => store.toggle_theme(),
            Some(ThemeChoice::Dark) => {
                store.set_theme(Theme::Dark);
                Theme::Dark
            }
            Some(ThemeChoice::Light) => {
                store.set_theme(Theme::Light);
                Theme::Light
            }
        };
        if json {
            print_json(&serde_json::json!({ "theme": theme }))
        } else {
            println!("{}", theme);
            Ok(())
        }
    })
}

/// Ask on stdin; anything but y/yes declines.
fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn cmd_reset(args: ResetArgs) -> CmdResult {
    if !args.yes && !confirm("Reset all progress, timers and notes?")? {
        println!("reset cancelled");
        return Ok(());
    }
    with_store(|project, store| match store.reset_all() {
        Ok(progress) => {
            println!("reset {} tasks and {} phases", progress.total, project.checklist.phases.len());
            Ok(())
        }
        Err(e) => {
            recovery::log_recovery(
                &project.data_dir,
                RecoveryEntry::new(RecoveryCategory::Reset, "reset did not commit")
                    .field("Error", e.to_string()),
            );
            Err(e.into())
        }
    })
}
