use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::project_io::{self, DATA_DIR};
use crate::parse::parse_checklist;

const PROJECT_TOML_TEMPLATE: &str = r##"[project]
name = "{name}"
# Checklist definition, relative to this directory
checklist = "checklist.md"

[storage]
# Key/value state (progress, timers, notes, theme)
file = ".storage.json"

[ui]
show_key_hints = true

# --- Theme overrides ---
# Uncomment and edit to override the built-in palettes.
#
# [ui.dark]
# background = "#0C001B"
# text = "#B0AAFF"
# highlight = "#FB4196"
#
# [ui.light]
# background = "#FAFAFA"
# text = "#2A2540"
# highlight = "#C2185B"
"##;

const CHECKLIST_TEMPLATE: &str = "\
# {name}

> Phases are `##` headings. Tasks are list items; an id in backticks is
> optional and defaults to <phase-id>-<n>.

## Phase 1: Plan {#phase-1}

- [ ] `plan-scope` Write down the scope
- [ ] `plan-risks` List the risks

## Phase 2: Build {#phase-2}

- [ ] `build-first` Build the first slice
- [ ] `build-review` Review it with someone

## Phase 3: Ship {#phase-3}

- [ ] `ship-release` Release
- [ ] `ship-retro` Hold a retrospective
";

/// Infer a project name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_project_toml(name: &str) -> String {
    PROJECT_TOML_TEMPLATE.replace("{name}", &name.replace('"', "\\\""))
}

fn render_checklist(name: &str) -> String {
    CHECKLIST_TEMPLATE.replace("{name}", name)
}

pub fn cmd_init(args: InitArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = dir.join(DATA_DIR);

    if data_dir.join("project.toml").exists() && !args.force {
        return Err("phaselist project already exists in ./phaselist/ (use --force to rewrite the config)".into());
    }

    if let Some(parent) = dir.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!(
            "Note: parent project found at {}/",
            parent_root.join(DATA_DIR).display()
        );
    }

    let name = args.name.unwrap_or_else(|| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join("project.toml"), render_project_toml(&name))?;

    let checklist_path = data_dir.join("checklist.md");
    let wrote_checklist = !checklist_path.exists();
    if wrote_checklist {
        fs::write(&checklist_path, render_checklist(&name))?;
    }

    println!("Initialized phaselist project: {}", name);
    if wrote_checklist {
        let (checklist, _) = parse_checklist(&render_checklist(&name));
        println!(
            "  checklist: phaselist/checklist.md ({} phases, {} tasks)",
            checklist.phases.len(),
            checklist.total_tasks()
        );
    } else {
        println!("  kept existing phaselist/checklist.md");
    }
    Ok(())
}
