use std::fs;
use std::path::{Path, PathBuf};

use crate::io::kv::{FileStore, StorageError};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::model::config::ProjectConfig;
use crate::model::project::Project;
use crate::parse::parse_checklist;

/// Name of the per-project data directory
pub const DATA_DIR: &str = "phaselist";

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a phaselist project: no phaselist/ directory found (try `pl init`)")]
    NotAProject,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse project.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the project by walking up from the given directory,
/// looking for a `phaselist/` subdirectory with a project.toml.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR);
        if data_dir.is_dir() && data_dir.join("project.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Read and parse `phaselist/project.toml`
pub fn read_config(data_dir: &Path) -> Result<ProjectConfig, ProjectError> {
    let config_path = data_dir.join("project.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&config_text)?)
}

/// Load the project config and checklist definition from the given root.
///
/// Checklist lines the parser had to drop are recorded in the recovery log.
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }

    let config = read_config(&data_dir)?;

    let checklist_path = data_dir.join(&config.project.checklist);
    let checklist_text =
        fs::read_to_string(&checklist_path).map_err(|e| ProjectError::ReadError {
            path: checklist_path.clone(),
            source: e,
        })?;
    let (checklist, dropped) = parse_checklist(&checklist_text);
    if !dropped.is_empty() {
        log_recovery(
            &data_dir,
            RecoveryEntry::new(RecoveryCategory::Parser, "dropped checklist lines")
                .field("Source", config.project.checklist.clone())
                .body(dropped.join("\n")),
        );
    }

    Ok(Project {
        root: root.to_path_buf(),
        data_dir,
        config,
        checklist,
    })
}

/// Open the project's key/value storage.
///
/// Never fails: an unreadable or corrupt storage file is preserved in the
/// recovery log and the project starts from an empty store.
pub fn open_storage(project: &Project) -> FileStore {
    let path = project.storage_path();
    match FileStore::open(&path) {
        Ok(store) => store,
        Err(e) => {
            let raw = match &e {
                StorageError::Corrupt { .. } => fs::read_to_string(&path).unwrap_or_default(),
                _ => String::new(),
            };
            log_recovery(
                &project.data_dir,
                RecoveryEntry::new(RecoveryCategory::Storage, "storage unreadable, starting empty")
                    .field("Source", project.config.storage.file.clone())
                    .field("Error", e.to_string())
                    .body(raw),
            );
            FileStore::empty(&path)
        }
    }
}
