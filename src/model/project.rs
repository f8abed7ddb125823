use std::path::PathBuf;

use super::checklist::Checklist;
use super::config::ProjectConfig;

/// A fully loaded phaselist project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of `phaselist/`)
    pub root: PathBuf,
    /// Path to the `phaselist/` directory
    pub data_dir: PathBuf,
    /// Parsed project.toml
    pub config: ProjectConfig,
    /// Parsed checklist definition
    pub checklist: Checklist,
}

impl Project {
    /// Absolute path of the key/value storage file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.storage.file)
    }
}
