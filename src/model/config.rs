use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from project.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    /// Checklist definition, relative to `phaselist/`
    #[serde(default = "default_checklist")]
    pub checklist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key/value storage file, relative to `phaselist/`
    #[serde(default = "default_storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: default_storage_file(),
        }
    }
}

fn default_checklist() -> String {
    "checklist.md".to_string()
}

fn default_storage_file() -> String {
    ".storage.json".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Color overrides for the dark palette (`name = "#RRGGBB"`)
    #[serde(default)]
    pub dark: HashMap<String, String>,
    /// Color overrides for the light palette
    #[serde(default)]
    pub light: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            dark: HashMap::new(),
            light: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ProjectConfig = toml::from_str("[project]\nname = \"launch\"\n").unwrap();
        assert_eq!(config.project.name, "launch");
        assert_eq!(config.project.checklist, "checklist.md");
        assert_eq!(config.storage.file, ".storage.json");
        assert!(config.ui.show_key_hints);
        assert!(config.ui.dark.is_empty());
    }

    #[test]
    fn theme_overrides_parse() {
        let config: ProjectConfig = toml::from_str(
            r##"[project]
name = "x"
checklist = "list.md"

[ui]
show_key_hints = false

[ui.light]
background = "#FAFAFA"
"##,
        )
        .unwrap();
        assert_eq!(config.project.checklist, "list.md");
        assert!(!config.ui.show_key_hints);
        assert_eq!(config.ui.light.get("background").unwrap(), "#FAFAFA");
    }
}
