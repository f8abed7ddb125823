use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;

/// Size past which appending first drops entries older than `PRUNE_AGE_DAYS`
const MAX_LOG_SIZE: u64 = 512 * 1024;

/// Age in days after which `pl recovery prune` drops an entry
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- phaselist recovery log: append-only record of problems phaselist
     worked around (failed writes, unreadable values, dropped lines).
     View with: pl recovery
     Prune old entries: pl recovery prune
     Safe to delete. -->

---
";

const ENTRY_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A storage read or write failed and was skipped
    Storage,
    /// A stored value or checklist line could not be parsed
    Parser,
    /// A full reset failed to commit
    Reset,
}

impl RecoveryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryCategory::Storage => "storage",
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Reset => "reset",
        }
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        [
            RecoveryCategory::Storage,
            RecoveryCategory::Parser,
            RecoveryCategory::Reset,
        ]
        .into_iter()
        .find(|c| c.as_str() == s)
        .ok_or(())
    }
}

/// One problem that was worked around, with optional `Key: value` fields
/// and a raw body (the unreadable value, the dropped lines, the error text).
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn stamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_json(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct EntryJson<'a> {
            timestamp: String,
            category: &'static str,
            description: &'a str,
            fields: serde_json::Map<String, serde_json::Value>,
            body: &'a str,
        }

        let view = EntryJson {
            timestamp: self.stamp(),
            category: self.category.as_str(),
            description: &self.description,
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
            body: &self.body,
        };
        serde_json::to_value(view).unwrap_or(serde_json::Value::Null)
    }

    /// The entry exactly as it appears in the log file
    pub fn to_display_markdown(&self) -> String {
        self.to_string()
    }
}

/// Markdown block: `## <time> <category>: <description>`, fields, fenced body
impl fmt::Display for RecoveryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} {}: {}", self.stamp(), self.category, self.description)?;
        writeln!(f)?;
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }
        if !self.body.is_empty() {
            writeln!(f)?;
            writeln!(f, "```text")?;
            writeln!(f, "{}", self.body.trim_end_matches('\n'))?;
            writeln!(f, "```")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", ENTRY_SEPARATOR)
    }
}

#[derive(Debug, Clone)]
pub struct RecoverySummary {
    pub entry_count: usize,
    pub oldest: Option<DateTime<Utc>>,
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Replace `path` with `content` via a sibling temp file and rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append an entry. Failures only produce a stderr warning.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(data_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);
    let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    if size > MAX_LOG_SIZE {
        let mut entries = load_entries(&path)?;
        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        entries.retain(|e| e.timestamp >= cutoff);
        write_log(&path, &entries)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if file.metadata()?.len() == 0 {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_string().as_bytes())
}

/// Entries in log order (oldest first). A missing file has none.
fn load_entries(path: &Path) -> io::Result<Vec<RecoveryEntry>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_log(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn write_log(path: &Path, entries: &[RecoveryEntry]) -> io::Result<()> {
    let mut content = String::from(FILE_HEADER);
    for entry in entries {
        content.push_str(&entry.to_string());
    }
    atomic_write(path, content.as_bytes())
}

/// Most recent first, at most `limit` entries. Unreadable logs read as empty.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let mut entries = load_entries(&recovery_log_path(data_dir)).unwrap_or_default();
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

pub fn recovery_summary(data_dir: &Path) -> Option<RecoverySummary> {
    let entries = load_entries(&recovery_log_path(data_dir)).ok()?;
    let oldest = entries.iter().map(|e| e.timestamp).min()?;
    Some(RecoverySummary {
        entry_count: entries.len(),
        oldest: Some(oldest),
    })
}

/// Drop every entry (`all`) or those older than `before` (default: older
/// than `PRUNE_AGE_DAYS`). Returns how many were removed.
pub fn prune_recovery(
    data_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    if !path.exists() {
        return Ok(0);
    }
    let mut entries = load_entries(&path)?;
    let original = entries.len();
    if all {
        entries.clear();
    } else {
        let cutoff =
            before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
        entries.retain(|e| e.timestamp >= cutoff);
    }
    write_log(&path, &entries)?;
    Ok(original - entries.len())
}

/// Split the log into `## ` blocks and parse each one. Text before the
/// first block (the file header) and blocks with a bad heading are skipped.
fn parse_log(content: &str) -> Vec<RecoveryEntry> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut in_fence = false;
    for line in content.lines() {
        if !in_fence && line.starts_with("## ") {
            blocks.push(vec![line]);
            continue;
        }
        if line.starts_with("```") {
            in_fence = !in_fence;
        }
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks.iter().filter_map(|b| parse_block(b)).collect()
}

fn parse_block(lines: &[&str]) -> Option<RecoveryEntry> {
    let (heading, rest) = lines.split_first()?;
    let heading = heading.strip_prefix("## ")?;
    let (stamp, rest_of_heading) = heading.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
    let (category, description) = rest_of_heading.split_once(": ")?;

    let mut entry = RecoveryEntry {
        timestamp,
        category: category.parse().ok()?,
        description: description.to_string(),
        fields: Vec::new(),
        body: String::new(),
    };

    let mut body: Option<Vec<&str>> = None;
    for &line in rest {
        match body.as_mut() {
            Some(acc) if line == "```" => {
                entry.body = acc.join("\n");
                body = None;
            }
            Some(acc) => acc.push(line),
            None if line.starts_with("```") => body = Some(Vec::new()),
            None if line == ENTRY_SEPARATOR => break,
            None => {
                if let Some((k, v)) = line.trim().split_once(": ") {
                    entry.fields.push((k.to_string(), v.to_string()));
                }
            }
        }
    }
    Some(entry)
}
