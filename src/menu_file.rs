//! TOML menu definition (`~/.config/vtmenu/menu.toml`).
//!
//! ```toml
//! title = "Main Menu"
//!
//! [[entry]]
//! title = "Greet someone"
//! cmd = "echo hello $1"
//! params = { "$1" = "NAME" }
//! ```
//!
//! Entries keep file order; that order is the selection numbering.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::template::Entry;

const MENU_FILE: &str = "menu.toml";
const CONFIG_DIR_ENV: &str = "VTMENU_CONFIG_DIR";
const DEFAULT_CMD: &str = "/bin/true";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuFileError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for MenuFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Parse(msg) => write!(f, "TOML parse error: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid menu: {msg}"),
        }
    }
}

impl std::error::Error for MenuFileError {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "entry")]
    pub entries: Vec<MenuFileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuFileEntry {
    pub title: String,
    #[serde(default = "default_cmd")]
    pub cmd: String,
    /// Placeholder token (`"$1"`, `"$*"`) to display label.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

fn default_cmd() -> String {
    DEFAULT_CMD.to_string()
}

fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::config_dir().map(|dir| dir.join("vtmenu"))
}

/// Where the menu is read from when `--settings` is not given.
#[must_use]
pub fn default_menu_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(MENU_FILE))
}

/// Parse menu TOML.
///
/// # Errors
///
/// Returns `Parse` for malformed TOML or unknown keys, and `Invalid` for an
/// entry without a title.
pub fn parse_menu_file(content: &str) -> Result<MenuFile, MenuFileError> {
    let file = toml::from_str::<MenuFile>(content).map_err(|e| MenuFileError::Parse(e.to_string()))?;
    if let Some(position) = file.entries.iter().position(|entry| entry.title.trim().is_empty()) {
        return Err(MenuFileError::Invalid(format!(
            "entry {} has an empty title",
            position + 1
        )));
    }
    Ok(file)
}

/// Read and parse the menu file at `path`.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, otherwise as [`parse_menu_file`].
pub fn load_menu_file(path: &Path) -> Result<MenuFile, MenuFileError> {
    let content = std::fs::read_to_string(path).map_err(|e| MenuFileError::Io(e.to_string()))?;
    parse_menu_file(&content)
}

impl MenuFile {
    /// Build menu entries in file order. Label keys that are not `$` tokens
    /// are skipped.
    #[must_use]
    pub fn to_entries(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .map(|entry| {
                let mut labels = BTreeMap::new();
                for (token, label) in &entry.params {
                    if token.starts_with('$') {
                        labels.insert(token.clone(), label.clone());
                    } else {
                        tracing::warn!(entry = %entry.title, key = %token, "ignoring param label without `$`");
                    }
                }
                Entry::new(entry.title.clone(), entry.cmd.clone(), &labels)
            })
            .collect()
    }
}
