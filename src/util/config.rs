//! Preset configuration.
//!
//! Presets are `KEY=VALUE` overrides that take precedence over every
//! computed default. They are collected from (lowest to highest precedence):
//! - Global: `~/.tcconf/presets.toml` - User-wide defaults
//! - Project: `<source-root>/.tcconf/presets.toml` - Project-specific overrides
//! - An explicit `--presets-file`
//! - `-D KEY=VALUE` command line flags
//!
//! Preset files hold a single `[presets]` table of string values.

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::diagnostic::{self, Diagnostic};

/// Flag presets that are folded into their `USER_` counterparts.
const USERIFIED: [&str; 3] = ["CFLAGS", "CXXFLAGS", "CONLYFLAGS"];

/// An ordered map of preset overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presets {
    values: BTreeMap<String, String>,
}

impl Presets {
    /// Create an empty preset map.
    pub fn new() -> Self {
        Presets::default()
    }

    /// Parse `-D` arguments. A bare `KEY` means the empty string.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut presets = Presets::new();
        for arg in args {
            let (key, value) = match arg.as_ref().split_once('=') {
                Some((key, value)) => (key, value),
                None => (arg.as_ref(), ""),
            };
            presets.set(key, value);
        }
        presets
    }

    /// Set a preset.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Merge another preset map into this one (other takes precedence).
    pub fn merge(&mut self, other: Presets) {
        self.values.extend(other.values);
    }

    /// Fold `CFLAGS`, `CXXFLAGS` and `CONLYFLAGS` into `USER_*` presets.
    ///
    /// The plain value comes first, followed by any existing `USER_` value.
    /// The `USER_` keys are always defined afterwards.
    pub fn userify(&mut self) {
        for key in USERIFIED {
            let user_key = format!("USER_{}", key);
            let plain = self.values.remove(key);
            let user = self.values.get(&user_key).cloned();

            let joined = [plain, user]
                .into_iter()
                .flatten()
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            self.values.insert(user_key, joined);
        }
    }

    /// Get a preset value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check if a preset is defined at all.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether a preset is `yes`, `true` or `on` (any case).
    pub fn is_positive(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| {
            matches!(v.to_lowercase().as_str(), "yes" | "true" | "on")
        })
    }

    /// Whether a preset is `no`, `false` or `off` (any case).
    pub fn is_negative(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| {
            matches!(v.to_lowercase().as_str(), "no" | "false" | "off")
        })
    }

    /// Whether a preset is defined with a non-empty value.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| !v.is_empty())
    }

    /// Iterate presets in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// On-disk preset file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresetsFile {
    pub presets: BTreeMap<String, String>,
}

impl PresetsFile {
    /// Load a preset file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read presets file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse presets file: {}", path.display()))
    }

    /// Load a preset file, falling back to an empty one if it is missing or
    /// unreadable. An unreadable file is reported as a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            diagnostic::emit(&skipped_file_warning(path, &e), std::io::stderr().is_terminal());
            Self::default()
        })
    }

    /// Convert into a preset map.
    pub fn into_presets(self) -> Presets {
        Presets {
            values: self.presets,
        }
    }
}

fn skipped_file_warning(path: &Path, err: &anyhow::Error) -> Diagnostic {
    Diagnostic::warning("ignoring unreadable presets file")
        .with_location(path)
        .with_context(format!("{:#}", err))
}

/// Collect presets from every source in precedence order.
///
/// An explicit presets file must load; the global and project files are
/// optional.
pub fn load_presets(
    global_path: Option<&Path>,
    project_path: &Path,
    explicit_path: Option<&Path>,
    cli: Presets,
) -> Result<Presets> {
    let mut presets = Presets::new();

    if let Some(global_path) = global_path {
        presets.merge(PresetsFile::load_or_default(global_path).into_presets());
    }

    presets.merge(PresetsFile::load_or_default(project_path).into_presets());

    if let Some(explicit_path) = explicit_path {
        presets.merge(PresetsFile::load(explicit_path)?.into_presets());
    }

    presets.merge(cli);
    presets.userify();

    Ok(presets)
}

/// Get the global tcconf config directory (~/.tcconf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tcconf"))
}

/// Get the global presets path (~/.tcconf/presets.toml).
pub fn global_presets_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("presets.toml"))
}

/// Get the project presets path (.tcconf/presets.toml).
pub fn project_presets_path(source_root: &Path) -> PathBuf {
    source_root.join(".tcconf").join("presets.toml")
}
