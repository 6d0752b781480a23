#![doc = include_str!("../README.md")]

use std::path::{Path, PathBuf};

use dbyaml::DatabaseTemplate;
use serde::Deserialize;

const CONFIG_FILENAME: &str = "dbyaml.toml";
const DEFAULT_DATABASE_FILE: &str = "config/database.yml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Path to `database.yml`, relative to the directory holding `dbyaml.toml`.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Databases to add when none are named on the command line.
    #[serde(default)]
    pub databases: Vec<String>,

    /// Anchor of the shared block new databases merge from.
    #[serde(default)]
    pub default_anchor: Option<String>,

    /// Migrations directory pattern for new databases.
    #[serde(default)]
    pub migrations_paths: Option<String>,

    /// Database path pattern for new databases.
    #[serde(default)]
    pub database: Option<String>,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// The `database.yml` to edit, resolved against the config's directory
    /// (or `base` when no config file was found).
    pub fn database_file(&self, base: &Path) -> PathBuf {
        let file = self
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE));
        if file.is_absolute() {
            return file;
        }
        self.dir.as_deref().unwrap_or(base).join(file)
    }

    /// The template for new database blocks, with unset keys at their defaults.
    pub fn template(&self) -> DatabaseTemplate {
        let defaults = DatabaseTemplate::default();
        DatabaseTemplate {
            default_anchor: self.default_anchor.clone().unwrap_or(defaults.default_anchor),
            migrations_paths: self
                .migrations_paths
                .clone()
                .unwrap_or(defaults.migrations_paths),
            database: self.database.clone().unwrap_or(defaults.database),
        }
    }
}

/// Find the nearest `dbyaml.toml` starting from `start_dir`, walking upward.
/// Returns the path to `dbyaml.toml`, or `None` if not found.
pub fn find_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Load the nearest `dbyaml.toml` above `start_dir`, if there is one.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn find_and_load(start_dir: &Path) -> Result<Option<Config>, anyhow::Error> {
    let Some(path) = find_config_path(start_dir) else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(&path)?;
    let mut config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    config.dir = path.parent().map(Path::to_path_buf);
    Ok(Some(config))
}

/// Load config from the current working directory (walking upward).
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load() -> Result<Config, anyhow::Error> {
    let cwd = std::env::current_dir()?;
    Ok(find_and_load(&cwd)?.unwrap_or_default())
}
