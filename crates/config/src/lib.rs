//! # Config - runtime settings for the metadata editor
//!
//! Every setting comes from an environment variable with a per-OS default:
//!
//! ```text
//! STEAMMETA_STEAM_PATH   Steam install directory   (default: see below)
//! STEAMMETA_CONFIG_DIR   editor config directory   (default: see below)
//! STEAMMETA_SILENT       re-apply journal and exit (default: "false")
//! STEAMMETA_EXPORT       journal these app ids and exit, e.g. "10,440"
//! STEAMMETA_LOG          tracing filter directive  (default: "warn")
//! ```
//!
//! | OS      | Steam directory                          | config directory                                |
//! |---------|------------------------------------------|-------------------------------------------------|
//! | Linux   | `~/.local/share/Steam`                   | `~/.local/share/Steam-Metadata-Editor/config`   |
//! | macOS   | `~/Library/Application Support/Steam`    | `~/.local/share/Steam-Metadata-Editor/config`   |
//! | Windows | `C:\Program Files (x86)\Steam`           | `config` (relative to the working directory)    |

use std::num::ParseIntError;
use std::path::{Path, PathBuf};

pub const ENV_STEAM_PATH: &str = "STEAMMETA_STEAM_PATH";
pub const ENV_CONFIG_DIR: &str = "STEAMMETA_CONFIG_DIR";
pub const ENV_SILENT: &str = "STEAMMETA_SILENT";
pub const ENV_LOG: &str = "STEAMMETA_LOG";
pub const ENV_EXPORT: &str = "STEAMMETA_EXPORT";

/// Filter used when `STEAMMETA_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Name of the modification journal inside the config directory.
pub const MODIFICATIONS_FILENAME: &str = "modifications.json";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub steam_path: PathBuf,
    pub config_dir: PathBuf,
    /// Re-apply the journal to a freshly rewritten cache and exit.
    pub silent: bool,
    pub log_filter: String,
    /// App ids to journal without starting the shell, as given.
    pub export: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let steam_path = var(ENV_STEAM_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_steam_path);
        let config_dir = var(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_config_dir);
        let silent = var(ENV_SILENT).map(|v| parse_bool(&v)).unwrap_or(false);
        let log_filter = var(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let export = var(ENV_EXPORT);

        Self {
            steam_path,
            config_dir,
            silent,
            log_filter,
            export,
        }
    }

    /// The `STEAMMETA_EXPORT` ids, separated by commas or whitespace.
    /// Empty when the variable is unset.
    pub fn export_ids(&self) -> Result<Vec<u32>, ParseIntError> {
        self.export
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|id| !id.is_empty())
            .map(str::parse)
            .collect()
    }

    /// `<steam>/appcache/appinfo.vdf`
    pub fn appinfo_path(&self) -> PathBuf {
        self.steam_path.join("appcache").join("appinfo.vdf")
    }

    /// `<config>/modifications.json`
    pub fn modifications_path(&self) -> PathBuf {
        self.config_dir.join(MODIFICATIONS_FILENAME)
    }

    /// `<steam>/steamapps/libraryfolders.vdf`
    pub fn libraryfolders_path(&self) -> PathBuf {
        self.steam_path.join("steamapps").join("libraryfolders.vdf")
    }

    /// Whether the configured Steam directory holds an appinfo cache.
    pub fn verify_steam_path(&self) -> bool {
        verify_steam_path(&self.steam_path)
    }
}

/// Whether `steam_path/appcache/appinfo.vdf` is a regular file.
pub fn verify_steam_path(steam_path: &Path) -> bool {
    steam_path.join("appcache").join("appinfo.vdf").is_file()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_steam_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files (x86)\Steam")
    } else if cfg!(target_os = "macos") {
        home().join("Library/Application Support/Steam")
    } else {
        home().join(".local/share/Steam")
    }
}

fn default_config_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("config")
    } else {
        home().join(".local/share/Steam-Metadata-Editor/config")
    }
}
