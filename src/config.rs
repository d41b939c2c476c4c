// src/config.rs
//! Process-wide path configuration: the data root holding durable run
//! artifacts and the repository root used to resolve relative CLI paths.
//!
//! Built once in `main` and threaded explicitly through every path
//! resolution call; nothing below this module reads the environment.

use std::env;
use std::path::{Path, PathBuf};

pub const APP_DATA_DIR_NAME: &str = "IdeaScreener";
pub const ENV_DATA_ROOT: &str = "IDEA_SCREENER_DATA_DIR";
pub const ENV_APP_ROOT: &str = "IDEA_SCREENER_APP_ROOT";

/// Path segment naming the per-run artifact directory under the data root.
/// Run ids are extracted from paths by locating this marker.
pub const IDEA_SCREENS_DIR_NAME: &str = "idea-screens";
pub const PREFERENCES_FILENAME: &str = "screener-preferences.toml";

/// Marker subpath that identifies the repository root when walking upward.
const REPO_MARKER_RELATIVE_PATH: &str = ".agents/skills";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Repository root for resolving relative CLI paths.
    pub base_dir: PathBuf,
    /// Root for durable app data (run directories, the preference document).
    pub data_root: PathBuf,
}

impl AppConfig {
    /// Build from the environment: `IDEA_SCREENER_DATA_DIR` /
    /// `IDEA_SCREENER_APP_ROOT` first, then OS defaults.
    pub fn from_env() -> Self {
        Self {
            base_dir: detect_repo_root(),
            data_root: resolve_data_root(),
        }
    }

    /// Resolve a user-supplied path: `~` expanded, relative paths joined
    /// onto the base dir.
    pub fn resolve_path(&self, value: &str) -> PathBuf {
        let path = expand_user(value);
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    /// Render a path relative to the base dir for display
    /// (`<base name>/<relative>`); paths outside the base are shown as-is.
    pub fn scoped_path(&self, path: &Path) -> String {
        let base_name = self
            .base_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.base_dir.display().to_string());
        match path.strip_prefix(&self.base_dir) {
            Ok(rel) if rel.as_os_str().is_empty() => base_name,
            Ok(rel) => format!("{}/{}", base_name, rel.display()),
            Err(_) => path.display().to_string(),
        }
    }

    pub fn idea_screens_root(&self) -> PathBuf {
        self.data_root.join(IDEA_SCREENS_DIR_NAME)
    }

    pub fn default_preferences_path(&self) -> PathBuf {
        self.data_root.join(PREFERENCES_FILENAME)
    }
}

fn expand_user(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

fn resolve_against_cwd(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
    }
}

/// Data root: env override first, else the OS data directory
/// (`%APPDATA%`, `~/Library/Application Support`, `$XDG_DATA_HOME`).
fn resolve_data_root() -> PathBuf {
    if let Ok(configured) = env::var(ENV_DATA_ROOT) {
        let trimmed = configured.trim();
        if !trimmed.is_empty() {
            return resolve_against_cwd(expand_user(trimmed));
        }
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DATA_DIR_NAME)
}

/// Repository root: env override if it exists, else the nearest ancestor of
/// the working directory carrying the marker subpath, else the working
/// directory itself.
fn detect_repo_root() -> PathBuf {
    if let Ok(configured) = env::var(ENV_APP_ROOT) {
        let trimmed = configured.trim();
        if !trimmed.is_empty() {
            let path = resolve_against_cwd(expand_user(trimmed));
            if path.exists() {
                return path;
            }
        }
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut candidate = cwd.as_path();
    loop {
        if candidate.join(REPO_MARKER_RELATIVE_PATH).exists() {
            return candidate.to_path_buf();
        }
        match candidate.parent() {
            Some(parent) => candidate = parent,
            None => break,
        }
    }
    cwd
}
