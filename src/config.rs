//! User configuration and data directory resolution.
//!
//! Everything lives in one data directory: `$TIMEBOX_DIR` when set, otherwise
//! `~/.timebox`. It holds the task store (`tasks.json`) and an optional
//! `config.toml`:
//!
//! ```toml
//! user = "ana"
//! display_name = "Ana"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

pub const DATA_DIR_ENV: &str = "TIMEBOX_DIR";
pub const CONFIG_FILE: &str = "config.toml";
pub const STORE_FILE: &str = "tasks.json";

/// Owner id used when nothing else names one.
const FALLBACK_USER: &str = "me";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Owner id stamped on every task this user creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Config {
    /// Load `config.toml` from the data directory; a missing file is the default config.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&path)?;
        let config = toml::from_str(&raw)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        let raw = toml::to_string_pretty(self)?;
        fs::write(data_dir.join(CONFIG_FILE), raw)?;
        Ok(())
    }

    /// Resolve the acting user: explicit flag, then config, then `$USER`.
    pub fn resolve_user(&self, flag: Option<&str>) -> String {
        fn non_blank(s: Option<String>) -> Option<String> {
            s.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
        }
        non_blank(flag.map(str::to_string))
            .or_else(|| non_blank(self.user.clone()))
            .or_else(|| non_blank(std::env::var("USER").ok()))
            .unwrap_or_else(|| FALLBACK_USER.to_string())
    }

    /// Name to greet the user with.
    pub fn display_name<'a>(&'a self, user: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(user)
    }
}

/// Resolve the data directory from the environment.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".timebox")
}
