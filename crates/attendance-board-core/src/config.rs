//! Board configuration.
//!
//! Loaded from JSON, then overridden from the environment:
//!
//! | variable                            | field              |
//! |-------------------------------------|--------------------|
//! | `ATTENDANCE_BOARD_DB`               | `database_path`    |
//! | `ATTENDANCE_BOARD_ALLOW_STEP_BACK`  | `allow_step_back`  |
//! | `ATTENDANCE_BOARD_LOG_FILTER`       | `logging.filter`   |
//! | `ATTENDANCE_BOARD_LOG_JSON`         | `logging.json`     |

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// SQLite file; `None` keeps everything in memory
    pub database_path: Option<PathBuf>,
    /// Allow the single-step undo drag
    pub allow_step_back: bool,
    pub logging: LoggingConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            allow_step_back: true,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl BoardConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid board configuration")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("ATTENDANCE_BOARD_DB") {
            self.database_path = match path.trim() {
                "" | ":memory:" => None,
                p => Some(PathBuf::from(p)),
            };
        }
        if let Some(flag) = lookup("ATTENDANCE_BOARD_ALLOW_STEP_BACK").and_then(|v| parse_bool(&v)) {
            self.allow_step_back = flag;
        }
        if let Some(filter) = lookup("ATTENDANCE_BOARD_LOG_FILTER") {
            self.logging.filter = filter;
        }
        if let Some(json) = lookup("ATTENDANCE_BOARD_LOG_JSON").and_then(|v| parse_bool(&v)) {
            self.logging.json = json;
        }
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
