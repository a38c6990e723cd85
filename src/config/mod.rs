use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{FeederError, FeederResult};

pub const DEFAULT_OUTPUT_DIR: &str = "feeds";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            user_agent: concat!("feedgen/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeederResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let output_dir = std::env::var("FEEDGEN_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let user_agent = std::env::var("FEEDGEN_USER_AGENT").unwrap_or(defaults.user_agent);

        let timeout_secs = match std::env::var("FEEDGEN_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| FeederError::Env {
                name: "FEEDGEN_TIMEOUT_SECS",
                reason: format!("'{}' is not a whole number of seconds", raw),
            })?,
            Err(_) => defaults.timeout_secs,
        };

        Ok(Self {
            output_dir,
            user_agent,
            timeout_secs,
        })
    }
}

/// Read a site configuration record. Validation happens in the resolver.
pub fn read_site_config(path: &Path) -> FeederResult<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
