// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::command::Command;
use crate::persist;
use crate::session::ApiBaseHints;

/// Command-line client for the MealPilot API.
#[derive(Debug, Parser)]
#[command(name = "mealpilot", version, about)]
pub struct Config {
    /// Backend base URL (overrides the stored one for first-run defaults).
    #[arg(long, global = true, env = "MEALPILOT_API_BASE")]
    pub api_base: Option<String>,

    /// Origin the client is served from, used to guess the backend.
    #[arg(long, global = true, env = "MEALPILOT_ORIGIN")]
    pub origin: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, global = true, env = "MEALPILOT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Per-request timeout in milliseconds (0 disables).
    #[arg(long, global = true, env = "MEALPILOT_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, global = true, env = "MEALPILOT_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "MEALPILOT_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.log_format.as_str(), "json" | "text") {
            anyhow::bail!("invalid log format: {} (expected json or text)", self.log_format);
        }
        if let Some(ref base) = self.api_base {
            let url = reqwest::Url::parse(base)
                .map_err(|e| anyhow::anyhow!("invalid --api-base {base:?}: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("--api-base must be an http(s) URL");
            }
        }
        Ok(())
    }

    /// Request timeout; `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn api_base_hints(&self) -> ApiBaseHints {
        ApiBaseHints { configured: self.api_base.clone(), origin: self.origin.clone() }
    }

    /// Path of the persisted session record.
    pub fn record_path(&self) -> PathBuf {
        let dir = self.state_dir.clone().unwrap_or_else(persist::state_dir);
        persist::record_path(&dir)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
