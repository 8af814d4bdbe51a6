// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session persistence: load/save the durable session record with atomic writes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the durable session record.
pub const RECORD_NAME: &str = "mealpilot.session";

/// The durable subset of session state. Derived token fields are never stored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub enable_refresh: bool,
}

/// Resolve the state directory.
///
/// Checks `MEALPILOT_STATE_DIR`, then `$XDG_STATE_HOME/mealpilot`,
/// then `$HOME/.local/state/mealpilot`.
pub fn state_dir() -> PathBuf {
    state_dir_with(|name| std::env::var(name).ok())
}

/// [`state_dir`] with an injectable env lookup.
pub fn state_dir_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = env("MEALPILOT_STATE_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = env("XDG_STATE_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(xdg).join("mealpilot");
    }
    if let Some(home) = env("HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(home).join(".local/state/mealpilot");
    }
    PathBuf::from(".mealpilot")
}

/// Path of the session record inside `dir`.
pub fn record_path(dir: &Path) -> PathBuf {
    dir.join(format!("{RECORD_NAME}.json"))
}

/// Load the session record. A missing file is `Ok(None)` (first run).
pub fn load(path: &Path) -> anyhow::Result<Option<PersistedSession>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let session: PersistedSession = serde_json::from_str(&contents)?;
    Ok(Some(session))
}

/// Write the session record.
///
/// The record holds the access and refresh tokens, so readers must never see
/// a half-written file: the JSON goes to a sibling `<record>.<uuid>.tmp`,
/// is flushed to disk, and only then renamed over the record.
pub fn save(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let body = serde_json::to_vec_pretty(session)?;
    let tmp_path = dir.join(format!("{RECORD_NAME}.{}.tmp", uuid::Uuid::new_v4().simple()));
    let written = write_synced(&tmp_path, &body).and_then(|()| std::fs::rename(&tmp_path, path));
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    Ok(written?)
}

fn write_synced(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    file.write_all(body)?;
    file.sync_all()
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
