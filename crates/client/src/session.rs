// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state: backend base URL, access/refresh tokens, and the derived
//! token fields the request pipeline decides on.
//!
//! The store is an explicit context object shared by `Arc`. Readers take a
//! [`SessionState`] snapshot by value; observers subscribe through a
//! `watch` channel. Every mutation writes through to the durable record
//! when a path is configured.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::warn;

use crate::persist::{self, PersistedSession};
use crate::token;

/// Base used when nothing better is known.
pub const FALLBACK_API_BASE: &str = "http://localhost:9000";

/// Port the web UI dev server runs on; its API lives on the fallback base.
const DEV_UI_PORT: u16 = 5173;

/// Wall clock in epoch milliseconds.
pub type Clock = fn() -> i64;

/// Return current epoch millis.
pub fn epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Inputs to the default API base heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiBaseHints {
    /// Explicitly configured base.
    pub configured: Option<String>,
    /// Origin the client is served from, if any.
    pub origin: Option<String>,
}

/// Pick the API base: configured value, then the dev-server convention,
/// then the serving origin, then [`FALLBACK_API_BASE`].
pub fn default_api_base(hints: &ApiBaseHints) -> String {
    if let Some(base) = hints.configured.as_deref().filter(|b| !b.trim().is_empty()) {
        return base.to_owned();
    }
    if let Some(origin) = hints.origin.as_deref().filter(|o| !o.trim().is_empty()) {
        let port = reqwest::Url::parse(origin).ok().and_then(|u| u.port());
        if port == Some(DEV_UI_PORT) {
            return FALLBACK_API_BASE.to_owned();
        }
        return origin.to_owned();
    }
    FALLBACK_API_BASE.to_owned()
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub api_base: String,
    /// Sanitized access token; empty when logged out.
    pub token: String,
    pub refresh_token: String,
    pub enable_refresh: bool,

    pub has_token: bool,
    pub token_expires_at_ms: Option<i64>,
    pub is_token_expired: bool,
}

impl SessionState {
    /// Subject claim of the current token.
    pub fn subject(&self) -> Option<String> {
        token::subject(&self.token)
    }

    /// The durable subset of this state.
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            api_base: self.api_base.clone(),
            token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            enable_refresh: self.enable_refresh,
        }
    }

    fn apply_token(&mut self, raw: &str, now_ms: i64) {
        let token = token::sanitize(raw);
        if token.is_empty() {
            self.clear_token();
            return;
        }
        let expires_at = token::expires_at_ms(&token);
        self.token = token;
        self.has_token = true;
        self.token_expires_at_ms = expires_at;
        self.is_token_expired = expires_at.is_some_and(|exp| now_ms >= exp);
    }

    fn clear_token(&mut self) {
        self.token.clear();
        self.has_token = false;
        self.token_expires_at_ms = None;
        self.is_token_expired = false;
    }
}

/// Process-wide session store.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    hints: ApiBaseHints,
    persist_path: Option<PathBuf>,
    clock: Clock,
}

impl SessionStore {
    /// Fresh first-run session. Writes through to `persist_path` if given.
    pub fn new(hints: ApiBaseHints, persist_path: Option<PathBuf>) -> Self {
        let initial = SessionState { api_base: default_api_base(&hints), ..SessionState::default() };
        let (state, _rx) = watch::channel(initial);
        Self { state, hints, persist_path, clock: epoch_ms }
    }

    /// Non-persistent session pointed at `api_base`.
    pub fn in_memory(api_base: impl Into<String>) -> Self {
        let hints = ApiBaseHints { configured: Some(api_base.into()), origin: None };
        Self::new(hints, None)
    }

    /// Restore from the durable record at `path`, falling back to first-run
    /// defaults when it is missing or unreadable.
    ///
    /// Derived token fields are recomputed before this returns, so a token
    /// that expired while the process was down is already flagged.
    pub fn restore(hints: ApiBaseHints, path: PathBuf) -> Self {
        Self::restore_with_clock(hints, path, epoch_ms)
    }

    pub fn restore_with_clock(hints: ApiBaseHints, path: PathBuf, clock: Clock) -> Self {
        let record = match persist::load(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), err = %e, "ignoring unreadable session record");
                None
            }
        };
        let store = Self::new(hints, Some(path)).with_clock(clock);
        if let Some(record) = record {
            let now = (store.clock)();
            store.state.send_modify(|s| {
                s.api_base = record.api_base;
                s.refresh_token = record.refresh_token;
                s.enable_refresh = record.enable_refresh;
                s.apply_token(&record.token, now);
            });
        }
        store
    }

    /// Replace the clock used for expiry checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current state by value.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe every subsequent mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn now_ms(&self) -> i64 {
        (self.clock)()
    }

    pub fn set_api_base(&self, next: impl Into<String>) {
        let next = next.into();
        self.update(|s| s.api_base = next);
    }

    /// Sanitize and store a token, recomputing the derived fields.
    pub fn set_token(&self, next: &str) {
        let now = self.now_ms();
        self.update(|s| s.apply_token(next, now));
    }

    pub fn set_refresh_token(&self, next: impl Into<String>) {
        let next = next.into();
        self.update(|s| s.refresh_token = next);
    }

    pub fn set_enable_refresh(&self, next: bool) {
        self.update(|s| s.enable_refresh = next);
    }

    /// Drop the access token. The refresh token is left in place.
    pub fn logout(&self) {
        self.update(SessionState::clear_token);
    }

    /// Re-evaluate the expiry flag against the clock.
    ///
    /// Only ever flips the flag on; returns whether the token is expired now.
    pub fn recheck_expiry(&self) -> bool {
        let now = self.now_ms();
        let flipped = self.state.send_if_modified(|s| {
            let due = s.has_token
                && !s.is_token_expired
                && s.token_expires_at_ms.is_some_and(|exp| now >= exp);
            if due {
                s.is_token_expired = true;
            }
            due
        });
        flipped || self.state.borrow().is_token_expired
    }

    /// Fill in the API base if it is empty. Idempotent.
    pub fn ensure_defaults(&self) {
        if !self.state.borrow().api_base.is_empty() {
            return;
        }
        let base = default_api_base(&self.hints);
        self.update(|s| {
            if s.api_base.is_empty() {
                s.api_base = base;
            }
        });
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(f);
        self.persist();
    }

    fn persist(&self) {
        let Some(ref path) = self.persist_path else {
            return;
        };
        let record = self.state.borrow().persisted();
        if let Err(e) = persist::save(path, &record) {
            warn!(path = %path.display(), err = %e, "failed to persist session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
