// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing notifications.
//!
//! The request pipeline pushes warnings here when a session is lost; a front
//! end drains or renders them. Observers get each pushed toast on a
//! broadcast channel.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::epoch_ms;

/// Display time for toasts that don't specify one.
pub const DEFAULT_DURATION_MS: u64 = 3500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pushed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    pub created_at_ms: i64,
    pub duration_ms: u64,
}

/// What a caller supplies to [`ToastStore::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToast {
    pub kind: ToastKind,
    pub title: Option<String>,
    pub message: String,
    pub duration_ms: Option<u64>,
}

impl NewToast {
    pub fn warning(title: &str, message: &str) -> Self {
        Self {
            kind: ToastKind::Warning,
            title: Some(title.to_owned()),
            message: message.to_owned(),
            duration_ms: None,
        }
    }

    /// Pushed when an expired session cannot be renewed.
    pub fn session_expired() -> Self {
        Self::warning("Session expired", "Please log in again.")
    }

    /// Pushed when the backend rejects the current token.
    pub fn logged_out() -> Self {
        Self::warning("Logged out", "Your session is no longer valid. Please log in again.")
    }
}

/// Ordered list of live toasts.
pub struct ToastStore {
    toasts: Mutex<Vec<Toast>>,
    event_tx: broadcast::Sender<Toast>,
}

impl Default for ToastStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastStore {
    pub fn new() -> Self {
        let (event_tx, _rx) = broadcast::channel(64);
        Self { toasts: Mutex::new(Vec::new()), event_tx }
    }

    /// Append a toast and return its id.
    pub fn push(&self, new: NewToast) -> String {
        let toast = Toast {
            id: uuid::Uuid::new_v4().to_string(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            created_at_ms: epoch_ms(),
            duration_ms: new.duration_ms.unwrap_or(DEFAULT_DURATION_MS),
        };
        let id = toast.id.clone();
        self.toasts.lock().push(toast.clone());
        // No receivers is fine.
        let _ = self.event_tx.send(toast);
        id
    }

    pub fn remove(&self, id: &str) {
        self.toasts.lock().retain(|t| t.id != id);
    }

    pub fn clear(&self) {
        self.toasts.lock().clear();
    }

    /// Current toasts, oldest first.
    pub fn list(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    /// Receive every toast pushed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
#[path = "toast_tests.rs"]
mod tests;
