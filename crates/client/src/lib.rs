// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MealPilot client: session state and the authenticated request pipeline.

pub mod api;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod expiry;
pub mod persist;
pub mod session;
pub mod toast;
pub mod token;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{ApiClient, TokenResolution};
pub use error::{ApiError, RefreshError, RequestError};
pub use session::{SessionState, SessionStore};
pub use toast::{Toast, ToastStore};

static CRYPTO_INIT: std::sync::Once = std::sync::Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
