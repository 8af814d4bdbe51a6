// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: mock backends, token builders, assertions.

use std::net::SocketAddr;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use tokio::net::TcpListener;

use crate::session::SessionStore;
use crate::toast::ToastStore;

/// Build an unsigned token whose payload carries `sub` and optional `exp`.
pub fn make_token(sub: &str, exp: Option<i64>) -> String {
    let payload = match exp {
        Some(exp) => json!({ "sub": sub, "exp": exp }),
        None => json!({ "sub": sub }),
    };
    format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

/// Token that expired at the epoch.
pub fn expired_token(sub: &str) -> String {
    make_token(sub, Some(1))
}

/// Token that expires in the far future.
pub fn fresh_token(sub: &str) -> String {
    make_token(sub, Some(4_102_444_800))
}

/// HTTP client with the crypto provider installed.
pub fn http_client() -> reqwest::Client {
    crate::ensure_crypto();
    reqwest::Client::new()
}

/// Serve `router` on a random local port.
pub async fn spawn_router(router: axum::Router) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// In-memory session pointed at `addr`, plus a fresh toast store.
pub fn session_for(addr: SocketAddr) -> (Arc<SessionStore>, Arc<ToastStore>) {
    let session = Arc::new(SessionStore::in_memory(format!("http://{addr}")));
    (session, Arc::new(ToastStore::new()))
}

#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
