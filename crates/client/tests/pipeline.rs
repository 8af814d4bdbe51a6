// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end: persisted session, refresh, paging, and forced logout against
//! a throwaway backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use mealpilot::client::{build_http, ApiClient};
use mealpilot::persist::{self, PersistedSession};
use mealpilot::session::{ApiBaseHints, SessionStore};
use mealpilot::toast::ToastStore;
use mealpilot::types::ItemQuery;

fn token(sub: &str, exp: i64) -> String {
    let payload = json!({ "sub": sub, "exp": exp }).to_string();
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

/// Backend that accepts exactly one access token at a time.
struct Backend {
    accepted: Mutex<String>,
    issue: String,
    refreshes: AtomicU32,
}

async fn refresh(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.refreshes.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    if body["refreshToken"] != "r1" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad refresh token" })))
            .into_response();
    }
    *backend.accepted.lock() = backend.issue.clone();
    Json(json!({ "accessToken": backend.issue })).into_response()
}

async fn items(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or_default();
    let accepted = backend.accepted.lock().clone();
    if accepted.is_empty() || auth != format!("Bearer {accepted}") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })))
            .into_response();
    }
    (
        [("X-Next-Cursor", "next-1")],
        Json(json!([{ "id": "i1", "name": "Idli", "tags": ["breakfast"], "active": true }])),
    )
        .into_response()
}

async fn spawn(backend: Arc<Backend>) -> anyhow::Result<SocketAddr> {
    let router = Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/items", get(items))
        .with_state(backend);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

#[tokio::test]
async fn restored_expired_session_refreshes_once_then_logs_out_on_revocation(
) -> anyhow::Result<()> {
    let issued = token("erin", 4_102_444_800);
    let backend = Arc::new(Backend {
        accepted: Mutex::new(String::new()),
        issue: issued.clone(),
        refreshes: AtomicU32::new(0),
    });
    let addr = spawn(Arc::clone(&backend)).await?;

    let dir = tempfile::tempdir()?;
    let path = persist::record_path(dir.path());
    persist::save(
        &path,
        &PersistedSession {
            api_base: format!("http://{addr}"),
            token: token("erin", 1),
            refresh_token: "r1".to_owned(),
            enable_refresh: true,
        },
    )?;

    let session = Arc::new(SessionStore::restore(ApiBaseHints::default(), path.clone()));
    session.ensure_defaults();
    assert!(session.snapshot().is_token_expired);

    let toasts = Arc::new(ToastStore::new());
    let client = ApiClient::with_http(build_http(Some(Duration::from_secs(5))), session, toasts);

    // Concurrent first calls share one refresh.
    let query = ItemQuery::default();
    let pages = join_all((0..6).map(|_| client.list_items(&query))).await;
    for page in pages {
        let page = page?;
        assert_eq!(page.items[0].name, "Idli");
        assert_eq!(page.next_cursor.as_deref(), Some("next-1"));
    }
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);

    let stored = persist::load(&path)?.unwrap_or_default();
    assert_eq!(stored.token, issued);

    // Server-side revocation: the next call logs out with one notification.
    backend.accepted.lock().clear();
    let err = client.list_items(&ItemQuery::default()).await.err();
    assert_eq!(err.as_ref().and_then(|e| e.status()), Some(401));

    let titles: Vec<_> = client.toasts().list().into_iter().filter_map(|t| t.title).collect();
    assert_eq!(titles, vec!["Logged out"]);
    assert!(!client.session().snapshot().has_token);

    let stored = persist::load(&path)?.unwrap_or_default();
    assert_eq!(stored.token, "");
    assert_eq!(stored.refresh_token, "r1");
    Ok(())
}

#[tokio::test]
async fn rejected_refresh_expires_the_session() -> anyhow::Result<()> {
    let backend = Arc::new(Backend {
        accepted: Mutex::new(String::new()),
        issue: token("erin", 4_102_444_800),
        refreshes: AtomicU32::new(0),
    });
    let addr = spawn(Arc::clone(&backend)).await?;

    let session = Arc::new(SessionStore::in_memory(format!("http://{addr}")));
    session.set_refresh_token("stolen");
    session.set_enable_refresh(true);
    session.set_token(&token("erin", 1));
    let client = ApiClient::with_http(build_http(None), session, Arc::new(ToastStore::new()));

    let query = ItemQuery::default();
    let results = join_all((0..3).map(|_| client.list_items(&query))).await;
    assert!(results.iter().all(|r| r.as_ref().err().and_then(|e| e.status()) == Some(401)));
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);

    let titles: Vec<_> = client.toasts().list().into_iter().filter_map(|t| t.title).collect();
    assert!(titles.iter().all(|t| t == "Session expired"));
    assert!(!titles.is_empty());
    assert!(!client.session().snapshot().has_token);
    Ok(())
}
