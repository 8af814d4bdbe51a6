// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use clap::Parser;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::*;
use crate::config::Config;
use crate::test_support::{fresh_token, http_client, session_for, spawn_router};

/// Last JSON body each write route received.
#[derive(Default)]
struct Bodies {
    items: Mutex<Option<Value>>,
    profile: Mutex<Option<Value>>,
    feedback: Mutex<Option<Value>>,
}

fn router(bodies: Arc<Bodies>) -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            post(|| async { Json(json!({ "accessToken": fresh_token("carol") })) }),
        )
        .route(
            "/api/items",
            post(|State(b): State<Arc<Bodies>>, Json(body): Json<Value>| async move {
                *b.items.lock() = Some(body.clone());
                let mut item = body;
                item["id"] = json!("i1");
                (StatusCode::CREATED, Json(item))
            }),
        )
        .route(
            "/api/preferences",
            get(|| async {
                Json(json!({ "userId": "u1", "profile": {
                    "budgetMax": 500, "preferTags": ["veg"], "allergens": ["peanut"]
                }}))
            }),
        )
        .route(
            "/api/preferences/profile",
            put(|State(b): State<Arc<Bodies>>, Json(body): Json<Value>| async move {
                *b.profile.lock() = Some(body.clone());
                Json(json!({ "userId": "u1", "profile": body }))
            }),
        )
        .route(
            "/api/decisions/d1/feedback",
            post(|State(b): State<Arc<Bodies>>, Json(body): Json<Value>| async move {
                *b.feedback.lock() = Some(body);
                Json(json!({ "id": "d1", "feedback": { "status": "SKIP" } }))
            }),
        )
        .with_state(bodies)
}

async fn setup() -> anyhow::Result<(ApiClient, Arc<Bodies>)> {
    let bodies = Arc::new(Bodies::default());
    let addr = spawn_router(router(Arc::clone(&bodies))).await?;
    let (session, toasts) = session_for(addr);
    Ok((ApiClient::with_http(http_client(), session, toasts), bodies))
}

async fn run_args(client: &ApiClient, args: &[&str]) -> anyhow::Result<Value> {
    let config = Config::try_parse_from(args)?;
    run(client, &config.command).await
}

#[tokio::test]
async fn config_commands_update_session() -> anyhow::Result<()> {
    let (client, _) = setup().await?;
    let token = fresh_token("dave");

    run_args(&client, &["mealpilot", "config", "token", &format!("Bearer {token}")]).await?;
    run_args(&client, &["mealpilot", "config", "refresh-token", " r7 "]).await?;
    let out = run_args(&client, &["mealpilot", "config", "enable-refresh", "true"]).await?;

    assert_eq!(out["hasToken"], true);
    assert_eq!(out["subject"], "dave");
    assert_eq!(out["enableRefresh"], true);
    assert_eq!(out["hasRefreshToken"], true);
    assert_eq!(out["token"], token::preview(&token));
    assert_eq!(client.session().snapshot().refresh_token, "r7");
    Ok(())
}

#[tokio::test]
async fn login_then_logout() -> anyhow::Result<()> {
    let (client, _) = setup().await?;
    let out =
        run_args(&client, &["mealpilot", "login", "carol", "--password", "pw123456"]).await?;
    assert_eq!(out["subject"], "carol");

    let out = run_args(&client, &["mealpilot", "logout"]).await?;
    assert_eq!(out["hasToken"], false);
    assert_eq!(out["token"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn items_add_splits_csv_flags() -> anyhow::Result<()> {
    let (client, bodies) = setup().await?;
    client.session().set_token(&fresh_token("carol"));

    let out = run_args(
        &client,
        &["mealpilot", "items", "add", "Paneer Tikka", "--tags", "veg, spicy,", "--price", "320"],
    )
    .await?;

    assert_eq!(out["id"], "i1");
    let sent = bodies.items.lock().clone().unwrap_or_default();
    assert_eq!(sent["tags"], json!(["veg", "spicy"]));
    assert_eq!(sent["platformHints"], json!([]));
    assert_eq!(sent["priceEstimate"], 320);
    assert!(sent.get("restaurantName").is_none());
    Ok(())
}

#[tokio::test]
async fn prefs_set_merges_over_current_profile() -> anyhow::Result<()> {
    let (client, bodies) = setup().await?;
    client.session().set_token(&fresh_token("carol"));

    run_args(&client, &["mealpilot", "prefs", "set", "--avoid-tags", "fried", "--budget-min", "100"])
        .await?;

    let sent = bodies.profile.lock().clone().unwrap_or_default();
    assert_eq!(sent["budgetMin"], 100);
    assert_eq!(sent["budgetMax"], 500);
    assert_eq!(sent["preferTags"], json!(["veg"]));
    assert_eq!(sent["avoidTags"], json!(["fried"]));
    assert_eq!(sent["allergens"], json!(["peanut"]));
    Ok(())
}

#[tokio::test]
async fn history_feedback_sends_request() -> anyhow::Result<()> {
    let (client, bodies) = setup().await?;
    client.session().set_token(&fresh_token("carol"));

    let out = run_args(
        &client,
        &["mealpilot", "history", "feedback", "d1", "--status", "skip", "--tags", "late"],
    )
    .await?;

    assert_eq!(out["feedback"]["status"], "SKIP");
    let sent = bodies.feedback.lock().clone().unwrap_or_default();
    assert_eq!(sent, json!({ "status": "SKIP", "tags": ["late"] }));
    Ok(())
}

#[tokio::test]
async fn click_never_fails() -> anyhow::Result<()> {
    let (client, _) = setup().await?;
    client.session().set_token(&fresh_token("carol"));
    let out =
        run_args(&client, &["mealpilot", "history", "click", "d9", "--platform", "eatsure"]).await?;
    assert_eq!(out, json!({ "tracked": "d9", "platform": "EATSURE" }));
    Ok(())
}

#[tokio::test]
async fn api_errors_propagate() -> anyhow::Result<()> {
    let (client, _) = setup().await?;
    client.session().set_token(&fresh_token("carol"));
    let err = match run_args(&client, &["mealpilot", "history", "show", "missing"]).await {
        Err(e) => e,
        Ok(v) => anyhow::bail!("expected error, got {v}"),
    };
    let status = err.downcast_ref::<crate::error::RequestError>().and_then(|e| e.status());
    assert_eq!(status, Some(404));
    Ok(())
}
