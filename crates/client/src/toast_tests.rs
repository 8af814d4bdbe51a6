// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn push_assigns_unique_ids_and_default_duration() {
    let store = ToastStore::new();
    let a = store.push(NewToast::session_expired());
    let b = store.push(NewToast::logged_out());
    assert_ne!(a, b);

    let toasts = store.list();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].title.as_deref(), Some("Session expired"));
    assert_eq!(toasts[0].message, "Please log in again.");
    assert_eq!(toasts[0].kind, ToastKind::Warning);
    assert_eq!(toasts[0].duration_ms, DEFAULT_DURATION_MS);
    assert_eq!(toasts[1].title.as_deref(), Some("Logged out"));
    assert!(toasts[0].created_at_ms > 0);
}

#[test]
fn explicit_duration_is_kept() {
    let store = ToastStore::new();
    store.push(NewToast {
        kind: ToastKind::Success,
        title: None,
        message: "Saved".to_owned(),
        duration_ms: Some(900),
    });
    assert_eq!(store.list()[0].duration_ms, 900);
}

#[test]
fn remove_and_clear() {
    let store = ToastStore::new();
    let a = store.push(NewToast::warning("a", "first"));
    store.push(NewToast::warning("b", "second"));
    store.remove(&a);
    let left: Vec<String> = store.list().into_iter().map(|t| t.message).collect();
    assert_eq!(left, vec!["second"]);

    store.remove("no-such-id");
    assert_eq!(store.list().len(), 1);

    store.clear();
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn subscribers_receive_pushes() -> anyhow::Result<()> {
    let store = ToastStore::new();
    let mut rx = store.subscribe();
    let id = store.push(NewToast::logged_out());
    let toast = rx.recv().await?;
    assert_eq!(toast.id, id);
    assert_eq!(toast.kind.as_str(), "warning");
    Ok(())
}

#[test]
fn toast_serializes_camel_case() -> anyhow::Result<()> {
    let store = ToastStore::new();
    store.push(NewToast::session_expired());
    let json = serde_json::to_value(&store.list()[0])?;
    assert_eq!(json["kind"], "warning");
    assert!(json.get("durationMs").is_some());
    assert!(json.get("createdAtMs").is_some());
    Ok(())
}
