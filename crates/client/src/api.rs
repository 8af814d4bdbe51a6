// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed MealPilot endpoints on top of [`ApiClient`].

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::RequestError;
use crate::types::{
    AuthResponse, CreateItem, Credentials, DecideRequest, DecideResponse, Decision,
    DecisionEvent, DecisionQuery, FeedbackRequest, Health, Item, ItemQuery, Page,
    PreferenceProfile, RegisteredUser, UpdateItem, UserPreference,
};

/// Percent-encode a query component (RFC 3986 unreserved set kept).
fn encode_component(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Append the set parameters of `params` to `path` as a query string.
pub fn with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let query = params
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={}", encode_component(v))))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}

fn item_path(id: &str) -> String {
    format!("/api/items/{}", encode_component(id))
}

fn decision_path(id: &str) -> String {
    format!("/api/decisions/{}", encode_component(id))
}

/// A body the endpoint promises but the backend left empty.
fn required<T>(data: Option<T>, what: &str) -> Result<T, RequestError> {
    data.ok_or_else(|| {
        RequestError::Decode(serde::de::Error::custom(format!("empty {what} response")))
    })
}

impl ApiClient {
    pub async fn health(&self) -> Result<Health, RequestError> {
        Ok(self.get("/api/health").await?.unwrap_or_default())
    }

    pub async fn register(&self, creds: &Credentials) -> Result<RegisteredUser, RequestError> {
        required(self.post("/api/auth/register", creds).await?, "register")
    }

    /// Log in and store the returned access token in the session.
    pub async fn login(&self, creds: &Credentials) -> Result<AuthResponse, RequestError> {
        let auth: AuthResponse = required(self.post("/api/auth/login", creds).await?, "login")?;
        self.session().set_token(&auth.access_token);
        info!(user = %creds.username, "logged in");
        Ok(auth)
    }

    /// Drop the access token locally. No backend call.
    pub fn logout(&self) {
        self.session().logout();
    }

    async fn page<T: DeserializeOwned>(&self, path: &str) -> Result<Page<T>, RequestError> {
        let resp = self.get_with_headers::<Vec<T>>(path).await?;
        let next_cursor = resp.next_cursor();
        Ok(Page { items: resp.data.unwrap_or_default(), next_cursor })
    }

    pub async fn list_items(&self, query: &ItemQuery) -> Result<Page<Item>, RequestError> {
        let path = with_query(
            "/api/items",
            &[
                ("limit", query.limit.map(|l| l.to_string())),
                ("cursor", query.cursor.clone()),
                ("from", query.from.clone()),
                ("to", query.to.clone()),
                ("active", query.active.map(|a| a.to_string())),
            ],
        );
        self.page(&path).await
    }

    pub async fn create_item(&self, item: &CreateItem) -> Result<Item, RequestError> {
        required(self.post("/api/items", item).await?, "item")
    }

    pub async fn update_item(&self, id: &str, patch: &UpdateItem) -> Result<Item, RequestError> {
        required(self.patch(&item_path(id), patch).await?, "item")
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), RequestError> {
        self.delete(&item_path(id)).await
    }

    pub async fn preferences(&self) -> Result<UserPreference, RequestError> {
        Ok(self.get("/api/preferences").await?.unwrap_or_default())
    }

    pub async fn update_profile(
        &self,
        profile: &PreferenceProfile,
    ) -> Result<UserPreference, RequestError> {
        required(self.put("/api/preferences/profile", profile).await?, "preferences")
    }

    pub async fn decide(&self, req: &DecideRequest) -> Result<DecideResponse, RequestError> {
        required(self.post("/api/decide", req).await?, "decide")
    }

    pub async fn list_decisions(
        &self,
        query: &DecisionQuery,
    ) -> Result<Page<Decision>, RequestError> {
        let path = with_query(
            "/api/decisions",
            &[
                ("limit", query.limit.map(|l| l.to_string())),
                ("cursor", query.cursor.clone()),
                ("from", query.from.clone()),
                ("to", query.to.clone()),
                ("hasFeedback", query.has_feedback.map(|f| f.to_string())),
                ("feedbackStatus", query.feedback_status.map(|s| s.as_str().to_owned())),
                ("reasonCode", query.reason_code.clone()),
            ],
        );
        self.page(&path).await
    }

    pub async fn decision(&self, id: &str) -> Result<Decision, RequestError> {
        required(self.get(&decision_path(id)).await?, "decision")
    }

    pub async fn send_feedback(
        &self,
        id: &str,
        feedback: &FeedbackRequest,
    ) -> Result<Decision, RequestError> {
        let path = format!("{}/feedback", decision_path(id));
        required(self.post(&path, feedback).await?, "decision")
    }

    /// Record an intent signal. Telemetry only: failures are logged and dropped.
    pub async fn track_event(&self, id: &str, event: &DecisionEvent) {
        let path = format!("{}/events", decision_path(id));
        if let Err(e) = self.post::<_, serde_json::Value>(&path, event).await {
            debug!(decision = id, err = %e, "dropping decision event");
        }
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
