// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response bodies for the MealPilot backend.
//!
//! Response types are lenient: absent or `null` collections decode as empty
//! and optional scalars as `None`, so older backends still parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as `T::default()`.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// Split a comma-separated tag argument, trimming and dropping blanks.
pub fn parse_csv_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned).collect()
}

/// One page of a cursor-paged listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last one.
    pub next_cursor: Option<String>,
}

// -- Health & auth ------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

// -- Items --------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub platform_hints: Vec<String>,
    #[serde(default)]
    pub price_estimate: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    pub tags: Vec<String>,
    pub platform_hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<i32>,
}

/// Partial update; `None` fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_hints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub active: Option<bool>,
}

// -- Preferences --------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub prefer_tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avoid_tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub prefer_restaurants: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avoid_restaurants: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub dietary_restrictions: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub allergens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tag_weights: BTreeMap<String, i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub restaurant_weights: BTreeMap<String, i32>,
    #[serde(default)]
    pub price_penalty: i32,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub schema_version: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile: PreferenceProfile,
}

// -- Decide -------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub must_have_tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avoid_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price_estimate: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub budget_fit: f64,
    pub must_tag_match: f64,
    pub avoid_tag_penalty: f64,
    pub query_match: f64,
    pub restaurant_affinity: f64,
    pub tag_affinity: f64,
    pub price_sensitivity: f64,
    pub total: f64,
}

/// A ranked candidate, as returned by decide and stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub item: ItemSummary,
    pub score: f64,
    pub confidence: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub why: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub deep_links: Vec<DeepLink>,
    #[serde(default)]
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    /// `None` when there was nothing to rank.
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub message: Option<String>,
}

// -- Decision history ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    Accept,
    Reject,
    Skip,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::Skip => "SKIP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCategory {
    Price,
    Taste,
    Diet,
    Availability,
    Variety,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReason {
    #[serde(default)]
    pub category: Option<ReasonCategory>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub status: FeedbackStatus,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason: Option<FeedbackReason>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSnapshot {
    #[serde(default)]
    pub schema_version: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub tag_weights: BTreeMap<String, i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub restaurant_weights: BTreeMap<String, i32>,
    #[serde(default)]
    pub price_penalty: Option<i32>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Reproducibility metadata recorded with a decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionMeta {
    pub schema_version: Option<i32>,
    pub algorithm: Option<String>,
    pub algorithm_version: Option<String>,
    pub input_hash: Option<String>,
    pub items_hash: Option<String>,
    pub preference_hash: Option<String>,
    pub random_seed: Option<i64>,
    pub preference_snapshot: Option<PreferenceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub input: Option<DecideRequest>,
    #[serde(default, deserialize_with = "nullable")]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
    #[serde(default)]
    pub meta: Option<DecisionMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub has_feedback: Option<bool>,
    pub feedback_status: Option<FeedbackStatus>,
    pub reason_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub status: FeedbackStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ReasonCategory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Swiggy,
    Zomato,
    Eatsure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Accept,
    Reject,
    Skip,
    ClickPlatform,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
}

/// Intent signal posted to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionEvent {
    pub action: EventAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
}

impl DecisionEvent {
    pub fn click(platform: Platform) -> Self {
        Self { action: EventAction::ClickPlatform, platform: Some(platform), context: None }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
