// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mealpilot` subcommands.
//!
//! Each handler returns the JSON value to print; the binary owns stdout.

use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::token;
use crate::types::{
    parse_csv_tags, CreateItem, Credentials, DecideRequest, DecisionEvent, DecisionQuery,
    FeedbackRequest, FeedbackStatus, ItemQuery, Platform, ReasonCategory, UpdateItem,
};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Check that the backend is up.
    Health,
    /// Create an account.
    Register(CredentialArgs),
    /// Log in and store the access token.
    Login(CredentialArgs),
    /// Forget the access token.
    Logout,
    /// Show the current session.
    Status,
    /// Change stored session settings.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage saved meal items.
    #[command(subcommand)]
    Items(ItemsCommand),
    /// View or edit the preference profile.
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Rank items and record a decision.
    Decide(DecideArgs),
    /// Browse past decisions and give feedback.
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Debug, clap::Args)]
pub struct CredentialArgs {
    pub username: String,
    #[arg(long, env = "MEALPILOT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl CredentialArgs {
    fn credentials(&self) -> Credentials {
        Credentials { username: self.username.clone(), password: self.password.clone() }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommand {
    /// Set the backend base URL.
    ApiBase { url: String },
    /// Store an access token directly (a pasted `Bearer ...` value is fine).
    Token { token: String },
    /// Store the refresh token.
    RefreshToken { token: String },
    /// Turn automatic token refresh on or off.
    EnableRefresh {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Debug, clap::Subcommand)]
pub enum ItemsCommand {
    /// List items, one page at a time.
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Add an item.
    Add {
        name: String,
        #[arg(long)]
        restaurant: Option<String>,
        /// Comma-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
        /// Comma-separated delivery platforms.
        #[arg(long, default_value = "")]
        platforms: String,
        #[arg(long)]
        price: Option<i32>,
    },
    /// Change fields of an item; unset flags are left alone.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        restaurant: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        platforms: Option<String>,
        #[arg(long)]
        price: Option<i32>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete an item.
    Rm { id: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum PrefsCommand {
    /// Print learned weights and the profile.
    Show,
    /// Update profile fields; unset flags keep their current value.
    Set(ProfileArgs),
}

#[derive(Debug, Default, clap::Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub budget_min: Option<i32>,
    #[arg(long)]
    pub budget_max: Option<i32>,
    #[arg(long)]
    pub prefer_tags: Option<String>,
    #[arg(long)]
    pub avoid_tags: Option<String>,
    #[arg(long)]
    pub prefer_restaurants: Option<String>,
    #[arg(long)]
    pub avoid_restaurants: Option<String>,
    #[arg(long)]
    pub diet: Option<String>,
    #[arg(long)]
    pub allergens: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, clap::Args)]
pub struct DecideArgs {
    #[arg(long)]
    pub budget: Option<i32>,
    /// Comma-separated tags every candidate must carry.
    #[arg(long, default_value = "")]
    pub must: String,
    /// Comma-separated tags to steer away from.
    #[arg(long, default_value = "")]
    pub avoid: String,
    #[arg(long)]
    pub query: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, clap::Subcommand)]
pub enum HistoryCommand {
    /// List past decisions.
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long)]
        has_feedback: Option<bool>,
        #[arg(long, value_enum)]
        status: Option<FeedbackStatus>,
    },
    /// Show one decision.
    Show { id: String },
    /// Record feedback on a decision.
    Feedback {
        id: String,
        #[arg(long, value_enum)]
        status: FeedbackStatus,
        #[arg(long)]
        reason_code: Option<String>,
        #[arg(long, value_enum)]
        category: Option<ReasonCategory>,
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Record that a delivery platform link was opened.
    Click {
        id: String,
        #[arg(long, value_enum)]
        platform: Platform,
    },
}

/// Session summary without the full token.
pub fn status(client: &ApiClient) -> Value {
    let snap = client.session().snapshot();
    json!({
        "apiBase": snap.api_base,
        "hasToken": snap.has_token,
        "subject": snap.subject(),
        "token": snap.has_token.then(|| token::preview(&snap.token)),
        "tokenExpiresAtMs": snap.token_expires_at_ms,
        "isTokenExpired": snap.is_token_expired,
        "enableRefresh": snap.enable_refresh,
        "hasRefreshToken": !snap.refresh_token.is_empty(),
    })
}

/// Run one subcommand.
pub async fn run(client: &ApiClient, command: &Command) -> anyhow::Result<Value> {
    let out = match command {
        Command::Health => serde_json::to_value(client.health().await?)?,
        Command::Register(args) => {
            serde_json::to_value(client.register(&args.credentials()).await?)?
        }
        Command::Login(args) => {
            client.login(&args.credentials()).await?;
            status(client)
        }
        Command::Logout => {
            client.logout();
            status(client)
        }
        Command::Status => status(client),
        Command::Config(cmd) => {
            run_config(client, cmd);
            status(client)
        }
        Command::Items(cmd) => run_items(client, cmd).await?,
        Command::Prefs(cmd) => run_prefs(client, cmd).await?,
        Command::Decide(args) => {
            let req = DecideRequest {
                budget: args.budget,
                must_have_tags: parse_csv_tags(&args.must),
                avoid_tags: parse_csv_tags(&args.avoid),
                query: args.query.clone(),
                limit: args.limit,
            };
            serde_json::to_value(client.decide(&req).await?)?
        }
        Command::History(cmd) => run_history(client, cmd).await?,
    };
    Ok(out)
}

fn run_config(client: &ApiClient, cmd: &ConfigCommand) {
    let session = client.session();
    match cmd {
        ConfigCommand::ApiBase { url } => session.set_api_base(url.trim()),
        ConfigCommand::Token { token } => session.set_token(token),
        ConfigCommand::RefreshToken { token } => session.set_refresh_token(token.trim()),
        ConfigCommand::EnableRefresh { enabled } => session.set_enable_refresh(*enabled),
    }
}

async fn run_items(client: &ApiClient, cmd: &ItemsCommand) -> anyhow::Result<Value> {
    let out = match cmd {
        ItemsCommand::List { limit, cursor, from, to, active } => {
            let query = ItemQuery {
                limit: *limit,
                cursor: cursor.clone(),
                from: from.clone(),
                to: to.clone(),
                active: *active,
            };
            serde_json::to_value(client.list_items(&query).await?)?
        }
        ItemsCommand::Add { name, restaurant, tags, platforms, price } => {
            let item = CreateItem {
                name: name.clone(),
                restaurant_name: restaurant.clone(),
                tags: parse_csv_tags(tags),
                platform_hints: parse_csv_tags(platforms),
                price_estimate: *price,
            };
            serde_json::to_value(client.create_item(&item).await?)?
        }
        ItemsCommand::Update { id, name, restaurant, tags, platforms, price, active } => {
            let patch = UpdateItem {
                name: name.clone(),
                restaurant_name: restaurant.clone(),
                tags: tags.as_deref().map(parse_csv_tags),
                platform_hints: platforms.as_deref().map(parse_csv_tags),
                price_estimate: *price,
                active: *active,
            };
            serde_json::to_value(client.update_item(id, &patch).await?)?
        }
        ItemsCommand::Rm { id } => {
            client.delete_item(id).await?;
            json!({ "deleted": id })
        }
    };
    Ok(out)
}

async fn run_prefs(client: &ApiClient, cmd: &PrefsCommand) -> anyhow::Result<Value> {
    let out = match cmd {
        PrefsCommand::Show => serde_json::to_value(client.preferences().await?)?,
        PrefsCommand::Set(args) => {
            let mut profile = client.preferences().await?.profile;
            if args.budget_min.is_some() {
                profile.budget_min = args.budget_min;
            }
            if args.budget_max.is_some() {
                profile.budget_max = args.budget_max;
            }
            let lists = [
                (&args.prefer_tags, &mut profile.prefer_tags),
                (&args.avoid_tags, &mut profile.avoid_tags),
                (&args.prefer_restaurants, &mut profile.prefer_restaurants),
                (&args.avoid_restaurants, &mut profile.avoid_restaurants),
                (&args.diet, &mut profile.dietary_restrictions),
                (&args.allergens, &mut profile.allergens),
            ];
            for (arg, field) in lists {
                if let Some(raw) = arg {
                    *field = parse_csv_tags(raw);
                }
            }
            if args.notes.is_some() {
                profile.notes = args.notes.clone();
            }
            serde_json::to_value(client.update_profile(&profile).await?)?
        }
    };
    Ok(out)
}

async fn run_history(client: &ApiClient, cmd: &HistoryCommand) -> anyhow::Result<Value> {
    let out = match cmd {
        HistoryCommand::List { limit, cursor, has_feedback, status } => {
            let query = DecisionQuery {
                limit: *limit,
                cursor: cursor.clone(),
                has_feedback: *has_feedback,
                feedback_status: *status,
                ..DecisionQuery::default()
            };
            serde_json::to_value(client.list_decisions(&query).await?)?
        }
        HistoryCommand::Show { id } => serde_json::to_value(client.decision(id).await?)?,
        HistoryCommand::Feedback { id, status, reason_code, category, tags, rating, comment } => {
            let req = FeedbackRequest {
                status: *status,
                reason_code: reason_code.clone(),
                category: *category,
                tags: parse_csv_tags(tags),
                rating: *rating,
                comment: comment.clone(),
            };
            serde_json::to_value(client.send_feedback(id, &req).await?)?
        }
        HistoryCommand::Click { id, platform } => {
            client.track_event(id, &DecisionEvent::click(*platform)).await;
            json!({ "tracked": id, "platform": platform })
        }
    };
    Ok(out)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
