// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated request pipeline.
//!
//! Every API call goes through [`ApiClient`]: it reads a session snapshot,
//! resolves a usable bearer token (refreshing an expired one at most once
//! across concurrent callers), performs the call, logs the session out on a
//! 401, and turns non-2xx responses into [`ApiError`](crate::error::ApiError)s.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{coerce_api_error, RefreshError, RequestError};
use crate::session::SessionStore;
use crate::toast::{NewToast, ToastStore};
use crate::token;
use crate::transport::{self, Envelope, RequestOptions, NEXT_CURSOR_HEADER};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Paths reachable without an access token.
///
/// Public calls never carry `Authorization` and a 401 from them never
/// ends the session.
pub fn is_public_endpoint(path: &str) -> bool {
    path.starts_with("/api/auth/") || path == "/api/health"
}

/// Outcome of resolving the token for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenResolution {
    /// No token is set; the call goes out unauthenticated.
    Anonymous,
    /// The current token is usable as-is.
    Current(String),
    /// The token had expired and was renewed.
    Refreshed(String),
    /// The token had expired and could not be renewed.
    Expired(RefreshError),
}

impl TokenResolution {
    /// Token to attach; empty when the call goes out unauthenticated.
    pub fn token(&self) -> &str {
        match self {
            Self::Current(t) | Self::Refreshed(t) => t,
            Self::Anonymous | Self::Expired(_) => "",
        }
    }
}

/// Decoded body plus response headers.
#[derive(Debug, Clone)]
pub struct WithHeaders<T> {
    pub data: Option<T>,
    pub headers: HeaderMap,
}

impl<T> WithHeaders<T> {
    /// Cursor for the next page; `None` once the last page is reached.
    pub fn next_cursor(&self) -> Option<String> {
        self.headers
            .get(NEXT_CURSOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
    }
}

/// Build the shared HTTP client. `None` disables the request timeout.
pub fn build_http(timeout: Option<Duration>) -> Client {
    crate::ensure_crypto();
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_default()
}

/// The authenticated request pipeline.
pub struct ApiClient {
    http: Client,
    session: Arc<SessionStore>,
    toasts: Arc<ToastStore>,
    /// At most one refresh call in flight.
    ///
    /// The first waiter to resume after the future settles clears the slot.
    /// A waiter dropped mid-refresh leaves the future in place; the next
    /// caller polls it to completion and clears it then.
    refresh_slot: Mutex<Option<RefreshFuture>>,
}

impl ApiClient {
    pub fn new(session: Arc<SessionStore>, toasts: Arc<ToastStore>) -> Self {
        Self::with_http(build_http(Some(DEFAULT_TIMEOUT)), session, toasts)
    }

    pub fn with_http(http: Client, session: Arc<SessionStore>, toasts: Arc<ToastStore>) -> Self {
        Self { http, session, toasts, refresh_slot: Mutex::new(None) }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn toasts(&self) -> &Arc<ToastStore> {
        &self.toasts
    }

    /// Decide which token the next call should carry, refreshing if needed.
    ///
    /// Has no side effects beyond the refresh itself; see [`Self::valid_token`].
    pub async fn resolve_token(&self) -> TokenResolution {
        let snap = self.session.snapshot();
        if snap.token.is_empty() {
            return TokenResolution::Anonymous;
        }
        if !snap.is_token_expired {
            return TokenResolution::Current(snap.token);
        }
        if !snap.enable_refresh {
            return TokenResolution::Expired(RefreshError::Disabled);
        }
        if snap.refresh_token.is_empty() {
            return TokenResolution::Expired(RefreshError::MissingRefreshToken);
        }
        match self.refresh_access_token().await {
            Ok(t) => TokenResolution::Refreshed(t),
            Err(e) => TokenResolution::Expired(e),
        }
    }

    /// Resolve the token and end the session if it could not be renewed.
    ///
    /// Returns the token to attach, or an empty string to proceed
    /// unauthenticated and let the backend answer for itself.
    pub async fn valid_token(&self) -> String {
        let resolution = self.resolve_token().await;
        if let TokenResolution::Expired(ref reason) = resolution {
            warn!(kind = reason.as_str(), err = %reason, "session expired, logging out");
            self.end_expired_session();
        }
        resolution.token().to_owned()
    }

    /// Notify and log out after an unrenewable expiry.
    pub fn end_expired_session(&self) {
        self.toasts.push(NewToast::session_expired());
        self.session.logout();
    }

    /// React to a 401 on a non-public call.
    ///
    /// Only notifies when a token was actually set; anonymous 401s are quiet.
    pub fn handle_unauthorized(&self) {
        if self.session.snapshot().has_token {
            warn!("backend rejected the access token, logging out");
            self.toasts.push(NewToast::logged_out());
        }
        self.session.logout();
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Concurrent callers share one network call and all receive its result.
    pub async fn refresh_access_token(&self) -> Result<String, RefreshError> {
        let fut = {
            let mut slot = self.refresh_slot.lock();
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("joining in-flight refresh");
                    in_flight.clone()
                }
                None => {
                    let fut = refresh_once(self.http.clone(), Arc::clone(&self.session))
                        .boxed()
                        .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = fut.clone().await;

        let mut slot = self.refresh_slot.lock();
        if slot.as_ref().is_some_and(|f| f.ptr_eq(&fut)) {
            *slot = None;
        }
        result
    }

    /// GET, decoding the body. Empty bodies yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, RequestError> {
        let env = self.send(Method::GET, path, None).await?;
        decode(env.data)
    }

    /// GET, also returning response headers (for the paging cursor).
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<WithHeaders<T>, RequestError> {
        let env = self.send(Method::GET, path, None).await?;
        Ok(WithHeaders { data: decode(env.data)?, headers: env.headers })
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), RequestError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body).map_err(RequestError::Encode)?;
        let env = self.send(method, path, Some(body)).await?;
        decode(env.data)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Envelope, RequestError> {
        let snap = self.session.snapshot();
        let public = is_public_endpoint(path);
        let token = if public { String::new() } else { self.valid_token().await };

        let mut options = RequestOptions::new(method);
        if let Some(body) = body {
            options = options.body(body);
        }
        if !token.is_empty() {
            options = options.token(token);
        }

        let env = transport::request(&self.http, &snap.api_base, path, options).await?;

        if env.status == 401 && !public {
            self.handle_unauthorized();
        }
        if !env.ok {
            return Err(coerce_api_error(env.status, &env.raw_text, env.data.as_ref()).into());
        }
        Ok(env)
    }
}

fn decode<T: DeserializeOwned>(data: Option<Value>) -> Result<Option<T>, RequestError> {
    data.map(serde_json::from_value).transpose().map_err(RequestError::Decode)
}

async fn refresh_once(http: Client, session: Arc<SessionStore>) -> Result<String, RefreshError> {
    let snap = session.snapshot();
    if !snap.enable_refresh {
        return Err(RefreshError::Disabled);
    }
    if snap.refresh_token.is_empty() {
        return Err(RefreshError::MissingRefreshToken);
    }

    let body = json!({ "refreshToken": snap.refresh_token }).to_string();
    let options = RequestOptions::new(Method::POST).body(body);
    let env = transport::request(&http, &snap.api_base, REFRESH_PATH, options)
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    if !env.ok {
        return Err(RefreshError::Rejected(coerce_api_error(
            env.status,
            &env.raw_text,
            env.data.as_ref(),
        )));
    }

    let next = env
        .data
        .as_ref()
        .and_then(|d| d.get("accessToken"))
        .and_then(Value::as_str)
        .map(token::sanitize)
        .filter(|t| !t.is_empty())
        .ok_or(RefreshError::MissingAccessToken)?;

    session.set_token(&next);
    info!(token = %token::preview(&next), "access token refreshed");
    Ok(next)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
