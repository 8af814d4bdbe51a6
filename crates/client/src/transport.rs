// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single HTTP call, normalized into an [`Envelope`].
//!
//! HTTP-level failures (any status) come back as data; only failures to get
//! a response at all surface as `Err`.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;

/// Response header carrying the opaque cursor for the next page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

/// Uniform view of one HTTP response.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Status is in the 2xx range.
    pub ok: bool,
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON body. `None` for empty, `null`, or unparseable bodies.
    pub data: Option<Value>,
    pub raw_text: String,
}

impl Envelope {
    /// Header value as a string, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Per-call options for [`request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Caller headers, merged over the `Accept` default.
    pub headers: HeaderMap,
    /// Pre-serialized request body.
    pub body: Option<String>,
    /// Bearer token. Empty or `None` sends no `Authorization`.
    pub token: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Concatenate `base` (one trailing slash dropped) and `path`.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{base}{path}")
}

/// Perform one HTTP call and normalize the response.
pub async fn request(
    http: &Client,
    base_url: &str,
    path: &str,
    options: RequestOptions,
) -> Result<Envelope, reqwest::Error> {
    let url = join_url(base_url, path);
    let RequestOptions { method, headers: caller_headers, body, token } = options;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.extend(caller_headers);
    if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let token = token.filter(|t| !t.is_empty());
    if token.is_some() {
        headers.remove(AUTHORIZATION);
    }

    tracing::debug!(%method, %url, authed = token.is_some(), "request");

    let mut req = http.request(method, &url).headers(headers);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    if let Some(body) = body {
        req = req.body(body);
    }

    let resp = req.send().await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let raw_text = resp.text().await?;
    let data = if raw_text.is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(&raw_text).ok().filter(|v| !v.is_null())
    };

    tracing::debug!(%url, status = status.as_u16(), "response");

    Ok(Envelope { ok: status.is_success(), status: status.as_u16(), headers, data, raw_text })
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
