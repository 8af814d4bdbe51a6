// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single per-field validation message from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Normalized non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub field_errors: Vec<FieldError>,
    /// Parsed error body, or the raw response text as a JSON string.
    pub raw: Value,
}

impl ApiError {
    /// First message reported for `field`, if any.
    ///
    /// Callers map known field names onto their inputs; names they don't
    /// know are simply never asked for.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Build an [`ApiError`] from a failed response.
///
/// Message precedence: non-blank `message` from the body, then the raw
/// text, then `HTTP <status>`. Only `fieldErrors` entries with string
/// `field` and `message` survive.
pub fn coerce_api_error(status: u16, raw_text: &str, parsed: Option<&Value>) -> ApiError {
    let server_message = parsed
        .and_then(|body| body.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty());

    let message = match server_message {
        Some(m) => m.to_owned(),
        None if !raw_text.is_empty() => raw_text.to_owned(),
        None => format!("HTTP {status}"),
    };

    let field_errors = parsed
        .and_then(|body| body.get("fieldErrors"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let field = e.get("field")?.as_str()?;
                    let message = e.get("message")?.as_str()?;
                    Some(FieldError { field: field.to_owned(), message: message.to_owned() })
                })
                .collect()
        })
        .unwrap_or_default();

    let raw = match parsed {
        Some(body) => body.clone(),
        None => Value::String(raw_text.to_owned()),
    };

    ApiError { status, message, field_errors, raw }
}

/// Failure of a pipeline call.
#[derive(Debug)]
pub enum RequestError {
    /// No HTTP response was produced (DNS, refused connection, timeout).
    Transport(reqwest::Error),
    /// The backend answered with a non-2xx status.
    Api(ApiError),
    /// The response JSON did not match the expected type.
    Decode(serde_json::Error),
    /// The request body could not be serialized.
    Encode(serde_json::Error),
}

impl RequestError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Api(_) => "API",
            Self::Decode(_) => "DECODE",
            Self::Encode(_) => "ENCODE",
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.api().map(|e| e.status)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Decode(e) => write!(f, "unexpected response body: {e}"),
            Self::Encode(e) => write!(f, "invalid request body: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Decode(e) | Self::Encode(e) => Some(e),
        }
    }
}

impl From<ApiError> for RequestError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

/// Why an access-token refresh did not produce a new token.
///
/// Every variant ends the session the same way; the kind is kept for logs.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshError {
    Disabled,
    MissingRefreshToken,
    /// The refresh endpoint answered non-2xx.
    Rejected(ApiError),
    /// The refresh endpoint answered 2xx without a usable `accessToken`.
    MissingAccessToken,
    /// The refresh call never got a response.
    Transport(String),
}

impl RefreshError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "REFRESH_DISABLED",
            Self::MissingRefreshToken => "NO_REFRESH_TOKEN",
            Self::Rejected(_) => "REFRESH_REJECTED",
            Self::MissingAccessToken => "NO_ACCESS_TOKEN",
            Self::Transport(_) => "TRANSPORT",
        }
    }
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("refresh disabled"),
            Self::MissingRefreshToken => f.write_str("no refresh token"),
            Self::Rejected(e) => write!(f, "refresh rejected ({}): {e}", e.status),
            Self::MissingAccessToken => f.write_str("refresh succeeded but no accessToken returned"),
            Self::Transport(e) => write!(f, "refresh request failed: {e}"),
        }
    }
}

impl std::error::Error for RefreshError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
