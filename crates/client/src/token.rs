// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort decoding of bearer token claims.
//!
//! Nothing in this module verifies a signature. Decoded claims only drive
//! presentation (expiry countdown, forced logout, showing who is logged in).
//! The backend must validate every token it receives; never treat a value
//! decoded here as proof of identity.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use regex::Regex;
use serde_json::Value;

/// Standard alphabet, padding optional, trailing bits ignored.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static BEARER_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^bearer\s+").ok());

/// Claims extracted from a token payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    /// Subject identifier, trimmed. `None` when absent or blank.
    pub sub: Option<String>,
    /// Expiry as epoch seconds.
    pub exp: Option<f64>,
}

impl Claims {
    /// Expiry as epoch milliseconds, saturated to the `i64` range.
    pub fn expires_at_ms(&self) -> Option<i64> {
        self.exp.map(|exp| (exp * 1000.0) as i64)
    }
}

/// Decode the middle segment of a `header.payload.signature` token as JSON.
///
/// Returns `None` for anything that is not exactly three segments, not
/// base64, not UTF-8, or not JSON.
pub fn decode_payload(token: &str) -> Option<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = parts.as_slice() else {
        return None;
    };
    let translated: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = PAYLOAD_ENGINE.decode(translated).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&text).ok()
}

/// Decode `sub` and `exp` from a token. `None` if the payload is undecodable.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = decode_payload(token)?;
    let sub = payload
        .get("sub")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    let exp = payload.get("exp").and_then(Value::as_f64);
    Some(Claims { sub, exp })
}

/// Subject claim of a token, if present.
pub fn subject(token: &str) -> Option<String> {
    decode_claims(token).and_then(|c| c.sub)
}

/// Expiry of a token in epoch milliseconds, if it carries a numeric `exp`.
pub fn expires_at_ms(token: &str) -> Option<i64> {
    decode_claims(token).and_then(|c| c.expires_at_ms())
}

/// Normalize a user-supplied token.
///
/// Trims whitespace and strips any leading `Bearer ` (case-insensitive),
/// which shows up when a whole `Authorization` header value is pasted.
/// Repeated prefixes are all stripped so the result is a fixed point.
pub fn sanitize(input: &str) -> String {
    let mut token = input.trim();
    if let Some(ref re) = *BEARER_PREFIX {
        while let Some(m) = re.find(token) {
            token = token[m.end()..].trim();
        }
    }
    token.to_owned()
}

/// Shorten a token for display and logs: first 12 + `...` + last 12.
pub fn preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 24 {
        return token.to_owned();
    }
    let head: String = chars[..12].iter().collect();
    let tail: String = chars[chars.len() - 12..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
