// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background watcher that acts when the access token's `exp` passes.
//!
//! Meant for long-running embedders that keep one `ApiClient` alive. The
//! `mealpilot` binary runs a single command and resolves expiry per request
//! instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ApiClient;

/// Spawn a task that sleeps until the current token expires, then renews it
/// or ends the session the same way a request would.
///
/// Re-arms on every session change. Stops when `shutdown` is cancelled.
pub fn spawn_expiry_watcher(client: Arc<ApiClient>, shutdown: CancellationToken) -> JoinHandle<()> {
    let mut rx = client.session().subscribe();

    tokio::spawn(async move {
        // Token we already acted on; don't fire twice for it.
        let mut handled: Option<String> = None;

        loop {
            let deadline = {
                let state = rx.borrow_and_update();
                match state.token_expires_at_ms {
                    Some(at) if state.has_token && handled.as_ref() != Some(&state.token) => {
                        Some((at, state.token.clone()))
                    }
                    _ => None,
                }
            };

            let Some((at, token)) = deadline else {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = rx.changed() => if changed.is_err() { break },
                }
                continue;
            };

            let left_ms = at.saturating_sub(client.session().now_ms()).max(0);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = tokio::time::sleep(Duration::from_millis(left_ms as u64)) => {}
            }

            if !client.session().recheck_expiry() {
                continue;
            }
            debug!(expired_at_ms = at, "access token expired");
            handled = Some(token);
            client.valid_token().await;
        }
        debug!("expiry watcher stopped");
    })
}

#[cfg(test)]
#[path = "expiry_tests.rs"]
mod tests;
