// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use mealpilot::client::{build_http, ApiClient};
use mealpilot::command;
use mealpilot::config::Config;
use mealpilot::error::RequestError;
use mealpilot::session::SessionStore;
use mealpilot::toast::{Toast, ToastStore};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    std::process::exit(run(config).await);
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr; stdout carries command output only.
    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };
    drop(result);
}

async fn run(config: Config) -> i32 {
    let record = config.record_path();
    debug!(path = %record.display(), "restoring session");
    let session = Arc::new(SessionStore::restore(config.api_base_hints(), record));
    session.ensure_defaults();

    let toasts = Arc::new(ToastStore::new());
    let client = ApiClient::with_http(build_http(config.timeout()), session, Arc::clone(&toasts));

    let result = command::run(&client, &config.command).await;

    for toast in toasts.list() {
        print_toast(&toast);
    }

    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        },
        Err(e) => {
            report_error(&e);
            1
        }
    }
}

fn print_toast(toast: &Toast) {
    match toast.title {
        Some(ref title) => eprintln!("{}: {title}: {}", toast.kind, toast.message),
        None => eprintln!("{}: {}", toast.kind, toast.message),
    }
}

fn report_error(err: &anyhow::Error) {
    let Some(api) = err.downcast_ref::<RequestError>().and_then(RequestError::api) else {
        eprintln!("error: {err:#}");
        return;
    };
    eprintln!("error: {} [{}]", api.message, api.status);
    for field in &api.field_errors {
        eprintln!("  {}: {}", field.field, field.message);
    }
}
