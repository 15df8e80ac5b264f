// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use log_analytics::{Config, LogAnalytics};
use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOG_ANALYTICS_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating config on log analytics shipper startup: {e}");
            return;
        }
    };

    let client: LogAnalytics<Value> = match LogAnalytics::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Error starting log analytics client: {e}");
            return;
        }
    };

    let interrupted = tokio::select! {
        result = forward_lines(BufReader::new(io::stdin()), &client) => {
            match result {
                Ok(forwarded) => info!("stdin closed after {forwarded} log items"),
                Err(e) => error!("Failed to read stdin: {e}"),
            }
            false
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            true
        }
    };

    match client.finalize().await {
        Ok(report) => info!(
            "Shipper stopped: {} delivered, {} dropped",
            report.delivered, report.dropped
        ),
        Err(e) => error!("Failed to finalize log analytics client: {e}"),
    }

    // A pending stdin read would otherwise hold the runtime open until the next line arrives.
    if interrupted {
        std::process::exit(130);
    }
}

/// Queues every JSON line of `reader` until EOF or until the client stops accepting items.
/// Returns the number of queued items.
async fn forward_lines<R>(reader: R, client: &LogAnalytics<Value>) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(item) = parse_line(&line) else {
            continue;
        };
        if let Err(e) = client.add(item) {
            error!("Stopped reading input: {e}");
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

fn parse_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(item @ Value::Object(_)) => Some(item),
        Ok(_) => {
            warn!("Skipping line: log items must be JSON objects");
            None
        }
        Err(e) => {
            warn!("Skipping line that is not valid JSON: {e}");
            None
        }
    }
}
