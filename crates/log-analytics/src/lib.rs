// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Asynchronous client for the Azure Log Analytics HTTP Data Collector API.
//!
//! Callers hand serializable items to [`LogAnalytics::add`]; a fixed pool of workers stamps each
//! one with `TimeGenerated`, signs the request with the workspace shared key and posts it. Delivery
//! is fire-and-forget: failures are reported through `tracing` and the item is dropped.
//!
//! ```rust,ignore
//! let client = LogAnalytics::new(&workspace_id, &shared_key, "AppEvents")?;
//! client.add(serde_json::json!({"message": "started"}))?;
//! let report = client.finalize().await?;
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod signature;
pub mod transport;
pub mod worker;

pub use client::{LogAnalytics, LogAnalyticsHandle, State};
pub use config::Config;
pub use error::{Error, ShippingError};
pub use transport::{HttpTransport, Transport};
pub use worker::DrainReport;
