// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client lifecycle: intake, worker pool and the drain on shutdown.
//!
//! ```text
//!   add / add_multi (any thread)
//!          │
//!          v
//!   ┌─────────────┐
//!   │    Queue    │ (mpsc, unbounded)
//!   └──────┬──────┘
//!          │  shared by N workers
//!          v
//!   ┌─────────────┐
//!   │   Workers   │ envelope → sign → POST, one item at a time each
//!   └──────┬──────┘
//!          │
//!          v
//!   Log Analytics HTTP Data Collector API
//! ```
//!
//! # Graceful Shutdown
//!
//! `finalize` moves the client from `Running` to `Draining` by dropping the only sender of the
//! queue, then waits on the task tracker until every worker has emptied the queue and exited.
//! Items added once draining started are rejected with [`Error::Closed`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::transport::{HttpTransport, Transport};
use crate::worker::{DeliveryStats, DrainReport, Worker};

/// Lifecycle of a client. Transitions only go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Draining,
    Stopped,
}

struct Intake<T> {
    state: State,
    tx: Option<mpsc::UnboundedSender<T>>,
}

/// Cheap, cloneable producer side of a client.
///
/// Handles can be moved to other threads; they stop accepting items once the owning
/// [`LogAnalytics`] starts finalizing.
pub struct LogAnalyticsHandle<T> {
    intake: Arc<RwLock<Intake<T>>>,
}

impl<T> Clone for LogAnalyticsHandle<T> {
    fn clone(&self) -> Self {
        LogAnalyticsHandle {
            intake: Arc::clone(&self.intake),
        }
    }
}

impl<T> LogAnalyticsHandle<T> {
    /// Queues one item. Never waits and never reports whether the item is delivered.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] once `finalize` has been called.
    pub fn add(&self, item: T) -> Result<(), Error> {
        let intake = self.intake.read().unwrap_or_else(PoisonError::into_inner);
        match &intake.tx {
            Some(tx) => tx.send(item).map_err(|_| Error::Closed),
            None => Err(Error::Closed),
        }
    }

    /// Queues each item in order. Not atomic: on error the items before it stay queued.
    pub fn add_multi<I>(&self, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.add(item)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.intake
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Closes the intake, returning `false` if it was not running.
    fn close(&self) -> bool {
        let mut intake = self.intake.write().unwrap_or_else(PoisonError::into_inner);
        if intake.state != State::Running {
            return false;
        }
        intake.state = State::Draining;
        intake.tx = None;
        true
    }

    fn stopped(&self) {
        self.intake
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .state = State::Stopped;
    }
}

impl<T> fmt::Debug for LogAnalyticsHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogAnalyticsHandle({:?})", self.state())
    }
}

/// Ships items of type `T` to one Log Analytics workspace and custom log.
#[allow(clippy::module_name_repetitions)]
pub struct LogAnalytics<T> {
    handle: LogAnalyticsHandle<T>,
    workers: TaskTracker,
    stats: Arc<DeliveryStats>,
    worker_count: usize,
}

impl<T: Serialize + Send + 'static> LogAnalytics<T> {
    /// Builds a client with the default settings for the given workspace and log.
    ///
    /// Must be called from within a tokio runtime, the workers are spawned right away.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSharedKey`] if `shared_key` is not valid base64.
    pub fn new(workspace_id: &str, shared_key: &str, log_name: &str) -> Result<Self, Error> {
        Self::from_config(Config::new(workspace_id, shared_key, log_name))
    }

    pub fn from_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        info!(
            url = transport.url(),
            log_name = config.log_name.as_str(),
            "LOG_ANALYTICS | Shipping log items"
        );
        Self::with_transport(&config, Arc::new(transport))
    }

    /// Builds a client delivering through `transport` instead of the HTTP API.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Arc::new(Mutex::new(rx));
        let stats = Arc::new(DeliveryStats::default());
        let workers = TaskTracker::new();

        for id in 0..config.worker_count {
            let worker = Worker::new(
                id,
                Arc::clone(&queue),
                Arc::clone(&transport),
                Arc::clone(&stats),
            );
            workers.spawn_on(worker.run(), &runtime);
        }
        debug!(
            worker_count = config.worker_count,
            "LOG_ANALYTICS | Workers spawned"
        );

        Ok(LogAnalytics {
            handle: LogAnalyticsHandle {
                intake: Arc::new(RwLock::new(Intake {
                    state: State::Running,
                    tx: Some(tx),
                })),
            },
            workers,
            stats,
            worker_count: config.worker_count,
        })
    }
}

impl<T> LogAnalytics<T> {
    #[must_use]
    pub fn handle(&self) -> LogAnalyticsHandle<T> {
        self.handle.clone()
    }

    pub fn add(&self, item: T) -> Result<(), Error> {
        self.handle.add(item)
    }

    pub fn add_multi<I>(&self, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        self.handle.add_multi(items)
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.handle.state()
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stops accepting items and waits until every queued item has been attempted and every
    /// worker has exited.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyFinalized`] if called more than once. The second call does not wait.
    pub async fn finalize(&self) -> Result<DrainReport, Error> {
        if !self.handle.close() {
            return Err(Error::AlreadyFinalized);
        }
        info!("LOG_ANALYTICS | Waiting for remaining log items...");

        self.workers.close();
        self.workers.wait().await;
        self.handle.stopped();

        let report = self.stats.report();
        info!(
            delivered = report.delivered,
            dropped = report.dropped,
            "LOG_ANALYTICS | All log items are sent"
        );
        Ok(report)
    }
}

impl<T> Drop for LogAnalytics<T> {
    fn drop(&mut self) {
        // Workers still drain whatever is queued, nobody waits for them.
        if self.handle.close() {
            debug!("LOG_ANALYTICS | Client dropped without finalize");
        }
    }
}

impl<T> fmt::Debug for LogAnalytics<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAnalytics")
            .field("state", &self.state())
            .field("worker_count", &self.worker_count)
            .finish_non_exhaustive()
    }
}
