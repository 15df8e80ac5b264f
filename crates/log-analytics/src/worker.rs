// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

use crate::envelope::Envelope;
use crate::error::ShippingError;
use crate::http::error_chain;
use crate::transport::Transport;

/// Receiving end of the dispatch queue, shared by every worker of a pool.
pub(crate) type SharedQueue<T> = Arc<Mutex<mpsc::UnboundedReceiver<T>>>;

/// Outcome counters of a client, reported by `finalize`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl DeliveryStats {
    pub(crate) fn report(&self) -> DrainReport {
        DrainReport {
            delivered: self.delivered.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
        }
    }
}

pub(crate) struct Worker<T> {
    id: usize,
    queue: SharedQueue<T>,
    transport: Arc<dyn Transport>,
    stats: Arc<DeliveryStats>,
}

impl<T: Serialize + Send + 'static> Worker<T> {
    pub(crate) fn new(
        id: usize,
        queue: SharedQueue<T>,
        transport: Arc<dyn Transport>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Worker {
            id,
            queue,
            transport,
            stats,
        }
    }

    /// Takes items off the queue until it is closed and empty.
    pub(crate) async fn run(self) {
        debug!(worker_id = self.id, "LOG_ANALYTICS | Worker started");
        loop {
            // The lock is released before shipping so other workers can dequeue meanwhile.
            let next = self.queue.lock().await.recv().await;
            let Some(item) = next else {
                break;
            };
            self.ship(item).await;
        }
        debug!(worker_id = self.id, "LOG_ANALYTICS | Queue closed, worker stopped");
    }

    async fn ship(&self, item: T) {
        match self.deliver(item).await {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::AcqRel);
            }
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::AcqRel);
                report(self.id, &e);
            }
        }
    }

    async fn deliver(&self, item: T) -> Result<(), ShippingError> {
        // Stamped here, not at enqueue time, so queueing delay shows in TimeGenerated.
        let body = Envelope::build(&item)?.to_body()?;
        self.transport.deliver(body).await
    }
}

fn report(worker_id: usize, err: &ShippingError) {
    match err {
        ShippingError::Destination { status, body } => {
            error!(
                worker_id,
                status = status.as_u16(),
                "LOG_ANALYTICS | Could not insert log item ({status}): {body}"
            );
        }
        other => {
            error!(
                worker_id,
                "LOG_ANALYTICS | Dropping log item: {}",
                error_chain(other)
            );
        }
    }
}
