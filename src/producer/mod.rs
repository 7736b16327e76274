//! Sample Production
//!
//! Background loop that generates one sample per period and hands it to the
//! dispatcher. Ticks never overlap: the next sleep starts only after the
//! current generation and broadcast finish.

mod sample;

pub use sample::{SampleSource, SimulatedMetrics};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::websocket::Dispatcher;

/// Fixed-period producer feeding the dispatcher
pub struct ProductionLoop {
    dispatcher: Arc<Dispatcher>,
    source: Arc<dyn SampleSource>,
    period: Duration,
}

impl ProductionLoop {
    pub fn new(dispatcher: Arc<Dispatcher>, source: Arc<dyn SampleSource>, period: Duration) -> Self {
        Self {
            dispatcher,
            source,
            period,
        }
    }

    /// Generate one sample and broadcast it
    pub async fn tick(&self) {
        let sample = self.source.sample();

        match sample.to_payload() {
            Ok(payload) => self.dispatcher.broadcast(&payload).await,
            Err(e) => tracing::error!(error = %e, "Failed to serialize sample, skipping tick"),
        }
    }

    /// Run until cancelled
    ///
    /// Cancellation is observed both while sleeping and while a tick is in
    /// flight; an interrupted tick is abandoned.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(period_ms = self.period.as_millis() as u64, "Production loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.period) => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.tick() => {}
            }
        }

        tracing::info!("Production loop stopped");
    }

    /// Start the loop on a background task
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
