//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the runtime:
//! - Store action processing and effect execution
//! - Sync client transactions
//! - Live subscriptions
//!
//! # Example
//!
//! ```rust,no_run
//! use livelist_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Serve metrics on port 9090
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the global recorder and start serving `/metrics`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or a different recorder
    /// is already installed.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(error) = exporter.await {
                tracing::error!(error = ?error, "Metrics exporter stopped");
            }
        });

        self.handle = Some(handle);
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to execute reducers"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, by type"
    );
    describe_counter!(
        "store.effects.cancelled",
        "Total number of in-flight effects aborted by cancellation"
    );

    // Sync Metrics
    describe_counter!(
        "sync.transact.submitted",
        "Total number of non-empty batches submitted"
    );
    describe_counter!(
        "sync.transact.skipped_empty",
        "Total number of empty batches that performed no transaction"
    );
    describe_counter!("sync.transact.applied", "Total number of batches applied");
    describe_counter!(
        "sync.transact.failed",
        "Total number of batches rejected by the remote"
    );
    describe_histogram!("sync.transact.batch_size", "Mutations per submitted batch");
    describe_histogram!(
        "sync.transact.duration_seconds",
        "Time taken for the remote to apply a batch"
    );
    describe_counter!("sync.subscription.opened", "Total number of subscriptions opened");
    describe_counter!(
        "sync.subscription.pushes",
        "Total number of snapshots pushed to subscriptions"
    );
    describe_counter!(
        "sync.subscription.failed",
        "Total number of subscriptions that entered the failed state"
    );
    describe_gauge!("sync.subscription.active", "Currently open subscription handles");
}

/// Sync client metrics recorder.
pub struct SyncMetrics;

impl SyncMetrics {
    /// Record a batch handed to the remote.
    pub fn record_submit(size: usize) {
        counter!("sync.transact.submitted").increment(1);
        // Note: Precision loss acceptable for metrics (batch sizes < 2^52)
        #[allow(clippy::cast_precision_loss)]
        histogram!("sync.transact.batch_size").record(size as f64);
    }

    /// Record an empty batch that was not sent.
    pub fn record_skipped_empty() {
        counter!("sync.transact.skipped_empty").increment(1);
    }

    /// Record the outcome of a transaction.
    pub fn record_outcome(applied: bool, duration: Duration) {
        if applied {
            counter!("sync.transact.applied").increment(1);
        } else {
            counter!("sync.transact.failed").increment(1);
        }
        histogram!("sync.transact.duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a subscription being opened.
    pub fn record_subscription_opened() {
        counter!("sync.subscription.opened").increment(1);
        gauge!("sync.subscription.active").increment(1.0);
    }

    /// Record a subscription handle being closed.
    pub fn record_subscription_closed() {
        gauge!("sync.subscription.active").decrement(1.0);
    }

    /// Record a snapshot push.
    pub fn record_push() {
        counter!("sync.subscription.pushes").increment(1);
    }

    /// Record a subscription failure.
    pub fn record_subscription_failed() {
        counter!("sync.subscription.failed").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    fn render_with(record: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record();
        });
        handle.render()
    }

    #[test]
    fn test_skipped_empty_batches_are_counted() {
        let rendered = render_with(|| {
            SyncMetrics::record_skipped_empty();
            SyncMetrics::record_skipped_empty();
        });

        assert!(rendered.contains("sync_transact_skipped_empty 2"), "{rendered}");
    }

    #[test]
    fn test_outcomes_split_applied_and_failed() {
        let rendered = render_with(|| {
            SyncMetrics::record_submit(3);
            SyncMetrics::record_outcome(true, Duration::from_millis(5));
            SyncMetrics::record_outcome(false, Duration::from_millis(5));
            SyncMetrics::record_outcome(false, Duration::from_millis(5));
        });

        assert!(rendered.contains("sync_transact_submitted 1"), "{rendered}");
        assert!(rendered.contains("sync_transact_applied 1"), "{rendered}");
        assert!(rendered.contains("sync_transact_failed 2"), "{rendered}");
    }

    #[test]
    fn test_subscription_gauge_tracks_open_handles() {
        let rendered = render_with(|| {
            SyncMetrics::record_subscription_opened();
            SyncMetrics::record_subscription_opened();
            SyncMetrics::record_subscription_closed();
            SyncMetrics::record_push();
        });

        assert!(rendered.contains("sync_subscription_active"), "{rendered}");
        assert!(rendered.contains("sync_subscription_opened 2"), "{rendered}");
        assert!(rendered.contains("sync_subscription_pushes 1"), "{rendered}");
    }

    #[tokio::test]
    async fn test_metrics_server_start_installs_recorder() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        assert!(server.handle().is_some());
        SyncMetrics::record_skipped_empty();
        let rendered = server.render().unwrap();
        assert!(rendered.contains("sync_transact_skipped_empty"), "{rendered}");
    }
}
