use crate::workflow::config::AggregatorConfig;
use anyhow::Context;
use dfcore::export::{ExportEngine, ExportReport};
use dfcore::processing::CycleAggregator;
use dfcore::receiver::{ReceiverRegistry, TelemetrySource};
use dfcore::store::FixStore;
use dfcore::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use log::{error, warn};
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unix seconds at the moment of the call.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

/// Drives the poll / aggregate / persist loop and the final export.
pub struct Runner {
    config: AggregatorConfig,
    source: Box<dyn TelemetrySource>,
    registry: ReceiverRegistry,
    aggregator: CycleAggregator,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl Runner {
    pub fn new(
        config: AggregatorConfig,
        endpoints: Vec<String>,
        source: Box<dyn TelemetrySource>,
    ) -> Self {
        let aggregator = CycleAggregator::new(config.aggregation.clone());
        Self {
            config,
            source,
            registry: ReceiverRegistry::new(endpoints),
            aggregator,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("runner"),
        }
    }

    fn aggregate(&mut self, cycle_time: i64, store: &mut dyn FixStore) {
        let snapshots = self.registry.snapshots();
        match self.aggregator.run_cycle(&snapshots, cycle_time, store) {
            Ok(outcome) => {
                self.metrics.record_cycle(outcome.fix.is_some());
                self.metrics.record_rejected_pairs(outcome.rejected_pairs);
                self.metrics.record_outliers(outcome.outliers.len());
            }
            Err(err) => {
                self.metrics.record_cycle(false);
                error!("cycle at {} not persisted: {}", cycle_time, err);
            }
        }
    }

    /// Polls until `shutdown` resolves or `max_cycles` is reached.
    ///
    /// The refresh and the inter-cycle sleep are the only points where the
    /// shutdown signal is observed; aggregation and the store append always
    /// complete first.
    pub async fn poll<F>(&mut self, store: &mut dyn FixStore, shutdown: F) -> MetricsSnapshot
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut cycles: u64 = 0;

        loop {
            let cycle_time = unix_now();
            let summary = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                summary = self.registry.refresh(&*self.source) => summary,
            };
            self.metrics.record_fetch_failures(summary.failed);
            self.aggregate(cycle_time, store);

            cycles += 1;
            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                self.logger.record(&format!("reached {} cycles", cycles));
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        let silent = self.registry.silent_endpoints();
        if !silent.is_empty() {
            warn!("never heard from: {}", silent.join(", "));
        }
        let metrics = self.metrics.snapshot();
        self.logger.record(&format!(
            "stopped after {} cycles: {} fixes, {} empty, {} fetch failures, {} rejected pairs",
            metrics.cycles,
            metrics.fixes,
            metrics.empty_cycles,
            metrics.fetch_failures,
            metrics.rejected_pairs
        ));
        metrics
    }

    /// Clusters the stored history and writes the configured GeoJSON file.
    pub fn export(&self, store: &dyn FixStore) -> anyhow::Result<ExportReport> {
        ExportEngine::new(self.config.clustering.clone())
            .export_to(store, &self.config.geofile)
            .with_context(|| format!("exporting to {}", self.config.geofile.display()))
    }
}
