//! Engine assembly and lifecycle
//!
//! One `HotnessEngine` per process, constructed explicitly in `main` and
//! passed by `Arc` into the HTTP adapter and background tasks. No global
//! singletons: construction and shutdown are owned by the entry point.

use crate::audit::ConsistencyAuditor;
use crate::batch::BatchScheduler;
use crate::cache::FastStore;
use crate::metrics::EngineMetrics;
use crate::service::HotnessService;
use artrank_common::db::DurableStore;
use artrank_common::{Error, RankingConfig, Result};
use std::sync::Arc;
use tracing::info;

pub struct HotnessEngine {
    config: Arc<RankingConfig>,
    fast: Arc<dyn FastStore>,
    service: HotnessService,
    scheduler: Arc<BatchScheduler>,
    auditor: Arc<ConsistencyAuditor>,
    metrics: Arc<EngineMetrics>,
}

impl HotnessEngine {
    pub fn new(config: RankingConfig, durable: DurableStore, fast: Arc<dyn FastStore>) -> Self {
        let config = Arc::new(config);
        let metrics = Arc::new(EngineMetrics::new());

        let service = HotnessService::new(
            fast.clone(),
            durable.clone(),
            config.clone(),
            metrics.clone(),
        );
        let scheduler = Arc::new(BatchScheduler::new(
            fast.clone(),
            durable.clone(),
            config.clone(),
            metrics.clone(),
        ));
        let auditor = Arc::new(ConsistencyAuditor::new(
            fast.clone(),
            durable,
            config.clone(),
            metrics.clone(),
        ));

        Self {
            config,
            fast,
            service,
            scheduler,
            auditor,
            metrics,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn fast_store(&self) -> &Arc<dyn FastStore> {
        &self.fast
    }

    pub fn service(&self) -> &HotnessService {
        &self.service
    }

    pub fn scheduler(&self) -> &Arc<BatchScheduler> {
        &self.scheduler
    }

    pub fn auditor(&self) -> &Arc<ConsistencyAuditor> {
        &self.auditor
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Spawn the timer-driven background tasks: batch flush and periodic
    /// audit.
    pub fn start_background_tasks(&self) {
        tokio::spawn(self.scheduler.clone().run_flush_timer());
        tokio::spawn(self.auditor.clone().run_periodic());
    }

    /// Drain the batch queue before exit. A final flush with failed groups
    /// surfaces as `BatchPartialFailure` so the operator sees what was lost.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down: draining batch queue");
        let report = self.scheduler.flush_queue().await;
        if report.failed > 0 {
            return Err(Error::BatchPartialFailure {
                processed: report.processed,
                failed: report.failed,
            });
        }
        Ok(())
    }
}
