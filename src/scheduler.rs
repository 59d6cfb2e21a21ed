use chrono::Local;
use log::{error, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::api::Collector;
use crate::core::pipeline::{Pipeline, PipelineReport};

/// Re-runs the pipeline on a fixed interval, starting immediately.
pub struct Scheduler<C> {
    pipeline: Arc<Pipeline<C>>,
    interval: Duration,
}

impl<C: Collector + 'static> Scheduler<C> {
    pub fn new(pipeline: Arc<Pipeline<C>>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Runs until Ctrl+C.
    pub async fn run(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Runs until `shutdown` resolves. A run already in progress is allowed to finish.
    pub async fn run_until<F: Future<Output = ()>>(self, shutdown: F) -> usize {
        info!(
            "Monitoring started, collecting every {} seconds",
            self.interval.as_secs()
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.run_once().await;
                    runs += 1;
                }
            }
        }
        info!("Monitoring stopped after {} runs", runs);
        runs
    }

    pub async fn run_once(&self) -> Option<PipelineReport> {
        info!(
            "{} - scheduled collection starting",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let pipeline = Arc::clone(&self.pipeline);
        match tokio::task::spawn_blocking(move || pipeline.run()).await {
            Ok(report) => {
                if report.is_empty() {
                    info!("Scheduled collection finished without data");
                } else {
                    info!(
                        "Scheduled collection finished: {} tokens, {} alerts",
                        report.snapshot.len(),
                        report.alerts.len()
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!("Scheduled collection panicked: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gmgn::MockCollector;
    use crate::core::store::SnapshotStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn runs_immediately_and_then_on_interval() {
        let dir = tempdir().unwrap();
        let pipeline = Arc::new(Pipeline::new(
            MockCollector::new(),
            SnapshotStore::new(dir.path()),
            30.0,
        ));
        let scheduler = Scheduler::new(Arc::clone(&pipeline), Duration::from_millis(50));

        let runs = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(300)))
            .await;

        assert!(runs >= 2, "expected at least two runs, got {}", runs);
        let files = pipeline.store().list_files().unwrap();
        // every run adds one history file; latest.json is shared
        assert_eq!(files.len(), runs + 1);
    }

    #[tokio::test]
    async fn run_once_reports_alerts() {
        let dir = tempdir().unwrap();
        let pipeline = Arc::new(Pipeline::new(
            MockCollector::new(),
            SnapshotStore::new(dir.path()),
            30.0,
        ));
        let scheduler = Scheduler::new(pipeline, Duration::from_secs(600));

        let report = scheduler.run_once().await.unwrap();
        let symbols: Vec<&str> = report.alerts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, ["PEPE", "MOON"]);
    }
}
