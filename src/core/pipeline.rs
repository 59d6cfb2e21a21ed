use log::{info, warn};
use std::sync::Mutex;

use crate::api::Collector;
use crate::core::alerts::{self, AlertMessage};
use crate::core::model::Snapshot;
use crate::core::store::{PersistResult, SnapshotStore};

/// Result of one collect -> persist -> evaluate run.
#[derive(Debug)]
pub struct PipelineReport {
    pub snapshot: Snapshot,
    /// `None` when nothing was collected and nothing was written.
    pub persisted: Option<PersistResult>,
    pub alerts: Vec<AlertMessage>,
}

impl PipelineReport {
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

pub struct Pipeline<C> {
    collector: C,
    store: SnapshotStore,
    alert_threshold: f64,
    running: Mutex<()>,
}

impl<C: Collector> Pipeline<C> {
    pub fn new(collector: C, store: SnapshotStore, alert_threshold: f64) -> Self {
        Self {
            collector,
            store,
            alert_threshold,
            running: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn alert_threshold(&self) -> f64 {
        self.alert_threshold
    }

    /// Runs the whole pipeline once. Concurrent callers in this process wait their turn.
    pub fn run(&self) -> PipelineReport {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let tokens = self.collector.collect();
        if tokens.is_empty() {
            warn!("Collector returned no data this cycle");
            return PipelineReport {
                snapshot: Snapshot::default(),
                persisted: None,
                alerts: Vec::new(),
            };
        }
        info!("Collected {} tokens", tokens.len());

        let snapshot = Snapshot::from_tokens(&tokens);
        let persisted = self.store.persist(&snapshot);
        let alerts = alerts::evaluate(&snapshot, self.alert_threshold);
        for alert in &alerts {
            info!("Alert: {}", alert);
        }

        PipelineReport {
            snapshot,
            persisted: Some(persisted),
            alerts,
        }
    }
}
