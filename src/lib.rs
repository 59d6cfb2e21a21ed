pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod ui;

pub use crate::api::gmgn::MockCollector;
pub use crate::api::Collector;
pub use crate::config::AppConfig;
pub use crate::core::alerts::{evaluate, AlertMessage};
pub use crate::core::model::{Snapshot, Token};
pub use crate::core::pipeline::{Pipeline, PipelineReport};
pub use crate::core::store::{PersistResult, SnapshotStore};
pub use crate::error::WatchError;
