pub mod gmgn;

use log::error;

use crate::core::model::Token;
use crate::error::WatchError;

/// Source of token records for one collection cycle.
///
/// Implementors only provide [`Collector::try_collect`]. Pipeline code calls
/// [`Collector::collect`], which turns every failure into "no data this cycle".
/// A networked implementation must enforce its own timeout and report it as
/// an error from `try_collect`.
pub trait Collector: Send + Sync {
    fn try_collect(&self) -> Result<Vec<Token>, WatchError>;

    fn collect(&self) -> Vec<Token> {
        match self.try_collect() {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Collection failed: {}", e);
                Vec::new()
            }
        }
    }
}
