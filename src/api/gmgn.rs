use chrono::Local;
use log::{info, warn};

use crate::api::Collector;
use crate::core::model::{format_timestamp, Token};
use crate::error::WatchError;

/// Page the real scraper would read. Kept for log output only.
pub const GMGN_TRENDING_URL: &str = "https://gmgn.ai/?chain=sol&tab=home";

// symbol, name, price, change_24h, market_cap, volume_24h
const MOCK_TOKENS: [(&str, &str, f64, f64, f64, f64); 3] = [
    ("PEPE", "Pepe Token", 0.000012, 45.2, 5_000_000.0, 2_500_000.0),
    ("DOGE", "Dogecoin Style", 0.0025, -12.5, 10_000_000.0, 3_000_000.0),
    ("MOON", "Moon Token", 0.15, 125.8, 25_000_000.0, 8_000_000.0),
];

/// Stand-in for the GMGN trending page: the same three tokens every time,
/// stamped with the collection instant.
#[derive(Debug, Clone, Default)]
pub struct MockCollector;

impl MockCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Collector for MockCollector {
    fn try_collect(&self) -> Result<Vec<Token>, WatchError> {
        info!("Collecting trending tokens (mock data for {})", GMGN_TRENDING_URL);
        let timestamp = format_timestamp(Local::now());

        let tokens: Vec<Token> = MOCK_TOKENS
            .iter()
            .map(
                |&(symbol, name, price, change_24h, market_cap, volume_24h)| Token {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    price,
                    change_24h,
                    market_cap,
                    volume_24h,
                    timestamp: timestamp.clone(),
                },
            )
            .filter(|token| match token.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping token: {}", e);
                    false
                }
            })
            .collect();

        if tokens.is_empty() {
            return Err(WatchError::Collection("no valid tokens found".to_string()));
        }
        Ok(tokens)
    }
}
