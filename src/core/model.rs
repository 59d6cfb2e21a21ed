use chrono::{DateTime, Local, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::WatchError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One market instrument at the instant it was collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub timestamp: String,
}

impl Token {
    pub fn validate(&self) -> Result<(), WatchError> {
        let invalid = |reason: &str| WatchError::InvalidToken {
            symbol: self.symbol.clone(),
            reason: reason.to_string(),
        };

        let len = self.symbol.chars().count();
        if !(2..=10).contains(&len) {
            return Err(invalid("symbol must be 2-10 characters"));
        }
        if self.symbol.chars().any(char::is_lowercase)
            || !self.symbol.chars().any(char::is_uppercase)
        {
            return Err(invalid("symbol must be uppercase"));
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(invalid("price must be positive"));
        }
        if !(self.market_cap.is_finite() && self.market_cap > 0.0) {
            return Err(invalid("market cap must be positive"));
        }
        if !(self.volume_24h.is_finite() && self.volume_24h >= 0.0) {
            return Err(invalid("volume must be non-negative"));
        }
        if !self.change_24h.is_finite() {
            return Err(invalid("24h change must be a finite number"));
        }
        Ok(())
    }

    /// JSON object with the fields in declaration order.
    pub fn to_record(&self) -> Value {
        json!({
            "symbol": self.symbol,
            "name": self.name,
            "price": self.price,
            "change_24h": self.change_24h,
            "market_cap": self.market_cap,
            "volume_24h": self.volume_24h,
            "timestamp": self.timestamp,
        })
    }
}

/// ISO-8601 local time with microseconds, e.g. `2024-01-01T12:00:00.123456`.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts RFC 3339 (with offset or `Z`) as well as naive ISO-8601 local times.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Ordered records captured at one collection instant.
///
/// Records stay as raw JSON so a snapshot loaded from disk can carry entries
/// that do not match [`Token`]; readers pull fields out with [`text_field`]
/// and [`number_field`] and skip what they cannot use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<Value>,
}

impl Snapshot {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self {
            records: tokens.iter().map(Token::to_record).collect(),
        }
    }

    pub fn from_records(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Typed view of the records. Entries that do not deserialize are logged and skipped.
    pub fn tokens(&self) -> Vec<Token> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                match serde_json::from_value::<Token>(record.clone()) {
                    Ok(token) => Some(token),
                    Err(e) => {
                        warn!("Skipping record {} in snapshot: {}", index, e);
                        None
                    }
                }
            })
            .collect()
    }
}

pub fn text_field<'a>(record: &'a Value, key: &str) -> Result<&'a str, WatchError> {
    match record.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(WatchError::MalformedRecord(format!(
            "field '{}' is not a string: {}",
            key, other
        ))),
        None if record.is_object() => Err(WatchError::MalformedRecord(format!(
            "missing field '{}'",
            key
        ))),
        None => Err(WatchError::MalformedRecord(format!(
            "record is not an object: {}",
            record
        ))),
    }
}

pub fn number_field(record: &Value, key: &str) -> Result<f64, WatchError> {
    match record.get(key) {
        Some(value) => value.as_f64().ok_or_else(|| {
            WatchError::MalformedRecord(format!("field '{}' is not a number: {}", key, value))
        }),
        None if record.is_object() => Err(WatchError::MalformedRecord(format!(
            "missing field '{}'",
            key
        ))),
        None => Err(WatchError::MalformedRecord(format!(
            "record is not an object: {}",
            record
        ))),
    }
}
