use log::warn;
use serde::Serialize;
use std::fmt;

use crate::core::model::{number_field, text_field, Snapshot};
use crate::error::WatchError;

pub const DEFAULT_ALERT_THRESHOLD: f64 = 30.0;
pub const DEFAULT_PUMPING_THRESHOLD: f64 = 20.0;

/// A token whose 24h change crossed the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    pub symbol: String,
    pub change_24h: f64,
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is up by {:+.1}%", self.symbol, self.change_24h)
    }
}

fn alert_fields(record: &serde_json::Value) -> Result<(&str, f64), WatchError> {
    let symbol = text_field(record, "symbol")?;
    let change = number_field(record, "change_24h")?;
    Ok((symbol, change))
}

/// Scans `snapshot` in order and reports every record with `change_24h > threshold`.
///
/// A record without a string `symbol` or a numeric `change_24h` is logged and
/// skipped; it never stops the scan.
pub fn evaluate(snapshot: &Snapshot, threshold: f64) -> Vec<AlertMessage> {
    let mut alerts = Vec::new();
    for (index, record) in snapshot.records().iter().enumerate() {
        match alert_fields(record) {
            Ok((symbol, change)) => {
                if change > threshold {
                    alerts.push(AlertMessage {
                        symbol: symbol.to_string(),
                        change_24h: change,
                    });
                }
            }
            Err(e) => warn!("Ignoring record {} during alert scan: {}", index, e),
        }
    }
    alerts
}

/// Number of records whose 24h change is above `threshold`, malformed records excluded.
pub fn count_pumping(snapshot: &Snapshot, threshold: f64) -> usize {
    snapshot
        .records()
        .iter()
        .filter_map(|record| number_field(record, "change_24h").ok())
        .filter(|change| *change > threshold)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(entries: &[(&str, f64)]) -> Snapshot {
        Snapshot::from_records(
            entries
                .iter()
                .map(|(symbol, change)| json!({ "symbol": symbol, "change_24h": change }))
                .collect(),
        )
    }

    #[test]
    fn flags_only_pumping_tokens() {
        let data = snapshot(&[("PUMP", 50.0), ("STABLE", 5.0), ("DUMP", -20.0)]);
        let alerts = evaluate(&data, DEFAULT_ALERT_THRESHOLD);
        assert_eq!(alerts.len(), 1);
        let text = alerts[0].to_string();
        assert!(text.contains("PUMP"));
        assert!(text.contains("50.0%"));
    }

    #[test]
    fn message_is_sign_formatted() {
        let alert = AlertMessage {
            symbol: "MOON".to_string(),
            change_24h: 125.84,
        };
        assert_eq!(alert.to_string(), "MOON is up by +125.8%");
    }

    #[test]
    fn threshold_is_strict() {
        let data = snapshot(&[("EDGE", 30.0), ("OVER", 30.1)]);
        let alerts = evaluate(&data, DEFAULT_ALERT_THRESHOLD);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "OVER");
    }

    #[test]
    fn empty_snapshot_yields_no_alerts() {
        assert!(evaluate(&Snapshot::default(), DEFAULT_ALERT_THRESHOLD).is_empty());
        assert!(evaluate(&Snapshot::default(), -1000.0).is_empty());
    }

    #[test]
    fn malformed_records_do_not_stop_the_scan() {
        let data = Snapshot::from_records(vec![
            json!({ "symbol": "FIRST", "change_24h": 40.0 }),
            json!({ "symbol": "NOCHANGE" }),
            json!({ "change_24h": 99.0 }),
            json!({ "symbol": "TEXT", "change_24h": "80" }),
            json!({ "symbol": null, "change_24h": 70.0 }),
            json!("not an object"),
            json!({ "symbol": "LAST", "change_24h": 31 }),
        ]);
        let symbols: Vec<String> = evaluate(&data, DEFAULT_ALERT_THRESHOLD)
            .into_iter()
            .map(|a| a.symbol)
            .collect();
        assert_eq!(symbols, ["FIRST", "LAST"]);
    }

    #[test]
    fn alerts_keep_input_order() {
        let data = snapshot(&[
            ("LOW", 5.0),
            ("EXTREME", 150.0),
            ("MID", 25.0),
            ("HIGH", 45.0),
        ]);
        let symbols: Vec<String> = evaluate(&data, 30.0).into_iter().map(|a| a.symbol).collect();
        assert_eq!(symbols, ["EXTREME", "HIGH"]);
    }

    #[test]
    fn pumping_count_uses_its_own_threshold() {
        let data = snapshot(&[("A", 25.0), ("B", 45.0), ("C", 10.0)]);
        assert_eq!(count_pumping(&data, DEFAULT_PUMPING_THRESHOLD), 2);
        assert_eq!(count_pumping(&data, DEFAULT_ALERT_THRESHOLD), 1);
        let broken = Snapshot::from_records(vec![json!({ "symbol": "X" }), json!(1)]);
        assert_eq!(count_pumping(&broken, DEFAULT_PUMPING_THRESHOLD), 0);
    }
}
