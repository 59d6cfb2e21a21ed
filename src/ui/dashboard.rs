use num_format::{Locale, ToFormattedString};
use serde_json::Value;
use std::fmt::Write;

use crate::core::alerts::{self, AlertMessage};
use crate::core::model::{number_field, parse_timestamp, text_field, Snapshot};

/// Everything the HTML page shows, derived from one snapshot.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub snapshot: &'a Snapshot,
    pub alerts: Vec<AlertMessage>,
    pub pumping_count: usize,
    pub last_update: String,
}

impl<'a> DashboardView<'a> {
    pub fn new(snapshot: &'a Snapshot, alert_threshold: f64, pumping_threshold: f64) -> Self {
        Self {
            snapshot,
            alerts: alerts::evaluate(snapshot, alert_threshold),
            pumping_count: alerts::count_pumping(snapshot, pumping_threshold),
            last_update: last_update(snapshot),
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(8 * 1024);
        html.push_str(PAGE_HEAD);

        let _ = write!(
            html,
            r#"        <div class="stats">
            <div class="stat-card"><div class="stat-value">{}</div><div>Total tokens</div></div>
            <div class="stat-card"><div class="stat-value">{}</div><div>Pumping tokens</div></div>
            <div class="stat-card"><div class="stat-value">{}</div><div>Last update</div></div>
        </div>
"#,
            self.snapshot.len(),
            self.pumping_count,
            escape_html(&self.last_update)
        );

        if !self.alerts.is_empty() {
            html.push_str("        <div class=\"alert-section\">\n            <h3>Pump alerts</h3>\n");
            for alert in &self.alerts {
                let _ = writeln!(html, "            <div>{}</div>", escape_html(&alert.to_string()));
            }
            html.push_str("        </div>\n");
        }

        html.push_str(TABLE_HEAD);
        for record in self.snapshot.records() {
            render_row(&mut html, record);
        }
        html.push_str(PAGE_TAIL);
        html
    }
}

fn render_row(html: &mut String, record: &Value) {
    let symbol = text_field(record, "symbol").unwrap_or("");
    let name = text_field(record, "name").unwrap_or("");
    let change = number_field(record, "change_24h").unwrap_or(0.0);
    let class = if change > 0.0 { "positive" } else { "negative" };

    let _ = write!(
        html,
        r#"                    <tr>
                        <td><strong>{}</strong><br><small style="color: #666;">{}</small></td>
                        <td>{}</td>
                        <td class="{}">{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>
"#,
        escape_html(symbol),
        escape_html(name),
        format_price(number_field(record, "price").unwrap_or(0.0)),
        class,
        format_change(change),
        format_usd(number_field(record, "market_cap").unwrap_or(0.0)),
        format_usd(number_field(record, "volume_24h").unwrap_or(0.0)),
    );
}

/// `HH:MM:SS` of the first record's timestamp, or "just now".
pub fn last_update(snapshot: &Snapshot) -> String {
    snapshot
        .records()
        .first()
        .and_then(|record| text_field(record, "timestamp").ok())
        .and_then(parse_timestamp)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "just now".to_string())
}

pub fn format_price(price: f64) -> String {
    format!("${:.6}", price)
}

pub fn format_change(change: f64) -> String {
    format!("{:+.1}%", change)
}

/// Whole dollars with thousands separators.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
        return format!("${:.0}", amount);
    }
    format!("${}", (rounded as i64).to_formatted_string(&Locale::en))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GMGN Tracker</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 20px; border-radius: 10px; margin-bottom: 20px; text-align: center; }
        .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); text-align: center; }
        .stat-value { font-size: 2em; font-weight: bold; color: #667eea; }
        .tokens-table { background: white; border-radius: 10px; overflow: hidden; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        table { width: 100%; border-collapse: collapse; }
        th { background: #667eea; color: white; padding: 15px; text-align: left; }
        td { padding: 15px; border-bottom: 1px solid #eee; }
        .positive { color: #28a745; font-weight: bold; }
        .negative { color: #dc3545; font-weight: bold; }
        .refresh-btn { background: #28a745; color: white; padding: 10px 20px; border: none; border-radius: 5px; cursor: pointer; margin: 10px 0; }
        .refresh-btn:hover { background: #218838; }
        .alert-section { background: #fff3cd; border: 1px solid #ffeaa7; border-radius: 10px; padding: 20px; margin-bottom: 20px; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>GMGN Tracker</h1>
            <p>Trending token monitor</p>
        </div>
"#;

const TABLE_HEAD: &str = r#"        <button class="refresh-btn" onclick="location.reload()">Refresh</button>
        <button class="refresh-btn" onclick="manualUpdate()" style="background: #007bff;">Collect now</button>

        <div class="tokens-table">
            <table>
                <thead>
                    <tr>
                        <th>Token</th>
                        <th>Price (USD)</th>
                        <th>24h change</th>
                        <th>Market cap</th>
                        <th>Volume</th>
                    </tr>
                </thead>
                <tbody>
"#;

const PAGE_TAIL: &str = r#"                </tbody>
            </table>
        </div>
    </div>

    <script>
        async function manualUpdate() {
            try {
                const response = await fetch('/api/update', { method: 'POST' });
                const result = await response.json();
                if (result.success) {
                    alert('Data updated');
                    location.reload();
                } else {
                    alert('Update failed: ' + result.error);
                }
            } catch (error) {
                alert('Update failed: ' + error.message);
            }
        }

        setInterval(() => location.reload(), 30000);
    </script>
</body>
</html>
"#;
