//! Built-in seed alerts loaded at store initialization.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::types::{Alert, Severity};

fn raw_event(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// The three demo alerts, timestamped relative to now.
///
/// - `AL-1001` SQL injection on `/search` (High, 30 minutes ago)
/// - `AL-1002` credential stuffing (Critical, 2 hours ago)
/// - `AL-1003` bot scraping spike (Medium, 5 minutes ago)
pub fn seed_alerts() -> Vec<Alert> {
    let now = Utc::now();
    vec![
        Alert::new(
            "AL-1001",
            "WAF-Edge",
            now - Duration::minutes(30),
            Severity::High,
            "SQL Injection Pattern Detected",
            "Multiple requests containing SQL syntax characters in query parameters on /search endpoint.",
        )
        .with_raw_event(raw_event(json!({
            "ip": "192.168.45.12",
            "method": "GET",
            "path": "/search?q=%27%20OR%201%3D1--",
            "userAgent": "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
            "geo": "CN",
            "payload_b64": "JyBPUiAxPTEtLQ=="
        }))),
        Alert::new(
            "AL-1002",
            "Auth-Service",
            now - Duration::minutes(120),
            Severity::Critical,
            "Credential Stuffing Anomaly",
            "High volume of failed login attempts from single IP against multiple usernames.",
        )
        .with_raw_event(raw_event(json!({
            "ip": "45.33.22.11",
            "endpoint": "/api/v1/login",
            "failure_count": 450,
            "window_seconds": 60,
            "usernames_sample": ["admin", "root", "support", "test"]
        }))),
        Alert::new(
            "AL-1003",
            "Rate-Limiter",
            now - Duration::minutes(5),
            Severity::Medium,
            "Bot Scraping Spike",
            "Pattern matches known scraper bot behavior on product catalog pages.",
        )
        .with_raw_event(raw_event(json!({
            "ip": "10.0.5.55",
            "path_pattern": "/product/*",
            "rpm": 120,
            "threshold": 60,
            "bot_score": 0.85
        }))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_alerts() {
        let alerts = seed_alerts();
        let ids: Vec<_> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["AL-1001", "AL-1002", "AL-1003"]);
        assert_eq!(alerts[0].raw_severity, Severity::High);
        assert_eq!(alerts[0].raw_event["ip"], "192.168.45.12");
        assert!(alerts.iter().all(|a| !a.is_triaged()));
    }
}
