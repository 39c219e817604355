//! Deterministic stand-in collaborator.
//!
//! Used when no model is configured and as the fallback when a real
//! collaborator fails. Results depend only on the input, never on time or
//! randomness (apart from the optional simulated latency).

use std::sync::OnceLock;
use std::time::Duration;
use async_trait::async_trait;
use regex_lite::Regex;

use super::report::render_incident_report;
use super::{Collaborator, CollaboratorError, Investigation};
use crate::types::{
    Action, AiTriage, Alert, Case, Confidence, Indicator, ResponsePlan, Severity,
};

/// Investigation/plan template chosen from the first linked alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playbook {
    SqlInjection,
    CredentialStuffing,
}

impl Playbook {
    fn for_alerts(alerts: &[Alert]) -> Self {
        match alerts.first() {
            Some(alert) if alert.title.contains("SQL") => Self::SqlInjection,
            _ => Self::CredentialStuffing,
        }
    }
}

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\b")
            .expect("static IPv4 pattern is valid")
    })
}

/// Collect IPv4 addresses from every string value in a JSON payload.
fn collect_ipv4(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            for m in ipv4_pattern().find_iter(s) {
                if !out.iter().any(|seen| seen == m.as_str()) {
                    out.push(m.as_str().to_string());
                }
            }
        }
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_ipv4(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| collect_ipv4(v, out)),
        _ => {}
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Deterministic collaborator with canned results.
#[derive(Debug, Clone, Default)]
pub struct StubCollaborator {
    latency: Option<Duration>,
}

impl StubCollaborator {
    /// Create a stub that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate model think time on every async call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn think(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Canned or rule-based triage for an alert.
    pub fn triage(&self, alert: &Alert) -> AiTriage {
        if let Some(canned) = Self::canned_triage(alert) {
            return canned;
        }

        let mut summary = format!("Automated analysis detected pattern matching {}.", alert.title);
        let mut rationale = format!(
            "The event displays characteristics of {} with {} severity indicators.",
            alert.title, alert.raw_severity
        );
        let mut iocs = vec![Indicator::new("Source", alert.source_system.clone())];
        let mut checks = strings(&["Verify user activity", "Check system logs"]);

        let title = alert.title.as_str();
        if title.contains("PowerShell") {
            summary = "Detected encoded PowerShell command execution often associated with malware loaders or lateral movement tools like Cobalt Strike.".to_string();
            rationale = "Base64 encoded arguments and execution policy bypass flags were observed in the process launch string.".to_string();
            iocs.push(Indicator::new("Process", "powershell.exe -enc"));
            checks = strings(&[
                "Inspect full command line arguments",
                "Check parent process relationship",
                "Isolate host if unapproved",
            ]);
        } else if title.contains("Egress") {
            summary = "Unusual volume of outbound traffic detected to an unclassified IP address, potentially indicating data exfiltration.".to_string();
            rationale = "Traffic volume (5GB+) exceeds historical baseline for this host by 400% during non-business hours.".to_string();
            iocs.push(Indicator::new("IP", "198.51.100.23"));
            checks = strings(&[
                "Verify destination IP reputation",
                "Check file access logs around timestamp",
                "Review DLP alerts",
            ]);
        } else if title.contains("Admin") {
            summary = "Privileged account creation detected outside of scheduled maintenance windows.".to_string();
            rationale = "Creation of 'admin' level user from a non-administrative subnet triggers this high-fidelity alert.".to_string();
            iocs.push(Indicator::new("User", "temp_admin_01"));
            checks = strings(&[
                "Contact the user immediately",
                "Verify change management ticket",
                "Disable account pending review",
            ]);
        } else if title.contains("Scan") {
            summary = "Horizontal port scan detected originating from internal asset.".to_string();
            rationale = "Rapid connection attempts to multiple hosts on ports 445 and 3389 indicates potential lateral movement reconnaissance.".to_string();
            iocs.push(Indicator::new("Port", "445, 3389"));
            checks = strings(&[
                "Isolate source host",
                "Scan source host for malware",
                "Review firewall deny logs",
            ]);
        } else if title.contains("Travel") {
            summary = "Impossible travel detected for user account.".to_string();
            rationale = "Sequential logins from geographically distant locations (London -> Tokyo) within impossible timeframe (5 mins).".to_string();
            iocs.push(Indicator::new("Geo", "London / Tokyo"));
            checks = strings(&[
                "Force password reset",
                "Review session logs",
                "Contact user for verification",
            ]);
        }

        let mut addresses = Vec::new();
        for value in alert.raw_event.values() {
            collect_ipv4(value, &mut addresses);
        }
        for address in addresses {
            if !iocs.iter().any(|i| i.ioc_type == "IP" && i.value == address) {
                iocs.push(Indicator::new("IP", address));
            }
        }

        AiTriage {
            summary,
            severity: alert.raw_severity,
            rationale,
            iocs,
            recommended_checks: checks,
        }
    }

    fn canned_triage(alert: &Alert) -> Option<AiTriage> {
        let triage = match alert.id.as_str() {
            "AL-1001" => AiTriage {
                summary: "Detected a classic SQL Injection attempt targeting the search endpoint. The payload uses a tautology (' OR 1=1) to bypass authentication or retrieve unauthorized data.".to_string(),
                severity: Severity::High,
                rationale: "High confidence pattern match for SQLi. The payload is explicitly malicious and targeted at a database interaction point.".to_string(),
                iocs: vec![
                    Indicator::new("IP", "192.168.45.12"),
                    Indicator::new("Path", "/search"),
                ],
                recommended_checks: strings(&[
                    "Check database logs for syntax errors around the timestamp.",
                    "Verify if WAF blocked the request (usually 403 status).",
                    "Correlate IP with other recent suspicious activity.",
                ]),
            },
            "AL-1002" => AiTriage {
                summary: "Significant Credential Stuffing attack observed. Single IP attempting to brute force multiple high-value accounts (admin, root) with high frequency.".to_string(),
                severity: Severity::Critical,
                rationale: "Volume of requests (450 in 60s) exceeds human capability. Targeting privileged accounts poses immediate takeover risk.".to_string(),
                iocs: vec![
                    Indicator::new("IP", "45.33.22.11"),
                    Indicator::new("UserAgent", "Hydra/9.1"),
                ],
                recommended_checks: strings(&[
                    "Check for any successful logins (HTTP 200) from this IP.",
                    "Verify global account lockouts for targeted users.",
                    "Inspect firewall logs for other ports accessed by this IP.",
                ]),
            },
            "AL-1003" => AiTriage {
                summary: "Automated scraping detected on product pages. Rate of requests indicates non-human behavior, likely a price scraper or content aggregator.".to_string(),
                severity: Severity::Medium,
                rationale: "While not an exploit, this consumes resources and violates ToS. Low immediate security risk to data integrity.".to_string(),
                iocs: vec![
                    Indicator::new("IP", "10.0.5.55"),
                    Indicator::new("Pattern", "/product/*"),
                ],
                recommended_checks: strings(&[
                    "Check User-Agent string distribution.",
                    "Verify impact on server load/latency.",
                    "Check if IP belongs to a known cloud provider (AWS, GCP) or residential proxy.",
                ]),
            },
            _ => return None,
        };
        Some(triage)
    }

    /// Template investigation for a set of linked alerts.
    pub fn investigation(&self, alerts: &[Alert]) -> Investigation {
        match Playbook::for_alerts(alerts) {
            Playbook::SqlInjection => Investigation {
                hypothesis: "The attacker is probing for SQL injection vulnerabilities in the `q` parameter of the search function. They are likely using an automated tool (like SQLMap) given the standard payload syntax.".to_string(),
                confidence: Confidence::clamped(95),
                phase: "Delivery / Exploitation".to_string(),
                example_queries: strings(&[
                    r#"source="waf" | where ip == "192.168.45.12" | stats count by status_code"#,
                    r#"source="db_audit" | where query contains "OR 1=1""#,
                    r#"source="access_log" | where uri matches "/search.*" AND status == 200"#,
                ]),
            },
            Playbook::CredentialStuffing => Investigation {
                hypothesis: "This is a distributed brute-force attack. The attacker possesses a list of valid usernames and is cycling through common passwords. The source IP is likely a compromised proxy.".to_string(),
                confidence: Confidence::clamped(98),
                phase: "Credential Access".to_string(),
                example_queries: strings(&[
                    r#"source="auth_logs" | where ip == "45.33.22.11" | stats count by result"#,
                    r#"source="auth_logs" | where result == "success" AND ip == "45.33.22.11""#,
                    r#"source="firewall" | where src_ip == "45.33.22.11""#,
                ]),
            },
        }
    }

    /// Template response plan for a set of linked alerts.
    pub fn response_plan(&self, alerts: &[Alert]) -> ResponsePlan {
        match Playbook::for_alerts(alerts) {
            Playbook::SqlInjection => ResponsePlan {
                actions: vec![
                    Action::proposed(
                        "act_1",
                        "block_ip",
                        "Block IP 192.168.45.12 on Edge Firewall",
                        "Will block all traffic from this IP. Low collateral risk if IP is non-residential.",
                    ),
                    Action::proposed(
                        "act_2",
                        "patch_waf",
                        "Apply WAF Virtual Patch for CVE-2024-XYZ",
                        "Prevents this specific SQLi pattern globally.",
                    ),
                ],
                rollback_steps: strings(&["Remove IP from Edge Deny List", "Disable WAF Rule 90021"]),
            },
            Playbook::CredentialStuffing => ResponsePlan {
                actions: vec![
                    Action::proposed("act_1", "block_ip", "Block IP 45.33.22.11", "Immediate mitigation."),
                    Action::proposed(
                        "act_2",
                        "reset_creds",
                        "Force Password Reset for targeted Admins",
                        "High user friction, but necessary if any success suspected.",
                    ),
                ],
                rollback_steps: strings(&["Unban IP", "Unlock accounts manually"]),
            },
        }
    }

    /// Markdown report for a case.
    pub fn report(&self, case: &Case) -> String {
        render_incident_report(case)
    }
}

#[async_trait]
impl Collaborator for StubCollaborator {
    async fn triage_alert(&self, alert: &Alert) -> Result<AiTriage, CollaboratorError> {
        self.think().await;
        Ok(self.triage(alert))
    }

    async fn investigate_case(
        &self,
        _case: &Case,
        alerts: &[Alert],
    ) -> Result<Investigation, CollaboratorError> {
        self.think().await;
        Ok(self.investigation(alerts))
    }

    async fn draft_response_plan(
        &self,
        _case: &Case,
        alerts: &[Alert],
    ) -> Result<ResponsePlan, CollaboratorError> {
        self.think().await;
        Ok(self.response_plan(alerts))
    }

    async fn generate_report(&self, case: &Case) -> Result<String, CollaboratorError> {
        self.think().await;
        Ok(self.report(case))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{validate_response_plan, validate_triage};
    use crate::store::seed_alerts;
    use chrono::Utc;
    use serde_json::json;

    fn simulated(title: &str, raw: serde_json::Value) -> Alert {
        let raw = match raw {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Alert::new("AL-7777", "EDR", Utc::now(), Severity::High, title, "d").with_raw_event(raw)
    }

    #[test]
    fn test_canned_triage_for_seed() {
        let stub = StubCollaborator::new();
        let seeds = seed_alerts();
        let triage = stub.triage(&seeds[0]);
        assert_eq!(triage.severity, Severity::High);
        assert_eq!(triage.iocs[0], Indicator::new("IP", "192.168.45.12"));
        assert!(validate_triage(&triage).is_ok());
    }

    #[test]
    fn test_rule_triage_by_title() {
        let stub = StubCollaborator::new();
        let triage = stub.triage(&simulated("Suspicious PowerShell Execution", json!({})));
        assert_eq!(triage.iocs[0], Indicator::new("Source", "EDR"));
        assert_eq!(triage.iocs[1], Indicator::new("Process", "powershell.exe -enc"));
        assert_eq!(triage.severity, Severity::High);
    }

    #[test]
    fn test_rule_triage_extracts_ipv4_from_raw_event() {
        let stub = StubCollaborator::new();
        let alert = simulated(
            "Anomalous Data Egress",
            json!({"dst": "198.51.100.23", "peers": ["10.1.2.3 via gw", "not-an-ip 999.1.1.1"]}),
        );
        let triage = stub.triage(&alert);
        let ips: Vec<_> = triage
            .iocs
            .iter()
            .filter(|i| i.ioc_type == "IP")
            .map(|i| i.value.as_str())
            .collect();
        assert_eq!(ips, vec!["198.51.100.23", "10.1.2.3"]);
    }

    #[test]
    fn test_playbook_selection() {
        let stub = StubCollaborator::new();
        let seeds = seed_alerts();

        let sqli = stub.investigation(&seeds[..1]);
        assert_eq!(sqli.confidence.value(), 95);
        assert_eq!(sqli.phase, "Delivery / Exploitation");

        let other = stub.investigation(&seeds[1..2]);
        assert_eq!(other.phase, "Credential Access");

        let empty = stub.investigation(&[]);
        assert_eq!(empty.phase, "Credential Access");
    }

    #[test]
    fn test_plans_are_valid_drafts() {
        let stub = StubCollaborator::new();
        let seeds = seed_alerts();
        for alerts in [&seeds[..1], &seeds[1..]] {
            let plan = stub.response_plan(alerts);
            assert!(validate_response_plan(&plan).is_ok());
            assert_eq!(plan.actions.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_async_contract_matches_sync_helpers() {
        let stub = StubCollaborator::new();
        let seeds = seed_alerts();
        let triage = stub.triage_alert(&seeds[1]).await.unwrap();
        assert_eq!(triage, stub.triage(&seeds[1]));
    }
}
