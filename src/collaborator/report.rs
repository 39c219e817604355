//! Deterministic markdown incident report.

use std::fmt::Write;

use crate::types::Case;

const RECOMMENDED_REMEDIATIONS: [&str; 3] = [
    "Rotate compromised credentials.",
    "Tune WAF ruleset 90021.",
    "Conduct user awareness training.",
];

/// Render a markdown incident report for a case.
pub fn render_incident_report(case: &Case) -> String {
    let mut out = String::new();
    let confidence = case
        .confidence
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# Incident Report: {}", case.id);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out, "{}", case.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Status:** {}", case.status);
    let _ = writeln!(out, "**Confidence:** {confidence}%");
    let _ = writeln!(out, "**Phase:** {}", case.phase.as_deref().unwrap_or("N/A"));
    if let Some(hypothesis) = &case.hypothesis {
        let _ = writeln!(out, "**Hypothesis:** {hypothesis}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Investigation Timeline");
    for entry in &case.timeline {
        let _ = writeln!(
            out,
            "- {} - {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.description
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Indicators of Compromise");
    if case.iocs.is_empty() {
        let _ = writeln!(out, "No indicators recorded.");
    }
    for ioc in &case.iocs {
        let _ = writeln!(out, "- {}: {} ({} hits)", ioc.ioc_type, ioc.value, ioc.count);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Actions Taken");
    let executed: Vec<_> = case
        .response_plan
        .iter()
        .flat_map(|plan| plan.executed_actions())
        .collect();
    if executed.is_empty() {
        let _ = writeln!(out, "No actions executed yet.");
    }
    for action in executed {
        let _ = writeln!(out, "- [x] {}", action.label);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Recommended Remediations");
    for (i, step) in RECOMMENDED_REMEDIATIONS.iter().enumerate() {
        let _ = writeln!(out, "{}. {step}", i + 1);
    }

    out
}
