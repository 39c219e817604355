//! Case Console Binary
//!
//! Runs a scripted analyst session against an in-memory store with the
//! deterministic collaborator and prints the final incident report.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `CASE_KERNEL_CASE_LOCKS`: `none` or `per_case` (default: none)
//! - `CASE_KERNEL_FALLBACK`: fall back to canned results on failure (default: true)
//! - `CASE_KERNEL_SEED`: load the built-in seed alerts (default: true)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! LOG_FORMAT=pretty cargo run --bin case_console
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use case_kernel::{
    seed_alerts, AlertId, CaseStore, Console, ConsoleConfig, LinkOutcome,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "case_console=info,case_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ConsoleConfig::try_from_env()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        case_locks = %config.case_locks,
        fallback = config.fallback_on_failure,
        seed = config.seed_alerts,
        "Starting case console"
    );

    let store = Arc::new(if config.seed_alerts {
        CaseStore::with_alerts(seed_alerts())
    } else {
        CaseStore::new()
    });

    let changes = Arc::new(AtomicUsize::new(0));
    let subscription = {
        let changes = Arc::clone(&changes);
        let observed = Arc::clone(&store);
        store.subscribe(move || {
            let n = changes.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(change = n, revision = observed.revision(), "Store changed");
        })
    };

    let console = Console::with_stub(Arc::clone(&store), config);

    let Some(first) = store.list_alerts().into_iter().next() else {
        info!("No alerts loaded, nothing to do");
        return Ok(());
    };

    console.triage_alert(&first.id).await?;
    let case = console.create_case(&first.id)?;

    let related = AlertId::new("AL-1002");
    if store.get_alert(&related).is_some() {
        console.triage_alert(&related).await?;
        if console.link_alert(&case.id, &related)? == LinkOutcome::Linked {
            info!(case_id = %case.id, alert_id = %related, "Related alert linked");
        }
    }

    console.investigate_case(&case.id).await?;
    let plan = console.draft_response_plan(&case.id).await?;
    if let Some(action) = plan.actions.first() {
        console.execute_action(&case.id, &action.id).await;
    }

    let report = console.generate_report(&case.id).await?;
    println!("{report}");

    let snapshot = store.snapshot();
    info!(
        revision = snapshot.revision,
        fingerprint = %snapshot.fingerprint,
        audit_entries = snapshot.audit_log.len(),
        changes = changes.load(Ordering::Relaxed),
        "Session complete"
    );

    subscription.unsubscribe();
    Ok(())
}
