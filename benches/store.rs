//! Performance benchmarks for case linking and IOC aggregation.
//!
//! Run with: `cargo bench --bench store`
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | Link alerts | Linear scan of linked IDs + IOC merge per link |
//! | IOC merge | Exact (type, value) match against existing entries |
//! | Snapshot | Clone + canonical JSON + xxh64 |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};
use chrono::Utc;

use case_kernel::{merge_iocs, AiTriage, Alert, CaseStore, Indicator, Severity};

/// Alert `i` carries `iocs` indicators, half of them shared across alerts.
fn make_alert(i: usize, iocs: usize) -> Alert {
    let indicators = (0..iocs)
        .map(|j| {
            if j % 2 == 0 {
                Indicator::new("IP", format!("10.0.0.{j}"))
            } else {
                Indicator::new("Hash", format!("{i:08x}{j:08x}"))
            }
        })
        .collect();
    Alert::new(
        format!("AL-{i}"),
        "bench",
        Utc::now(),
        Severity::High,
        format!("Alert {i}"),
        "benchmark alert",
    )
    .with_triage(AiTriage {
        summary: String::new(),
        severity: Severity::High,
        rationale: String::new(),
        iocs: indicators,
        recommended_checks: Vec::new(),
    })
}

/// Benchmark linking N alerts into one case.
fn bench_link_alerts(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_alerts");

    for count in [10usize, 100, 500] {
        let alerts: Vec<_> = (0..count).map(|i| make_alert(i, 8)).collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("alerts", count), &alerts, |b, alerts| {
            b.iter(|| {
                let store = CaseStore::new();
                let case = store.create_case(&alerts[0]);
                for alert in &alerts[1..] {
                    black_box(store.link_alert_to_case(&case.id, alert));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark merging indicator lists into a growing case IOC list.
fn bench_ioc_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("ioc_merge");

    for per_alert in [4usize, 16, 64] {
        let alerts: Vec<_> = (0..50).map(|i| make_alert(i, per_alert)).collect();

        group.throughput(Throughput::Elements((50 * per_alert) as u64));
        group.bench_with_input(
            BenchmarkId::new("indicators_per_alert", per_alert),
            &alerts,
            |b, alerts| {
                b.iter(|| {
                    let mut iocs = Vec::new();
                    for alert in alerts {
                        black_box(merge_iocs(&mut iocs, alert.triage_iocs()));
                    }
                    iocs
                })
            },
        );
    }

    group.finish();
}

/// Benchmark snapshot + fingerprint on a populated store.
fn bench_snapshot(c: &mut Criterion) {
    let store = CaseStore::seeded();
    for i in 0..200 {
        store.add_alert(make_alert(i, 4));
    }
    let alerts = store.list_alerts();
    for chunk in alerts.chunks(10) {
        let case = store.create_case(&chunk[0]);
        for alert in &chunk[1..] {
            store.link_alert_to_case(&case.id, alert);
        }
    }

    c.bench_function("snapshot_fingerprint", |b| {
        b.iter(|| black_box(store.snapshot()))
    });
}

criterion_group!(benches, bench_link_alerts, bench_ioc_merge, bench_snapshot);
criterion_main!(benches);
