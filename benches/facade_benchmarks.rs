//! Criterion benchmarks for gcplog

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gcplog::prelude::*;
use gcplog::{format_payload, render_payload};
use serde_json::json;
use std::sync::Arc;

fn local_only() -> CloudLogger {
    CloudLogger::builder()
        .common_labels([("app", "bench"), ("module", "facade")])
        .writer(std::io::sink())
        .local_only()
        .build()
}

// ============================================================================
// Payload Benchmarks
// ============================================================================

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");

    for count in [0usize, 4, 16] {
        let fields: Fields = (0..count)
            .map(|i| (format!("key{}", i), json!(i)))
            .collect();
        group.throughput(Throughput::Elements(1));

        group.bench_with_input(BenchmarkId::new("format", count), &fields, |b, fields| {
            b.iter(|| black_box(format_payload(black_box("message"), fields)));
        });

        let payload = format_payload("message", &fields);
        group.bench_with_input(BenchmarkId::new("render", count), &payload, |b, payload| {
            b.iter(|| black_box(render_payload(payload)));
        });
    }

    group.finish();
}

// ============================================================================
// Facade Benchmarks
// ============================================================================

fn bench_facade(c: &mut Criterion) {
    let mut group = c.benchmark_group("facade");
    group.throughput(Throughput::Elements(1));

    let logger = local_only();
    group.bench_function("info_local_only", |b| {
        b.iter(|| {
            logger.info(
                black_box("request served"),
                Fields::new().with("status", 200).with("path", "/health"),
            )
        });
    });

    group.bench_function("printf_local_only", |b| {
        b.iter(|| logger.printf(format_args!("served {} in {}ms", black_box("/health"), 3)));
    });

    let sink = Arc::new(RecordingSink::new());
    let recorded = CloudLogger::builder()
        .writer(std::io::sink())
        .remote_sink(sink.clone())
        .build()
        .with([("request_id", "r-1")]);
    group.bench_function("info_with_remote", |b| {
        b.iter(|| {
            recorded.info(black_box("request served"), Fields::new().with("status", 200));
            sink.clear();
        });
    });

    group.bench_function("derive", |b| {
        b.iter(|| black_box(logger.with([("user", "u1"), ("trace", "t-1")])));
    });

    group.finish();
}

criterion_group!(benches, bench_payload, bench_facade);

criterion_main!(benches);
