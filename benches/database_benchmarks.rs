//! Criterion benchmarks for rust_record_table

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_record_table::core::record::{cached_columns, discover_columns};
use rust_record_table::core::statement::{assignment_pairs, StatementBuilder};
use rust_record_table::prelude::*;

struct Address;

impl Record for Address {
    const FIELDS: &'static [Field] = &[
        Field::qualified("street", "street", "addr"),
        Field::qualified("city", "city", "addr"),
        Field::qualified("zip", "zip", "addr"),
    ];

    fn value(&self, _column: &str) -> Option<DatabaseValue> {
        None
    }
}

struct Customer;

impl Record for Customer {
    const FIELDS: &'static [Field] = &[
        Field::column("id", "id"),
        Field::column("name", "name"),
        Field::column("email", "email"),
        Field::column("created_at", "created_at"),
        Field::nested::<Address>("billing"),
        Field::skipped("session"),
        Field::column("balance", "balance"),
    ];

    fn value(&self, _column: &str) -> Option<DatabaseValue> {
        None
    }
}

// ============================================================================
// Column Discovery Benchmarks
// ============================================================================

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    group.throughput(Throughput::Elements(1));

    group.bench_function("read_uncached", |b| {
        b.iter(|| black_box(discover_columns::<Customer>(black_box(false))));
    });

    group.bench_function("write_uncached", |b| {
        b.iter(|| black_box(discover_columns::<Customer>(black_box(true))));
    });

    group.bench_function("read_cached", |b| {
        b.iter(|| black_box(cached_columns::<Customer>(black_box(false))));
    });

    group.finish();
}

// ============================================================================
// Statement Rendering Benchmarks
// ============================================================================

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    let builder = StatementBuilder::new("customers");

    for width in [2usize, 8, 32].iter() {
        let columns: Vec<String> = (0..*width).map(|i| format!("col_{}", i)).collect();
        group.throughput(Throughput::Elements(*width as u64));

        group.bench_with_input(BenchmarkId::new("select", width), &columns, |b, cols| {
            b.iter(|| black_box(builder.select(black_box(cols), "WHERE id=1")));
        });

        group.bench_with_input(BenchmarkId::new("insert", width), &columns, |b, cols| {
            b.iter(|| black_box(builder.insert(black_box(cols), "")));
        });

        group.bench_with_input(BenchmarkId::new("upsert", width), &columns, |b, cols| {
            b.iter(|| black_box(builder.upsert(black_box(cols), "")));
        });

        group.bench_with_input(BenchmarkId::new("assignment_pairs", width), &columns, |b, cols| {
            b.iter(|| black_box(assignment_pairs(black_box(cols))));
        });
    }

    group.finish();
}

// ============================================================================
// Scalar Decoding Benchmarks
// ============================================================================

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");
    group.throughput(Throughput::Elements(1));

    let null = DatabaseValue::Null;
    let long = DatabaseValue::Long(123_456_789);
    let text = DatabaseValue::String("123456789".to_string());
    let stamp = DatabaseValue::String("2024-03-01 12:30:00".to_string());

    group.bench_function("safe_int_null", |b| {
        b.iter(|| black_box(SafeInt::decode(black_box(&null))))
    });

    group.bench_function("safe_int_long", |b| {
        b.iter(|| black_box(SafeInt::decode(black_box(&long))))
    });

    group.bench_function("safe_int_text", |b| {
        b.iter(|| black_box(SafeInt::decode(black_box(&text))))
    });

    group.bench_function("safe_time_text", |b| {
        b.iter(|| black_box(SafeTime::decode(black_box(&stamp))))
    });

    group.bench_function("safe_int_json", |b| {
        b.iter(|| black_box(serde_json::from_str::<SafeInt>(black_box("\"42\""))))
    });

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_rendering, bench_decoding);
criterion_main!(benches);
