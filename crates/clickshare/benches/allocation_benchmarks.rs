//! Allocation performance benchmarks.
//!
//! Measures allocation and aggregation across table sizes and group counts.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use clickshare::{
    AggregationSpec, Aggregator, AllocationMode, AllocationSpec, Allocator, DataTable,
};

/// Generate a joined table with `rows` rows spread over `pages` landing pages.
fn generate_joined(rows: usize, pages: usize) -> DataTable {
    let mut rng = StdRng::seed_from_u64(42);
    let headers = ["url", "country", "device", "query", "clicks", "impressions", "sessions"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = (0..rows)
        .map(|i| {
            let page = rng.gen_range(0..pages);
            // Roughly a third of rows have no clicks
            let clicks = if rng.gen_bool(0.33) { 0 } else { rng.gen_range(1..50) };
            vec![
                format!("/page-{}", page),
                ["US", "DE", "FR"][page % 3].to_string(),
                ["mobile", "desktop"][i % 2].to_string(),
                format!("query {}", i),
                clicks.to_string(),
                rng.gen_range(0..1000).to_string(),
                // Sessions are page-level, so every row of a page carries the same value
                (page * 7 % 500).to_string(),
            ]
        })
        .collect();

    DataTable::new(headers, rows, b',')
}

fn allocation_spec() -> AllocationSpec {
    AllocationSpec {
        group_key: vec!["url".to_string(), "country".to_string(), "device".to_string()],
        clicks: "clicks".to_string(),
        breakdown: vec!["sessions".to_string()],
        impressions: Some("impressions".to_string()),
    }
}

/// Benchmark both allocation modes over growing tables.
fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let spec = allocation_spec();

    for rows in [1_000, 10_000, 100_000].iter() {
        let table = generate_joined(*rows, rows / 20);
        group.throughput(Throughput::Elements(*rows as u64));

        for mode in [AllocationMode::Proportional, AllocationMode::Fallback] {
            let allocator = Allocator::new(mode);
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), rows),
                &table,
                |b, table| b.iter(|| black_box(allocator.allocate(table, &spec).unwrap())),
            );
        }
    }

    group.finish();
}

/// Benchmark allocation followed by column augmentation.
fn bench_augment(c: &mut Criterion) {
    let table = generate_joined(10_000, 500);
    let allocation = Allocator::default().allocate(&table, &allocation_spec()).unwrap();

    c.bench_function("augment_10k", |b| {
        b.iter(|| black_box(allocation.augment(&table)))
    });
}

/// Benchmark aggregation as the number of distinct keys varies.
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let spec = AggregationSpec {
        group_key: vec!["url".to_string(), "country".to_string(), "device".to_string()],
        clicks: "clicks".to_string(),
        estimated: vec!["sessions_estimated".to_string()],
    };

    for pages in [10, 1_000, 10_000].iter() {
        let table = generate_joined(50_000, *pages);
        let augmented = Allocator::default()
            .allocate(&table, &allocation_spec())
            .unwrap()
            .augment(&table);

        group.bench_with_input(BenchmarkId::new("pages", pages), &augmented, |b, table| {
            b.iter(|| black_box(Aggregator::new().aggregate(table, &spec).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_allocate, bench_augment, bench_aggregate);
criterion_main!(benches);
