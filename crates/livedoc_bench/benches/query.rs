//! Query evaluation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use livedoc_bench::generate_grades;
use livedoc_core::{Direction, Filter, Query};

/// Benchmark filtering and ordering a collection.
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_apply");

    for size in [100, 1_000, 10_000].iter() {
        let docs = generate_grades(*size, 50);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("where_eq", size), &docs, |b, docs| {
            let query = Query::new().where_eq("studentId", "u7");
            b.iter(|| black_box(query.apply(black_box(docs))));
        });

        group.bench_with_input(BenchmarkId::new("range_ordered", size), &docs, |b, docs| {
            let query = Query::new()
                .filter(Filter::ge("value", 4.0))
                .order_by("date", Direction::Descending)
                .limit(20);
            b.iter(|| black_box(query.apply(black_box(docs))));
        });
    }
    group.finish();
}

/// Benchmark constraint-set identity and parsing.
fn bench_fingerprint(c: &mut Criterion) {
    let query = Query::new()
        .where_eq("studentId", "u1")
        .where_eq("term", 2)
        .filter(Filter::gt("createdAt", "2024-03-01T00:00:00.000Z"))
        .order_by("value", Direction::Ascending);

    c.bench_function("query_fingerprint", |b| {
        b.iter(|| black_box(black_box(&query).fingerprint()));
    });

    c.bench_function("filter_parse", |b| {
        b.iter(|| black_box(black_box("value>=4.5").parse::<Filter>().unwrap()));
    });
}

criterion_group!(benches, bench_apply, bench_fingerprint);
criterion_main!(benches);
