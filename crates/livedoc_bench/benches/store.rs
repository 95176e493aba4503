//! Reference store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use livedoc_bench::random_grade;
use livedoc_core::codec::{decode_fields, encode_fields};
use livedoc_core::Query;
use livedoc_store::{DocumentStore, MemoryStore};

/// Benchmark CBOR encoding and decoding of a grade body.
fn bench_codec(c: &mut Criterion) {
    let fields = random_grade(&mut rand::thread_rng(), 10);
    let body = encode_fields(&fields).unwrap();

    c.bench_function("encode_grade", |b| {
        b.iter(|| black_box(encode_fields(black_box(&fields)).unwrap()));
    });
    c.bench_function("decode_grade", |b| {
        b.iter(|| black_box(decode_fields(black_box(&body)).unwrap()));
    });
}

/// Benchmark a create fanned out to many listeners.
fn bench_commit_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_fanout");
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    for listeners in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            listeners,
            |b, &listeners| {
                let store = MemoryStore::new();
                let mut rng = rand::thread_rng();
                for id in 0..200 {
                    store
                        .insert_with_id("grades", format!("g{id}"), random_grade(&mut rng, 20))
                        .unwrap();
                }
                let mut open: Vec<_> = (0..listeners)
                    .map(|i| {
                        let query = Query::new().where_eq("studentId", format!("u{}", i % 20));
                        store.listen("grades", &query)
                    })
                    .collect();

                b.iter(|| {
                    let id = rt
                        .block_on(store.create("grades", random_grade(&mut rng, 20)))
                        .unwrap();
                    for listener in &mut open {
                        while listener.try_recv().is_ok() {}
                    }
                    black_box(id)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_commit_fanout);
criterion_main!(benches);
