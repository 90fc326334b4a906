//! Benchmarks for channel traffic and small pipelines
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jqsh::{CancelToken, Channel, Filter, Runtime, Value};

fn numbers(count: usize) -> Vec<Value> {
    (0..count as i64).map(Value::from).collect()
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");

    for size in [100, 1000, 10_000].iter() {
        let values = numbers(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("fifo", size), &values, |b, values| {
            b.iter(|| {
                let channel = Channel::new(CancelToken::never());
                for value in values {
                    let _ = channel.push(value.clone());
                }
                let _ = channel.terminate();
                black_box(channel.values().count())
            });
        });
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for replicas in [2, 4, 8].iter() {
        let values = numbers(1000);
        group.throughput(Throughput::Elements((values.len() * replicas) as u64));
        group.bench_with_input(BenchmarkId::new("replicas", replicas), replicas, |b, &n| {
            b.iter(|| {
                let channel = Channel::from_values(values.clone());
                let total: usize = channel.split(n).iter().map(|r| r.values().count()).sum();
                black_box(total)
            });
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let runtime = Runtime::default();
    // `. + 1 | . * 2`
    let filter = Filter::pipe(
        Filter::add(Filter::identity(), Filter::number(1)),
        Filter::multiply(Filter::identity(), Filter::number(2)),
    );

    for size in [10, 100, 1000].iter() {
        let values = numbers(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("add_multiply", size), &values, |b, values| {
            b.iter(|| {
                let output = runtime.start(&filter, Channel::from_values(values.clone()));
                black_box(output.values().count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_split, bench_pipeline);

criterion_main!(benches);
