//! Benchmarks for snapshot diffing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lightseq_protocol::{diff, Document, NodeFields, NodeKind, Operation};
use lightseq_testkit::scenarios;

const SIZES: [usize; 3] = [10, 100, 1000];

/// Every tenth node recoloured, one removed and one appended.
fn edited(nodes: &[Document<NodeFields>]) -> Vec<Document<NodeFields>> {
    let mut next: Vec<_> = nodes.iter().skip(1).cloned().collect();
    for node in next.iter_mut().step_by(10) {
        node.fields.kind = NodeKind::Color { color: [0, 255, 0] };
    }
    let mut extra = nodes[0].clone();
    extra.id = "appended".into();
    next.push(extra);
    next
}

/// Benchmark diffing identical snapshots.
fn bench_diff_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_unchanged");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let previous = scenarios::color_nodes("s1", size);
            let current = previous.clone();
            b.iter(|| {
                let ops = diff(black_box(&previous), black_box(&current));
                black_box(ops);
            });
        });
    }

    group.finish();
}

/// Benchmark diffing after scattered edits.
fn bench_diff_edited(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_edited");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let previous = scenarios::color_nodes("s1", size);
            let current = edited(&previous);
            b.iter(|| {
                let ops = diff(black_box(&previous), black_box(&current));
                black_box(ops);
            });
        });
    }

    group.finish();
}

/// Benchmark diffing a reversed snapshot, which holds no changes.
fn bench_diff_reordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_reordered");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let previous = scenarios::color_nodes("s1", size);
            let mut current = previous.clone();
            current.reverse();
            b.iter(|| {
                let ops = diff(black_box(&previous), black_box(&current));
                black_box(ops);
            });
        });
    }

    group.finish();
}

/// Benchmark converting a batch to wire form.
fn bench_to_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_wire");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let ops = diff(&[], &scenarios::color_nodes("s1", size));
            b.iter(|| {
                let wire: Vec<_> = black_box(&ops)
                    .iter()
                    .map(Operation::to_wire)
                    .collect::<Result<_, _>>()
                    .unwrap();
                black_box(wire);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_diff_unchanged,
    bench_diff_edited,
    bench_diff_reordered,
    bench_to_wire,
);

criterion_main!(benches);
