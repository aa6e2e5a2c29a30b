use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use scenestore::{KdTree, PointSet};

fn scattered(n: u64) -> PointSet {
    let rows: Vec<[f64; 2]> = (0..n)
        .map(|i| {
            let h = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            [(h % 36_000) as f64 / 100.0, ((h >> 24) % 18_000) as f64 / 100.0]
        })
        .collect();
    PointSet::from_rows(rows).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    let points = scattered(50_000);
    group.bench_function("build_50k", |b| {
        b.iter(|| {
            black_box(KdTree::build(&points));
        });
    });

    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    let points = scattered(50_000);
    let tree = KdTree::build(&points);

    for k in [3, 11] {
        group.bench_function(format!("nearest_k{}", k), |b| {
            let mut counter = 0;
            b.iter(|| {
                black_box(tree.nearest_to(counter % points.len(), k).unwrap());
                counter += 7919;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_nearest);
criterion_main!(benches);
