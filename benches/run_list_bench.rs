use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use run_hashmap::{ReservedPools, RunList};
use std::time::Duration;

fn bench_push_back(c: &mut Criterion) {
    c.bench_function("run_list::push_back_100k", |b| {
        b.iter_batched(
            RunList::<u64>::new,
            |mut list| {
                for i in 0..100_000u64 {
                    list.push_back(i);
                }
                black_box(list)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_push_back_reserved(c: &mut Criterion) {
    c.bench_function("run_list::push_back_reserved_100k", |b| {
        b.iter_batched(
            || RunList::<u64, _>::with_pools(ReservedPools { nodes: 100_001 }),
            |mut list| {
                for i in 0..100_000u64 {
                    list.push_back(i);
                }
                black_box(list)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_splice_front(c: &mut Criterion) {
    c.bench_function("run_list::splice_back_to_front", |b| {
        let mut list = RunList::new();
        for i in 0..10_000u64 {
            list.push_back(i);
        }
        b.iter(|| {
            let last = list.prev(list.end());
            list.detach(last);
            list.attach_before(list.head(), last);
            black_box(last)
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("run_list::iterate_100k", |b| {
        let mut list = RunList::new();
        for i in 0..100_000u64 {
            list.push_back(i);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_, v) in list.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_push_back, bench_push_back_reserved, bench_splice_front, bench_iterate
}
criterion_main!(benches);
