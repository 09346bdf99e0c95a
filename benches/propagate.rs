//! Propagation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;

use hydroxyl::{Observable, Options};

fn update_fanout(c: &mut Criterion) {
    c.bench_function("update with 10 subscribers", |b| {
        let source = Observable::with_options(Options::NO_REPLAY);
        for _ in 0..10 {
            source.subscribe(|x: i32| {
                black_box(x);
            });
        }
        let mut rng = rand::thread_rng();
        b.iter(|| source.update(rng.gen::<i32>()))
    });
}

fn map_chain(c: &mut Criterion) {
    c.bench_function("update through a 10-stage map chain", |b| {
        let source = Observable::with_options(Options::NO_REPLAY);
        let mut tail = source.map(|x: i32| x.wrapping_add(1));
        for _ in 0..9 {
            tail = tail.map(|x| x.wrapping_add(1));
        }
        tail.subscribe(|x| {
            black_box(x);
        });
        let mut rng = rand::thread_rng();
        b.iter(|| source.update(rng.gen::<i32>()))
    });
}

fn subscribe_unsubscribe(c: &mut Criterion) {
    c.bench_function("subscribe and unsubscribe", |b| {
        let source: Observable<i32> = Observable::new();
        b.iter(|| {
            let token = source.subscribe(|x| {
                black_box(x);
            });
            token.unsubscribe();
        })
    });
}

criterion_group!(benches, update_fanout, map_chain, subscribe_unsubscribe);
criterion_main!(benches);
