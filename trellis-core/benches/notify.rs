//! Benchmarks for notification fan-out and deep observation.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::{observe, Array, Effect, Object, Value};

/// One field write with `n` effects reading it.
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("field_write", n), &n, |b, &n| {
            let state = Object::from_iter([("a", 0)]);
            observe(&Value::from(state.clone()), false);

            let effects: Vec<Rc<Effect>> = (0..n)
                .map(|_| {
                    let state = state.clone();
                    Effect::new(move || {
                        black_box(state.get("a"));
                    })
                })
                .collect();

            let mut tick = 0i64;
            b.iter(|| {
                tick += 1;
                state.assign("a", Value::from(tick));
            });
            black_box(effects);
        });
    }

    group.finish();
}

fn nested(depth: usize, width: usize) -> Value {
    if depth == 0 {
        return Value::from(0);
    }
    let obj = Object::new();
    for i in 0..width {
        obj.insert(format!("k{i}"), nested(depth - 1, width));
    }
    Value::from(obj)
}

/// Observing a fresh tree of objects and arrays.
fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe");

    for depth in [2, 4, 6] {
        group.bench_with_input(BenchmarkId::new("object_tree", depth), &depth, |b, &depth| {
            b.iter(|| {
                let tree = nested(depth, 4);
                observe(&tree, false);
                black_box(tree);
            });
        });
    }

    group.bench_function("array_of_1000", |b| {
        b.iter(|| {
            let list: Array = (0..1000)
                .map(|i| Value::from(Object::from_iter([("i", i)])))
                .collect();
            let value = Value::from(list);
            observe(&value, false);
            black_box(value);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_observe);
criterion_main!(benches);
