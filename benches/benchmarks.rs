use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::rc::Rc;

use selectree::subscription::SubscriptionTree;
use selectree::{Intent, Section, Store, StoreConfig, Transformer, Value};

fn quiet_store() -> Store {
    Store::builder().config(StoreConfig::production()).build()
}

fn partial_write_benchmark(c: &mut Criterion) {
    let store = quiet_store();

    c.bench_function("set_partial_state", |b| {
        let mut i = 0i64;
        b.iter(|| {
            store
                .set_partial_state(["deep", "nested", "value"], black_box(i))
                .unwrap();
            i += 1;
        });
        store.run_until_idle();
    });
}

fn partial_read_benchmark(c: &mut Criterion) {
    let store = quiet_store();
    store.set_partial_state(["deep", "nested", "value"], 42).unwrap();

    c.bench_function("get_partial_state", |b| {
        b.iter(|| {
            black_box(store.get_partial_state(["deep", "nested", "value"]));
        });
    });
}

fn collect_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscription_collect");

    for subscriber_count in [10, 100, 1000].iter() {
        let mut tree = SubscriptionTree::new();
        for i in 0..*subscriber_count {
            let branch = format!("b{}", i % 10);
            let leaf = format!("l{i}");
            tree.subscribe(&[branch.as_str(), leaf.as_str()], i);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                b.iter(|| black_box(tree.collect(&["b3"])));
            },
        );
    }
    group.finish();
}

fn flush_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");

    for subscriber_count in [1, 10, 100].iter() {
        let store = quiet_store();

        for _ in 0..*subscriber_count {
            let _ = store.subscribe_to_state([["value"]], |_| {
                // Empty subscriber
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0i64;
                b.iter(|| {
                    store.set_partial_state(["value"], black_box(i)).unwrap();
                    store.run_until_idle();
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn dispatch_benchmark(c: &mut Criterion) {
    let increment = Intent::new("INCREMENT", |n, _, _| Some(Value::from(n.as_i64()? + 1)));
    let store = Store::builder()
        .config(StoreConfig::production())
        .section("counter", Section::new(0).with_intent(increment))
        .build();
    let doubled = Transformer::new([["counter"]], |inputs, _| {
        Value::from(inputs[0].as_i64().unwrap_or_default() * 2)
    });
    store.subscribe_transformer(&doubled, Rc::new(|out: &Value| {
        black_box(out);
    }));

    c.bench_function("dispatch_and_transform", |b| {
        b.iter(|| {
            store.dispatch("INCREMENT", Value::Null);
            store.run_until_idle();
        });
    });
}

criterion_group!(
    benches,
    partial_write_benchmark,
    partial_read_benchmark,
    collect_benchmark,
    flush_benchmark,
    dispatch_benchmark,
);
criterion_main!(benches);
