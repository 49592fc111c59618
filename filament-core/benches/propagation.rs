//! Propagation benchmarks: set-then-demand over a deep chain and a wide
//! fan-out of constraint attributes.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use filament_core::{value, AttrId, Constraint, Graph, Value};

fn int(v: &Value) -> i64 {
    v.downcast_ref::<i64>().copied().unwrap_or(0)
}

fn chain(c: &mut Criterion) {
    c.bench_function("chain_64_set_demand", |b| {
        let mut graph = Graph::new();
        let source = graph.add_source(value(0i64));
        let mut tail: AttrId = source.into();
        for _ in 0..64 {
            let node = graph.add_derived();
            graph
                .attach(node, Constraint::new([tail], |vals| value(int(&vals[0]) + 1)))
                .unwrap();
            tail = node.into();
        }

        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            graph.set(source, value(i)).unwrap();
            black_box(graph.demand(tail).unwrap());
        });
    });
}

fn fanout(c: &mut Criterion) {
    c.bench_function("fanout_256_eager", |b| {
        let mut graph = Graph::new();
        let source = graph.add_source(value(0i64));
        for k in 0..256i64 {
            let node = graph.add_eager();
            graph
                .attach(node, Constraint::new([source], move |vals| {
                    value(int(&vals[0]) + k)
                }))
                .unwrap();
        }

        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            // The drain inside `set` demands all 256 eager attributes.
            graph.set(source, value(i)).unwrap();
        });
    });
}

criterion_group!(benches, chain, fanout);
criterion_main!(benches);
