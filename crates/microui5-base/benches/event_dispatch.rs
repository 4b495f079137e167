use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use microui5_base::{
    AggregationDecl, ClassInfo, EventDecl, EventProvider, Listener, ManagedObject, MetadataInfo,
    PropertyDecl, Runtime, Settings, Value,
};
use serde_json::json;

fn bench_fire_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire");

    for count in [1usize, 8, 64] {
        let provider = EventProvider::new();
        for _ in 0..count {
            let listener = Listener::new(|event, _| {
                black_box(event.event_type());
            });
            provider
                .attach_event("press", None, listener, None)
                .unwrap();
        }
        let id = BenchmarkId::new("listeners", count);
        group.bench_with_input(id, &provider, |b, provider| {
            b.iter(|| provider.fire_event(black_box("press"), None, false, false));
        });
    }

    group.finish();
}

fn bench_bubbling(c: &mut Criterion) {
    let mut group = c.benchmark_group("bubbling");

    for depth in [1usize, 4, 16] {
        let chain: Vec<EventProvider> = (0..=depth).map(|_| EventProvider::new()).collect();
        for pair in chain.windows(2) {
            pair[0].set_eventing_parent(Some(&pair[1]));
        }
        if let Some(root) = chain.last() {
            root.attach_event("select", None, Listener::new(|_, _| {}), None)
                .unwrap();
        }
        let id = BenchmarkId::new("depth", depth);
        group.bench_with_input(id, &chain[0], |b, leaf| {
            b.iter(|| leaf.fire_event(black_box("select"), None, true, true));
        });
    }

    group.finish();
}

fn control_runtime() -> Runtime {
    let rt = Runtime::new().unwrap();
    rt.define_class(
        "bench.Item",
        "sap.ui.core.Control",
        ClassInfo::new(
            MetadataInfo::default()
                .property("text", PropertyDecl::new("string"))
                .property("count", PropertyDecl::new("int").with_default(json!(0)))
                .aggregation("items", AggregationDecl::multiple("sap.ui.core.Control"))
                .event("press", EventDecl::default()),
        ),
    )
    .unwrap();
    rt
}

fn bench_accessors(c: &mut Criterion) {
    let rt = control_runtime();
    let item = rt.create("bench.Item", Settings::new()).unwrap();

    c.bench_function("set_property_accessor", |b| {
        let mut n = 0_i64;
        b.iter(|| {
            n += 1;
            item.invoke("setCount", &[Value::from(black_box(n))])
                .unwrap()
        });
    });

    c.bench_function("get_property_accessor", |b| {
        b.iter(|| item.invoke(black_box("getText"), &[]).unwrap());
    });

    c.bench_function("fire_event_accessor", |b| {
        item.attach_event("press", None, Listener::new(|_, _| {}), None)
            .unwrap();
        b.iter(|| item.invoke(black_box("firePress"), &[]).unwrap());
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let rt = control_runtime();
    let parent = rt.create("bench.Item", Settings::new()).unwrap();
    let children: Vec<ManagedObject> = (0..32)
        .map(|_| rt.create("bench.Item", Settings::new()).unwrap())
        .collect();

    c.bench_function("add_remove_all_32", |b| {
        b.iter(|| {
            for child in &children {
                parent.add_aggregation("items", child).unwrap();
            }
            parent.remove_all_aggregation("items").unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_fire_listeners,
    bench_bubbling,
    bench_accessors,
    bench_aggregation
);
criterion_main!(benches);
