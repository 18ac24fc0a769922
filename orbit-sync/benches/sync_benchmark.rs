use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use orbit_sync::protocol::EVENT_CONFIG_UPDATED;
use orbit_sync::storage::{ConfigStore, RocksConfigStore, StoreConfig};
use orbit_sync::{BroadcastHub, ButtonConfig, SyncContext, Vec3};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

fn sample_config(i: usize) -> ButtonConfig {
    ButtonConfig::new(format!("button-{i}"))
        .with_position(Vec3::new(i as f64, 1.5, -2.0))
        .with_rotation(Vec3::new(0.0, 90.0, 0.0))
        .with_scale(1.25)
}

fn bench_normalize(c: &mut Criterion) {
    let raw = json!({
        "id": "b1",
        "position": {"x": 1, "y": 2, "z": 3},
        "label": "Play",
    });

    c.bench_function("normalize_partial_update", |b| {
        b.iter_batched(
            || raw.clone(),
            |raw| black_box(ButtonConfig::from_raw(raw).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_fanout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hub = Arc::new(BroadcastHub::new(1024));
    let mut subs = rt.block_on(async {
        let mut subs = Vec::new();
        for _ in 0..100 {
            subs.push(hub.subscribe().await);
        }
        subs
    });
    let config = sample_config(0);

    c.bench_function("fanout_100_subscribers", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(hub.publish(EVENT_CONFIG_UPDATED, &config).await.unwrap());
            });
            for sub in subs.iter_mut() {
                while sub.try_recv().is_some() {}
            }
        })
    });
}

fn bench_apply_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = SyncContext::in_memory(1024);

    c.bench_function("apply_update_in_memory", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    ctx.synchronizer()
                        .apply_update(json!({"id": "b1", "scale": 2.0}))
                        .await
                        .unwrap(),
                );
            })
        })
    });
}

fn bench_rocks_put(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksConfigStore::open(StoreConfig::for_testing(dir.path().join("db"))).unwrap();
    let mut i = 0usize;

    c.bench_function("rocks_put", |b| {
        b.iter(|| {
            i = (i + 1) % 256;
            store.put(black_box(&sample_config(i))).unwrap();
        })
    });

    c.bench_function("rocks_get_all_256", |b| {
        b.iter(|| black_box(store.get_all().unwrap()))
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_fanout,
    bench_apply_update,
    bench_rocks_put,
);
criterion_main!(benches);
