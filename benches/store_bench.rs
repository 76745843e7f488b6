use std::sync::Arc;
use std::time::Duration;

use age::x25519;
use cellar::core::config::StoreOptions;
use cellar::core::context::Context;
use cellar::core::crypto::{Age, Crypto};
use cellar::core::domain::Secret;
use cellar::core::store::Store;
use cellar::core::vcs::Noop;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

/// Generate a payload of given size.
fn generate_payload(size: usize) -> Vec<u8> {
    vec![b'x'; size]
}

/// Store with `entries` age-encrypted entries spread over a few directories.
fn populated_store(entries: usize) -> (TempDir, Store, Context) {
    let dir = TempDir::new().unwrap();
    let ctx = Context::background();
    let identity = x25519::Identity::generate();
    let id = identity.to_public().to_string();
    let store = Store::init(
        &ctx,
        dir.path(),
        "",
        Arc::new(Age::new(vec![identity])),
        Arc::new(Noop),
        StoreOptions::default(),
        &[id],
    )
    .unwrap();

    for i in 0..entries {
        let name = format!("team-{}/service-{}/key-{}", i % 7, i % 13, i);
        store.set(&ctx, &name, &Secret::new("value", "")).unwrap();
    }
    (dir, store, ctx)
}

/// Benchmark age encrypt/decrypt roundtrip with varying payload sizes.
fn bench_encrypt_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt_decrypt");
    group.sample_size(50);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let ctx = Context::background();
    let identity = x25519::Identity::generate();
    let recipients = vec![identity.to_public().to_string()];
    let age = Age::new(vec![identity]);

    for size in [32, 256, 1024, 4096, 16384] {
        let payload = generate_payload(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(
            BenchmarkId::new("roundtrip", format!("{}B", size)),
            &payload,
            |b, payload| {
                b.iter(|| {
                    let encrypted = age
                        .encrypt(&ctx, black_box(payload), black_box(&recipients))
                        .unwrap();
                    let decrypted = age.decrypt(&ctx, black_box(&encrypted)).unwrap();
                    black_box(decrypted);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark encryption to a growing recipient set.
fn bench_encrypt_recipients(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt_recipients");
    group.sample_size(50);

    let ctx = Context::background();
    let age = Age::new(vec![x25519::Identity::generate()]);
    let payload = generate_payload(256);

    for count in [1, 5, 20] {
        let recipients: Vec<String> = (0..count)
            .map(|_| x25519::Identity::generate().to_public().to_string())
            .collect();

        group.bench_with_input(
            BenchmarkId::new("age", count),
            &recipients,
            |b, recipients| {
                b.iter(|| {
                    let encrypted = age
                        .encrypt(&ctx, black_box(&payload), black_box(recipients))
                        .unwrap();
                    black_box(encrypted);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark listing a populated tree.
fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");

    for entries in [100, 1000] {
        let (_dir, store, _ctx) = populated_store(entries);
        group.throughput(Throughput::Elements(entries as u64));
        group.bench_function(BenchmarkId::from_parameter(entries), |b| {
            b.iter(|| black_box(store.list(black_box("")).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark a single set/get through the store.
fn bench_set_get(c: &mut Criterion) {
    let (_dir, store, ctx) = populated_store(10);
    let secret = Secret::new("hunter2", "user: alice\n");

    c.bench_function("set_get", |b| {
        b.iter(|| {
            store.set(&ctx, "bench/entry", black_box(&secret)).unwrap();
            black_box(store.get(&ctx, "bench/entry").unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_encrypt_decrypt,
    bench_encrypt_recipients,
    bench_list,
    bench_set_get
);
criterion_main!(benches);
