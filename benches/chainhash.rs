#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::similar_names
)]
use std::collections::HashMap;

use chainhash::{ChainHashMap, ProbeHashMap};
use criterion::{Criterion, criterion_group, criterion_main};
use proptest::{
    prelude::{Strategy, any},
    strategy::ValueTree,
    test_runner::TestRunner,
};

const ITEMS_AMOUNT: usize = 1000;
const SAMPLE_SIZE: usize = 10;

fn hash_map_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let items = any::<[(String, String); ITEMS_AMOUNT]>()
        .new_tree(&mut runner)
        .unwrap()
        .current();

    let mut group = c.benchmark_group("Hash map comparison benchmark");
    group.sample_size(SAMPLE_SIZE);
    let mut probe_map: ProbeHashMap<String, String> = ProbeHashMap::new();
    let mut chain_map: ChainHashMap<String, String> = ChainHashMap::new();
    let mut rust_map = HashMap::new();
    group.bench_function("probe buckets insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                probe_map.insert(key, value);
            }
        });
    });
    group.bench_function("chain buckets insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                chain_map.insert(key, value);
            }
        });
    });
    group.bench_function("rust std insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                rust_map.insert(key, value);
            }
        });
    });
    group.bench_function("probe buckets search", |b| {
        b.iter(|| {
            for (key, _) in &items {
                assert!(probe_map.search(key));
            }
        });
    });
    group.bench_function("chain buckets search", |b| {
        b.iter(|| {
            for (key, _) in &items {
                assert!(chain_map.search(key));
            }
        });
    });
    group.bench_function("rust std get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                assert!(rust_map.contains_key(key));
            }
        });
    });
    group.finish();
}

fn rehash_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let keys = any::<[u64; ITEMS_AMOUNT]>().new_tree(&mut runner).unwrap().current();

    let mut group = c.benchmark_group("Same-size rehash");
    group.sample_size(SAMPLE_SIZE);
    let mut probe_map: ProbeHashMap<u64, u64> = keys.iter().map(|&key| (key, key)).collect();
    let mut chain_map: ChainHashMap<u64, u64> = keys.iter().map(|&key| (key, key)).collect();
    group.bench_function("probe buckets rehash", |b| {
        b.iter(|| probe_map.rehash(1.0, 1));
    });
    group.bench_function("chain buckets rehash", |b| {
        b.iter(|| chain_map.rehash(1.0, 1));
    });
    group.finish();
}

criterion_group!(benches, hash_map_benches, rehash_benches);

criterion_main!(benches);
