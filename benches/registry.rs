//! Benchmarks for vote recording and weighted finalization
//!
//! - Voting with a growing voter map
//! - Finalization over N voters
//! - Snapshot encoding

use ballotbox::registry::{CreateTopic, RegistryPolicy, VotingRegistry};
use ballotbox::serialization::to_cbor;
use ballotbox::Address;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

const NOW: u64 = 1_000;
const END: u64 = 2_000;

fn voter(i: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    bytes[19] = 0xaa;
    Address::from_bytes(bytes)
}

fn owner() -> Address {
    Address::from_bytes([0x01; 20])
}

fn registry_with_votes(voters: u32) -> VotingRegistry {
    let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
    registry
        .create_topic(
            &owner(),
            NOW,
            CreateTopic {
                description: "Best Meme of 2024".to_string(),
                end_time: END,
                options: (0..4).map(|i| format!("Option{}", i)).collect(),
                token: Address::from_bytes([0xee; 20]),
            },
        )
        .unwrap();

    for i in 0..voters {
        let option = format!("Option{}", i % 4);
        registry.vote(&voter(i), NOW, 0, &option, None).unwrap();
    }
    registry
}

fn bench_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("vote");

    for size in [10u32, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || registry_with_votes(size),
                |mut registry| {
                    registry
                        .vote(black_box(&voter(size)), NOW, 0, "Option1", None)
                        .unwrap();
                    registry
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");

    for size in [10u32, 100, 1_000] {
        let balances: HashMap<Address, u128> =
            (0..size).map(|i| (voter(i), u128::from(i) * 1_000)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || registry_with_votes(size),
                |mut registry| {
                    registry
                        .finalize_votes(&owner(), END, 0, black_box(&balances))
                        .unwrap()
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_snapshot_encode(c: &mut Criterion) {
    let snapshot = registry_with_votes(1_000).snapshot();

    c.bench_function("snapshot_encode_1000_voters", |b| {
        b.iter(|| to_cbor(black_box(&snapshot)).unwrap())
    });
}

criterion_group!(benches, bench_vote, bench_finalize, bench_snapshot_encode);
criterion_main!(benches);
