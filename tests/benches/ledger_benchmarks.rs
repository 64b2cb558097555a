//! # Ledger-Core Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | lc-01 Uniqueness | commit of fresh inputs, conflicting commit |
//! | lc-02 Notary | full non-validating notarisation |
//! | lc-03 Vault | reserve and release, unpaged query |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lc_01_uniqueness::{InMemoryUniquenessProvider, UniquenessProvider};
use lc_02_notary::NotaryConfig;
use lc_03_vault::{
    Observation, PageSpecification, QueryCriteria, Sort, VaultApi, VaultQueryCriteria,
};
use lc_tests::fixtures::{cash, notary, registrar, spend, sref, tx_id, vault};
use shared_types::StateRef;
use std::time::Duration;
use uuid::Uuid;

fn bench_uniqueness_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-01-uniqueness");
    group.measurement_time(Duration::from_secs(5));

    for size in [1usize, 10, 100] {
        let provider = InMemoryUniquenessProvider::new();
        let mut next = 0u64;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("commit_fresh", size), &size, |b, &size| {
            b.iter(|| {
                next += 1;
                let inputs: Vec<StateRef> = (0..size as u32)
                    .map(|i| StateRef::new(tx_id(next), i))
                    .collect();
                black_box(provider.commit(&inputs, tx_id(next), &registrar()))
            })
        });
    }

    let provider = InMemoryUniquenessProvider::new();
    provider
        .commit(&[sref(1, 0)], tx_id(0), &registrar())
        .expect("seed commit");
    group.bench_function("commit_conflict", |b| {
        b.iter(|| black_box(provider.commit(&[sref(1, 0)], tx_id(1), &registrar()).is_err()))
    });

    group.finish();
}

fn bench_notarisation(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-02-notary");
    let (notary, _) = notary(NotaryConfig::default());
    let me = notary.identity().clone();
    let mut next = 0u32;

    group.bench_function("notarise_single_input", |b| {
        b.iter(|| {
            next += 1;
            let tx = spend(vec![StateRef::new([3; 32], next)], &me, "bench");
            black_box(notary.process_commit(&tx, &registrar()))
        })
    });
    group.finish();
}

fn bench_vault(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-03-vault");

    for size in [10u32, 100] {
        let vault = vault();
        let states: Vec<_> = (0..size).map(|i| cash(5, i, 10)).collect();
        let refs: Vec<StateRef> = states.iter().map(|s| s.state_ref).collect();
        vault
            .observe(Observation::new(vec![], states))
            .expect("seed states");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("reserve_release", size), &refs, |b, refs| {
            b.iter(|| {
                let lock = Uuid::new_v4();
                vault.reserve(lock, refs).expect("states are free");
                black_box(vault.release(lock, None))
            })
        });

        let criteria: QueryCriteria = VaultQueryCriteria::new().into();
        group.bench_with_input(BenchmarkId::new("query_unpaged", size), &criteria, |b, criteria| {
            b.iter(|| {
                black_box(vault.query(criteria, &PageSpecification::default(), &Sort::default()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_uniqueness_commit, bench_notarisation, bench_vault);

criterion_main!(benches);
