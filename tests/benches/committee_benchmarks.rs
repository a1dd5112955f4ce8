//! # MeshPay Committee Benchmarks
//!
//! Hot paths on every certificate a client collects:
//!
//! | Crate | Path | Called |
//! |-------|------|--------|
//! | mp-01 Committee | `compute_weights` (cached / cold) | per weighted check |
//! | mp-01 Committee | `has_weighted_quorum`, `has_equal_quorum` | per certificate |
//! | mp-01 Committee | `update_authority_performance` | per published counter |
//! | mp-04 DAG Ledger | `commit_ready_blocks` | per vote batch |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mp_01_committee::{has_equal_quorum, has_weighted_quorum, Committee};
use mp_04_dag_ledger::DagLedger;
use rand::Rng;
use serde_json::json;
use shared_types::{Address, AuthorityState, NodeType};
use std::collections::HashSet;

const TWO_THIRDS: f64 = 2.0 / 3.0;
const SIZES: [usize; 4] = [4, 16, 64, 256];

fn committee_of(size: usize) -> Committee {
    let names: HashSet<String> = (0..size).map(|i| format!("auth{}", i)).collect();
    let mut rng = rand::thread_rng();
    let authorities = (0..size)
        .map(|i| {
            let name = format!("auth{}", i);
            let address = Address::new(&name, "10.0.0.1", 8000 + i as u16, NodeType::Authority);
            let mut state = AuthorityState::new(&name, address, names.clone());
            state.transaction_count = rng.gen_range(50..500);
            state.error_count = rng.gen_range(0..50);
            state
        })
        .collect();
    Committee::new(authorities).unwrap()
}

// ============================================================================
// MP-01: Weight computation
// ============================================================================

fn bench_compute_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("mp-01-weights");

    for size in SIZES {
        let committee = committee_of(size);
        group.throughput(Throughput::Elements(size as u64));

        committee.compute_weights();
        group.bench_with_input(BenchmarkId::new("cached", size), &committee, |b, committee| {
            b.iter(|| black_box(committee.compute_weights()))
        });

        group.bench_with_input(BenchmarkId::new("cold", size), &committee, |b, committee| {
            b.iter(|| {
                committee.update_authority_performance("auth0", 100, 1).unwrap();
                black_box(committee.compute_weights())
            })
        });
    }

    group.finish();
}

// ============================================================================
// MP-01: Quorum predicates
// ============================================================================

fn bench_quorum_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("mp-01-quorum");

    for size in SIZES {
        let committee = committee_of(size);
        let signers: Vec<String> = (0..size * 2 / 3 + 1).map(|i| format!("auth{}", i)).collect();

        group.bench_with_input(BenchmarkId::new("equal", size), &signers, |b, signers| {
            b.iter(|| black_box(has_equal_quorum(signers.iter(), size, TWO_THIRDS)))
        });

        group.bench_with_input(BenchmarkId::new("weighted", size), &signers, |b, signers| {
            b.iter(|| black_box(has_weighted_quorum(signers.iter(), &committee, TWO_THIRDS)))
        });

        group.bench_with_input(
            BenchmarkId::new("by_names", size),
            &signers,
            |b, signers| b.iter(|| black_box(committee.has_quorum_by_names(signers.iter()))),
        );
    }

    group.finish();
}

// ============================================================================
// MP-04: DAG commit
// ============================================================================

fn bench_dag_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("mp-04-dag-commit");

    for blocks in [16usize, 128] {
        group.throughput(Throughput::Elements(blocks as u64));
        group.bench_function(BenchmarkId::new("chain", blocks), |b| {
            b.iter(|| {
                let mut dag = DagLedger::new(3).unwrap();
                let mut ids = Vec::with_capacity(blocks);
                for seq in 0..blocks {
                    let block = dag.create_block("auth0", json!({ "seq": seq }), None).unwrap();
                    ids.push(block.block_id());
                    dag.add_block(block).unwrap();
                }
                for id in ids.iter().rev() {
                    for voter in ["auth0", "auth1", "auth2"] {
                        dag.record_vote(*id, voter, "sig").unwrap();
                    }
                }
                black_box(dag.commit_ready_blocks().len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_weights,
    bench_quorum_checks,
    bench_dag_commit
);
criterion_main!(benches);
