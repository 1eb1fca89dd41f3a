//! Simple performance benchmarks for the large preimage engine
//!
//! Run with: cargo run --release --bin bench

use alloy_primitives::{keccak256, Address, B256};
use large_preimage::{
    api::{self, PreimageOracleData, ProofTarget, UploadCoordinator},
    config, verify_proof, AbiOracleBinding, CommitmentTree, OddNodePolicy, RecordingSender,
    StateMatrix, UploadConfig,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::time::{Duration, Instant};

fn main() {
    println!("\nLarge Preimage Performance Benchmarks");
    println!("=====================================\n");

    bench_microbenchmarks();
    bench_prepare();
    bench_proofs();
    bench_e2e();

    println!("\n✅ All benchmarks completed\n");
}

/// Time a single operation and print the result
fn time_operation<F, R>(name: &str, mut f: F) -> (Duration, R)
where
    F: FnMut() -> R,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    println!(
        "  {:<40} {:>12.3} ms",
        format!("{}:", name),
        duration.as_secs_f64() * 1000.0
    );
    (duration, result)
}

/// Time an operation multiple times and report average
fn time_operation_avg<F>(name: &str, iterations: usize, mut f: F) -> Duration
where
    F: FnMut(),
{
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let total = start.elapsed();
    let avg = total / iterations as u32;
    println!(
        "  {:<40} {:>12.6} ms (avg of {} runs)",
        format!("{}:", name),
        avg.as_secs_f64() * 1000.0,
        iterations
    );
    avg
}

fn bench_microbenchmarks() {
    println!("Microbenchmarks");
    println!("---------------");

    // One absorb plus commitment, the per-block cost of preparation
    let block = [0x5au8; config::KECCAK_RATE];
    let mut matrix = StateMatrix::new(config::KECCAK_RATE).unwrap();
    time_operation_avg(
        "Absorb block + state commitment",
        config::BENCHMARK_ABSORB_ITERATIONS,
        || {
            matrix.absorb(&block).unwrap();
            let _ = matrix.state_commitment();
        },
    );

    // Tree appends, one rightmost-path update each
    let leaves: Vec<B256> = (0..config::BENCHMARK_TREE_LEAVES)
        .map(|i| keccak256(i.to_le_bytes()))
        .collect();
    let (_, tree) = time_operation(
        &format!("Append {} leaves", config::BENCHMARK_TREE_LEAVES),
        || CommitmentTree::from_leaves(OddNodePolicy::default(), &leaves).unwrap(),
    );

    let index = config::BENCHMARK_TREE_LEAVES / 2;
    time_operation_avg(
        "Generate Merkle proof",
        config::BENCHMARK_PROOF_ITERATIONS,
        || {
            let _ = tree.proof(index).unwrap();
        },
    );

    let proof = tree.proof(index).unwrap();
    let root = tree.root();
    time_operation_avg(
        "Verify Merkle proof",
        config::BENCHMARK_PROOF_ITERATIONS,
        || {
            assert!(verify_proof(root, leaves[index], &proof, tree.policy()));
        },
    );

    println!();
}

fn bench_prepare() {
    println!("Preparation");
    println!("-----------");

    let upload_config = UploadConfig::default();
    for size_kb in config::BENCHMARK_PREIMAGE_SIZES_KB {
        let data = PreimageOracleData::new(generate_test_data(size_kb * 1024), 0);
        let (duration, prepared) = time_operation(&format!("Prepare {}KB preimage", size_kb), || {
            api::prepare_upload(Address::ZERO, &data, &upload_config).unwrap()
        });
        println!(
            "  {:<40} {:>12.1} MB/s ({} blocks)",
            "  throughput:",
            (size_kb as f64 / 1024.0) / duration.as_secs_f64(),
            prepared.block_count()
        );
    }

    println!();
}

fn bench_proofs() {
    println!("Finalization Proofs");
    println!("-------------------");

    let upload_config = UploadConfig::default();
    let size_kb = config::BENCHMARK_PREIMAGE_SIZES_KB[1];
    let data = PreimageOracleData::new(generate_test_data(size_kb * 1024), 0);
    let prepared = api::prepare_upload(Address::ZERO, &data, &upload_config).unwrap();

    let (_, proof) = time_operation(&format!("Materialize ({}KB, last block)", size_kb), || {
        api::materialize(
            &prepared.tree,
            &prepared.leaves,
            upload_config.rate,
            ProofTarget::Last,
        )
        .unwrap()
    });

    time_operation_avg(
        "Verify finalization proof",
        config::BENCHMARK_PROOF_ITERATIONS,
        || {
            proof.verify(upload_config.odd_node).unwrap();
        },
    );

    println!();
}

fn bench_e2e() {
    println!("End-to-End Upload");
    println!("-----------------");

    for size_kb in config::BENCHMARK_PREIMAGE_SIZES_KB {
        let data = PreimageOracleData::new(generate_test_data(size_kb * 1024), 0);
        let (_, outcome) = time_operation(&format!("Upload {}KB preimage", size_kb), || {
            let upload_config = UploadConfig::for_oracle(Address::repeat_byte(0xaa));
            let oracle = AbiOracleBinding::new(upload_config.oracle, upload_config.rate);
            let sender = RecordingSender::new(Address::repeat_byte(0x01));
            let mut coordinator = UploadCoordinator::new(upload_config, oracle, &sender).unwrap();
            let outcome = coordinator.upload_preimage(0, &data).unwrap();
            outcome
        });
        println!(
            "  {:<40} {:>12} txs, {:.1} KB calldata",
            "  sent:",
            outcome.transactions.len(),
            outcome.metrics.calldata_kb()
        );
    }

    println!();
}

// Helper functions

fn generate_test_data(size: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(config::BENCHMARK_SEED);
    let mut data = vec![0u8; size];
    rng.fill_bytes(&mut data);
    data
}
