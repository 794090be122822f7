//! Test vector generator for claim hashing and Merkle proofs.
//!
//! Generates `test_vectors.json` with leaf, inner-node, root and proof
//! vectors. Off-chain tree builders in other languages check themselves
//! against this file.
//!
//! Usage:
//!   votemarket-testvec              # Generate test_vectors.json
//!   votemarket-testvec --verify     # Verify test vectors match expected values

use std::collections::BTreeMap;
use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use votemarket_crypto::blake3::{self, contexts};
use votemarket_crypto::merkle::claim_leaf;
use votemarket_crypto::{AllocationTree, MerkleTree};
use votemarket_types::{Address, Amount};

const VECTORS_PATH: &str = "tests/fixtures/test_vectors.json";

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

/// Deterministic account `i`: the first 20 bytes of a derived key.
fn account(i: u8) -> Address {
    let key = blake3::derive_key(contexts::TEST_VECTOR_ACCOUNT, &[i]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&key[..20]);
    Address(bytes)
}

fn allocations() -> Vec<(Address, Amount)> {
    vec![
        (account(1), 55_190_000_000_000_000_000),
        (account(2), 20_000_000_000_000_000_000),
        (account(3), 15_000_000_000_000_000_000),
        (account(4), 6_000_000_000_000_000_000),
        (account(5), 3_810_000_000_000_000_000),
    ]
}

fn generate_hash_vectors() -> BTreeMap<String, TestVector> {
    let mut vectors = BTreeMap::new();

    let k_inner = blake3::derive_key(contexts::MERKLE_INNER_NODE, b"");
    vectors.insert(
        "blake3_inner_node_key".to_string(),
        TestVector {
            description: "K_inner = BLAKE3::derive_key(\"votemarket v1 merkle-inner-node\", \"\")"
                .to_string(),
            inputs: BTreeMap::from([(
                "context".to_string(),
                contexts::MERKLE_INNER_NODE.to_string(),
            )]),
            outputs: BTreeMap::from([("k_inner".to_string(), hex::encode(k_inner))]),
        },
    );

    let claimer = Address::repeat_byte(0x01);
    let amount: Amount = 55_190_000_000_000_000_000;
    let leaf = claim_leaf(&claimer, amount);
    vectors.insert(
        "claim_leaf".to_string(),
        TestVector {
            description: "BLAKE3::hash(0x00 || claimer || BE256(amount))".to_string(),
            inputs: BTreeMap::from([
                ("claimer".to_string(), claimer.to_string()),
                ("amount".to_string(), amount.to_string()),
            ]),
            outputs: BTreeMap::from([("leaf".to_string(), hex::encode(leaf))]),
        },
    );

    let other = claim_leaf(&Address::repeat_byte(0x02), 1);
    vectors.insert(
        "merkle_pair_sorted".to_string(),
        TestVector {
            description: "BLAKE3::keyed_hash(K_inner, min(a,b) || max(a,b))".to_string(),
            inputs: BTreeMap::from([
                ("a".to_string(), hex::encode(leaf)),
                ("b".to_string(), hex::encode(other)),
            ]),
            outputs: BTreeMap::from([(
                "node".to_string(),
                hex::encode(blake3::merkle_pair(&leaf, &other)),
            )]),
        },
    );

    vectors
}

fn generate_tree_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();

    let allocations = allocations();
    let tree = AllocationTree::new(&allocations)?;
    let mut inputs = BTreeMap::new();
    let mut outputs = BTreeMap::from([
        ("merkle_root".to_string(), hex::encode(tree.merkle_root)),
        ("total_amount".to_string(), tree.total_amount.to_string()),
    ]);
    for (i, node) in tree.nodes.iter().enumerate() {
        inputs.insert(
            format!("allocation_{i}"),
            format!("{}:{}", node.claimer, node.amount),
        );
        let proof: Vec<String> = node.proof.iter().map(hex::encode).collect();
        outputs.insert(format!("proof_{i}"), proof.join(","));
    }
    vectors.insert(
        "allocation_tree_5".to_string(),
        TestVector {
            description: "Five allocations to derived accounts; root and per-claimer proofs"
                .to_string(),
            inputs,
            outputs,
        },
    );

    let single = claim_leaf(&account(1), 1);
    let tree = MerkleTree::new(vec![single])?;
    vectors.insert(
        "single_leaf_tree".to_string(),
        TestVector {
            description: "A one-leaf tree's root is the leaf; its proof is empty".to_string(),
            inputs: BTreeMap::from([("leaf".to_string(), hex::encode(single))]),
            outputs: BTreeMap::from([
                ("root".to_string(), hex::encode(tree.root())),
                ("proof_0".to_string(), tree.proof(0)?.len().to_string()),
            ]),
        },
    );

    let leaves: Vec<_> = (1..=3).map(|i| claim_leaf(&account(i), Amount::from(i))).collect();
    let tree = MerkleTree::new(leaves.clone())?;
    vectors.insert(
        "odd_leaf_promotion".to_string(),
        TestVector {
            description: "Three leaves: the trailing leaf is promoted unhashed".to_string(),
            inputs: leaves
                .iter()
                .enumerate()
                .map(|(i, leaf)| (format!("leaf_{i}"), hex::encode(leaf)))
                .collect(),
            outputs: BTreeMap::from([("root".to_string(), hex::encode(tree.root()))]),
        },
    );

    Ok(vectors)
}

fn generate_all_vectors() -> anyhow::Result<TestVectors> {
    let mut all_vectors = BTreeMap::new();
    all_vectors.extend(generate_hash_vectors());
    all_vectors.extend(generate_tree_vectors()?);

    Ok(TestVectors {
        version: "1.0".to_string(),
        generated_by: "votemarket-testvec".to_string(),
        vectors: all_vectors,
    })
}

fn verify_vectors(vectors: &TestVectors) -> anyhow::Result<bool> {
    let regenerated = generate_all_vectors()?;
    let mut all_pass = true;

    for (name, expected) in &vectors.vectors {
        if let Some(actual) = regenerated.vectors.get(name) {
            if actual.outputs != expected.outputs {
                eprintln!("FAIL: {name}");
                eprintln!("  expected: {:?}", expected.outputs);
                eprintln!("  actual:   {:?}", actual.outputs);
                all_pass = false;
            } else {
                eprintln!("PASS: {name}");
            }
        } else {
            eprintln!("MISSING: {name}");
            all_pass = false;
        }
    }

    Ok(all_pass)
}

fn write_vectors(vectors: &TestVectors) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(vectors)?;
    if let Some(parent) = std::path::Path::new(VECTORS_PATH).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(VECTORS_PATH, json)?;
    eprintln!(
        "Generated {} test vectors to {VECTORS_PATH}",
        vectors.vectors.len()
    );
    Ok(())
}

fn run() -> anyhow::Result<bool> {
    let verify = std::env::args().any(|a| a == "--verify");

    if verify {
        if let Ok(content) = std::fs::read_to_string(VECTORS_PATH) {
            let vectors: TestVectors = serde_json::from_str(&content)?;
            return verify_vectors(&vectors);
        }
        eprintln!("No existing test vectors found at {VECTORS_PATH}. Generating...");
    }

    let vectors = generate_all_vectors()?;
    write_vectors(&vectors)?;
    verify_vectors(&vectors)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => {
            eprintln!("All test vectors verified successfully.");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("Test vector verification FAILED.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
