//! Claim leaves and Merkle proofs.
//!
//! A claim leaf commits to `(claimer, amount)`:
//!
//! `leaf = BLAKE3::hash(0x00 || claimer[20] || BE256(amount))`
//!
//! Inner nodes hash sorted pairs (see [`blake3::merkle_pair`]), so a proof is
//! just the list of sibling hashes from the leaf up to the root.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use votemarket_types::{Address, Amount, Hash, ZERO_HASH};

use crate::{blake3, CryptoError, Result};

/// Compute the leaf hash for a claimer's allocation.
///
/// The amount is encoded as a 32-byte big-endian integer.
pub fn claim_leaf(claimer: &Address, amount: Amount) -> Hash {
    let mut data = [0u8; Address::LEN + 32];
    data[..Address::LEN].copy_from_slice(claimer.as_bytes());
    data[Address::LEN + 16..].copy_from_slice(&amount.to_be_bytes());
    blake3::merkle_leaf(&data)
}

/// Returns true if `leaf` can be proved to be part of the tree with `root`.
///
/// Folds the proof from the leaf upward, hashing each pair in sorted order.
/// A zero root is never valid.
pub fn verify_proof(proof: &[Hash], root: &Hash, leaf: Hash) -> bool {
    if root == &ZERO_HASH {
        return false;
    }
    let computed = proof
        .iter()
        .fold(leaf, |computed, sibling| blake3::merkle_pair(&computed, sibling));
    &computed == root
}

/// Verify a claim of `amount` by `claimer` against `root`.
pub fn verify_claim(root: &Hash, claimer: &Address, amount: Amount, proof: &[Hash]) -> bool {
    verify_proof(proof, root, claim_leaf(claimer, amount))
}

/// A binary Merkle tree over pre-hashed leaves.
///
/// Adjacent nodes are paired level by level; an odd trailing node is promoted
/// to the next level unchanged.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from leaf hashes, in order.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::EmptyTree`] if `leaves` is empty
    pub fn new(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }

        let mut layers = vec![leaves];
        while let Some(layer) = layers.last() {
            if layer.len() == 1 {
                break;
            }
            let next: Vec<Hash> = layer
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => blake3::merkle_pair(left, right),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }

        Ok(Self { layers })
    }

    /// The root hash.
    pub fn root(&self) -> Hash {
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(ZERO_HASH)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Whether the tree has no leaves. Always false for a constructed tree.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sibling path for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::LeafOutOfRange`] if `index >= len()`
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        if index >= self.len() {
            return Err(CryptoError::LeafOutOfRange {
                index,
                len: self.len(),
            });
        }

        let mut proof = Vec::with_capacity(self.layers.len());
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = position ^ 1;
            if let Some(hash) = layer.get(sibling) {
                proof.push(*hash);
            }
            position /= 2;
        }
        Ok(proof)
    }
}

/// One claimer's entry in an allocation tree, with its proof.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationNode {
    pub claimer: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    #[serde_as(as = "Vec<Hex>")]
    pub proof: Vec<Hash>,
}

/// The allocation of one distribution: every claimer's amount, the root to
/// publish, and each claimer's proof.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllocationTree {
    #[serde_as(as = "Hex")]
    pub merkle_root: Hash,
    #[serde_as(as = "DisplayFromStr")]
    pub total_amount: Amount,
    pub nodes: Vec<AllocationNode>,
}

impl AllocationTree {
    /// Build the tree for a list of `(claimer, amount)` allocations.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::EmptyTree`] if `allocations` is empty
    /// - [`CryptoError::DuplicateClaimer`] if a claimer appears twice
    pub fn new(allocations: &[(Address, Amount)]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(allocations.len());
        for (claimer, _) in allocations {
            if !seen.insert(*claimer) {
                return Err(CryptoError::DuplicateClaimer(claimer.to_string()));
            }
        }

        let leaves = allocations
            .iter()
            .map(|(claimer, amount)| claim_leaf(claimer, *amount))
            .collect();
        let tree = MerkleTree::new(leaves)?;

        let mut nodes = Vec::with_capacity(allocations.len());
        for (i, (claimer, amount)) in allocations.iter().enumerate() {
            nodes.push(AllocationNode {
                claimer: *claimer,
                amount: *amount,
                proof: tree.proof(i)?,
            });
        }

        let total_amount = allocations
            .iter()
            .fold(0u128, |total, (_, amount)| total.saturating_add(*amount));

        tracing::debug!(
            leaves = nodes.len(),
            total_amount,
            root = %hex::encode(tree.root()),
            "built allocation tree"
        );

        Ok(Self {
            merkle_root: tree.root(),
            total_amount,
            nodes,
        })
    }

    /// Look up a claimer's node.
    pub fn node(&self, claimer: &Address) -> Option<&AllocationNode> {
        self.nodes.iter().find(|n| &n.claimer == claimer)
    }
}
