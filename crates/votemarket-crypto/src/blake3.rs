//! Domain-separated BLAKE3 hashing.
//!
//! Leaves and inner nodes of claim trees hash under different domains so a
//! leaf can never be reinterpreted as an inner node (second-preimage attack).
//!
//! ## Modes
//!
//! - [`hash`] - Pure hashing, Merkle leaves (with a `0x00` prefix)
//! - [`derive_key`] - Key derivation from a registered context string
//! - [`keyed_hash`] - Keyed hashing, Merkle inner nodes

use votemarket_types::Hash;

/// Registered BLAKE3 context strings.
pub mod contexts {
    pub const MERKLE_INNER_NODE: &str = "votemarket v1 merkle-inner-node";
    pub const TEST_VECTOR_ACCOUNT: &str = "votemarket v1 test-vector-account";

    /// All registered context strings.
    pub const ALL_CONTEXTS: &[&str] = &[MERKLE_INNER_NODE, TEST_VECTOR_ACCOUNT];
}

/// Compute the BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> Hash {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's key derivation mode.
///
/// # Arguments
///
/// * `context` - A registered context string (see [`contexts`])
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> Hash {
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Compute a keyed BLAKE3 hash.
pub fn keyed_hash(key: &Hash, message: &[u8]) -> Hash {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Whether a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Merkle leaf hash: `BLAKE3::hash(0x00 || data)`.
pub fn merkle_leaf(data: &[u8]) -> Hash {
    let mut input = Vec::with_capacity(1 + data.len());
    input.push(0x00);
    input.extend_from_slice(data);
    hash(&input)
}

/// Merkle inner node hash, positional.
///
/// `BLAKE3::keyed_hash(K_inner, left || right)` with
/// `K_inner = BLAKE3::derive_key("votemarket v1 merkle-inner-node", "")`.
pub fn merkle_inner(left: &Hash, right: &Hash) -> Hash {
    let k_inner = derive_key(contexts::MERKLE_INNER_NODE, b"");
    let mut message = [0u8; 64];
    message[..32].copy_from_slice(left);
    message[32..].copy_from_slice(right);
    keyed_hash(&k_inner, &message)
}

/// Merkle inner node hash over a sorted pair.
///
/// The smaller hash goes first, so the result does not depend on which side
/// of the parent each child sits on. Proofs therefore carry no position bits.
pub fn merkle_pair(a: &Hash, b: &Hash) -> Hash {
    if a <= b {
        merkle_inner(a, b)
    } else {
        merkle_inner(b, a)
    }
}
