//! Merkle inclusion proofs
//!
//! Leaves are SHA-256 hashed before use. Each level hashes the pair with
//! the lexicographically smaller node first, so proofs carry no
//! left/right flags.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub type Hash = [u8; 32];

/// Sibling hashes from the leaf level up to just below the root
pub type MerkleProof = Vec<Hash>;

pub fn hash_leaf(leaf: &[u8]) -> Hash {
    Sha256::digest(leaf).into()
}

pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update(second);
    hasher.finalize().into()
}

/// True when `leaf` hashes up to `root` through `proof`
pub fn verify_contained(leaf: &[u8], root: &Hash, proof: &[Hash]) -> bool {
    let computed = proof
        .iter()
        .fold(hash_leaf(leaf), |node, sibling| hash_pair(&node, sibling));
    computed == *root
}

/// Parse a 32-byte hash from hex or base58
pub fn parse_hash(s: &str) -> Result<Hash> {
    let bytes = if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(s).map_err(|e| Error::Serialization(format!("invalid hex hash: {}", e)))?
    } else {
        bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::Serialization(format!("invalid base58 hash: {}", e)))?
    };

    bytes
        .try_into()
        .map_err(|b: Vec<u8>| Error::Serialization(format!("hash must be 32 bytes, got {}", b.len())))
}
