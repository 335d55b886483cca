//! Binary Merkle tree with sorted-pair keccak hashing.
//!
//! This is the commitment scheme verified by the MCMS contracts: each parent is
//! `keccak256(min(a, b) ‖ max(a, b))`, so proofs are plain sibling lists without position
//! flags. Layers with an odd number of nodes duplicate their last node.

use alloy_primitives::{B256, keccak256};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    #[error("merkle tree does not contain hash: {0}")]
    TreeNodeNotFound(B256),
    #[error("no layers in the Merkle tree")]
    NoLayers,
}

/// Hashes two nodes in ascending byte order.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Recomputes the root from a leaf and its sibling list.
pub fn compute_root(leaf: B256, proof: &[B256]) -> B256 {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling))
}

/// Checks that `proof` links `leaf` to `root`.
pub fn verify_proof(leaf: B256, proof: &[B256], root: B256) -> bool {
    compute_root(leaf, proof) == root
}

/// A Merkle tree built from a list of leaf hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: B256,
    leaves: Vec<B256>,
    /// Every layer below the root, leaves first, each padded to an even length.
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Builds a tree over `leaves` in the given order.
    ///
    /// An empty leaf list produces the zero root. A single leaf is its own root.
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut layers = Vec::new();
        if leaves.is_empty() {
            return Self { root: B256::ZERO, leaves, layers };
        }

        let mut current = leaves.clone();
        while current.len() > 1 {
            if current.len() % 2 != 0 {
                current.push(current[current.len() - 1]);
            }

            let next = current.chunks_exact(2).map(|pair| hash_pair(pair[0], pair[1])).collect();
            layers.push(current);
            current = next;
        }

        let root = current[0];
        debug!(leaves = leaves.len(), depth = layers.len(), %root, "Built merkle tree");

        Self { root, leaves, layers }
    }

    /// Builds a tree after sorting `leaves` ascending by byte value.
    pub fn from_unsorted(mut leaves: Vec<B256>) -> Self {
        leaves.sort_unstable();
        Self::new(leaves)
    }

    pub const fn root(&self) -> B256 {
        self.root
    }

    /// The leaves in tree order, without padding.
    pub fn leaves(&self) -> &[B256] {
        &self.leaves
    }

    /// Number of hashing layers below the root.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Returns the sibling path from `leaf` to the root.
    pub fn get_proof(&self, leaf: B256) -> Result<Vec<B256>, MerkleError> {
        if !self.leaves.contains(&leaf) {
            return Err(MerkleError::TreeNodeNotFound(leaf));
        }

        let mut proof = Vec::with_capacity(self.layers.len());
        let mut target = leaf;
        for layer in &self.layers {
            let index = layer
                .iter()
                .position(|node| *node == target)
                .ok_or(MerkleError::TreeNodeNotFound(target))?;

            let sibling = layer[index ^ 1];
            proof.push(sibling);
            target = hash_pair(target, sibling);
        }

        Ok(proof)
    }

    /// Returns the proof of every leaf keyed by leaf hash.
    pub fn get_proofs(&self) -> Result<HashMap<B256, Vec<B256>>, MerkleError> {
        if self.leaves.is_empty() {
            return Err(MerkleError::NoLayers);
        }

        self.leaves.iter().map(|leaf| Ok((*leaf, self.get_proof(*leaf)?))).collect()
    }
}
