//! Merkle tree over batch event hashes
//!
//! Builds a balanced binary tree with SHA-256 over concatenated raw digest
//! bytes. An odd-length level duplicates its last node, and that duplication
//! is applied at each level independently. This is not power-of-two padding,
//! and the distinction matters for roots and proofs at most sizes.

use serde::{Deserialize, Serialize};

use crate::types::EventDigest;

/// Merkle tree retaining every level, leaves first
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<EventDigest>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a Merkle tree from ordered leaf digests
    pub fn build(leaves: &[EventDigest]) -> Self {
        if leaves.is_empty() {
            return Self {
                levels: Vec::new(),
                leaf_count: 0,
            };
        }

        let mut levels = vec![leaves.to_vec()];
        while levels.last().map(Vec::len).unwrap_or(0) > 1 {
            let mut current = levels.last().cloned().unwrap_or_default();
            if current.len() % 2 != 0 {
                current.push(*current.last().expect("level is non-empty"));
            }
            let next: Vec<EventDigest> = current
                .chunks(2)
                .map(|pair| EventDigest::combine(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Self {
            levels,
            leaf_count: leaves.len(),
        }
    }

    /// Root of the tree; the empty tree commits to SHA-256 of the empty string
    pub fn root(&self) -> EventDigest {
        match self.levels.last().and_then(|level| level.first()) {
            Some(root) => *root,
            None => EventDigest::sha256(b""),
        }
    }

    /// Number of leaves the tree was built from
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Inclusion proof for the leaf at `index`
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count {
            return None;
        }

        let mut elements = Vec::new();
        let mut idx = index;

        // The topmost level is the root and contributes no sibling
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let (sibling_idx, position) = if idx % 2 == 0 {
                (idx + 1, ProofPosition::Right)
            } else {
                (idx - 1, ProofPosition::Left)
            };

            // An odd level is extended with a duplicate of its last node
            let sibling = if sibling_idx < level.len() {
                level[sibling_idx]
            } else {
                *level.last().expect("level is non-empty")
            };
            elements.push(ProofElement {
                hash: sibling,
                position,
            });

            idx /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            leaf_hash: self.levels[0][index],
            elements,
        })
    }
}

/// Side a proof sibling sits on relative to the current node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofPosition {
    Left,
    Right,
}

/// One step of an inclusion proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofElement {
    pub hash: EventDigest,
    pub position: ProofPosition,
}

/// Inclusion proof for one leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf_hash: EventDigest,
    pub elements: Vec<ProofElement>,
}

impl MerkleProof {
    /// Fold the proof from a leaf back up to a root
    pub fn compute_root(&self) -> EventDigest {
        let mut current = self.leaf_hash;
        for element in &self.elements {
            current = match element.position {
                ProofPosition::Left => EventDigest::combine(&element.hash, &current),
                ProofPosition::Right => EventDigest::combine(&current, &element.hash),
            };
        }
        current
    }

    /// Verify the proof against an expected root
    pub fn verify(&self, root: &EventDigest) -> bool {
        self.compute_root() == *root
    }
}
