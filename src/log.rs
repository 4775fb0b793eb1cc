// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Signed attestation of a scope log with a 16-tree merkle structure.
//!
//! Each operation is hashed into a leaf covering its id, position and the
//! state hash it committed. The leaves are arranged into a 16-ary merkle
//! tree, and the roots are signed along with the document id, the scope and
//! the log length. A replica receiving a batch of operations can then tell a
//! corrupted, truncated or reordered batch apart from a genuine one, and can
//! check a single operation against a head with a membership proof.

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::document::Operation;
use crate::document::Scope;
use crate::key::Hash;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::key::Signature;

/// Type constant for leaf node hashes (operation hashes).
pub const TYPE_LEAF: u8 = 0x00;

/// Type constant for parent node hashes (internal tree nodes).
pub const TYPE_PARENT: u8 = 0x01;

/// Type constant for the signed head.
pub const TYPE_ROOT: u8 = 0x02;

/// The branching factor of the tree. 16 allows up to 2^64 operations.
pub const BRANCHING: usize = 16;

/// Hash an operation to produce a leaf hash with domain separation.
pub fn hash_leaf(operation: &Operation) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[TYPE_LEAF]);
    hasher.update(&(operation.id.len() as u64).to_le_bytes());
    hasher.update(operation.id.as_bytes());
    hasher.update(&operation.index.to_le_bytes());
    hasher.update(&operation.skip.to_le_bytes());
    hasher.update(operation.scope.as_str().as_bytes());
    match &operation.hash {
        Some(state) => {
            hasher.update(&[1]);
            hasher.update(&state.0);
        }
        None => {
            hasher.update(&[0]);
        }
    }
    return Hash(*hasher.finalize().as_bytes());
}

/// Hash a set of child hashes to produce a parent hash with domain separation.
pub fn hash_parent(children: &[Hash]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[TYPE_PARENT]);
    hasher.update(&(children.len() as u64).to_le_bytes());
    for child in children {
        hasher.update(&child.0);
    }
    return Hash(*hasher.finalize().as_bytes());
}

/// The message a head signature covers.
fn signable(document_id: &str, scope: Scope, roots: &[Hash], length: u64) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[TYPE_ROOT]);
    hasher.update(&(document_id.len() as u64).to_le_bytes());
    hasher.update(document_id.as_bytes());
    hasher.update(scope.as_str().as_bytes());
    hasher.update(&length.to_le_bytes());
    hasher.update(&(roots.len() as u64).to_le_bytes());
    for root in roots {
        hasher.update(&root.0);
    }
    return hasher.finalize().as_bytes().to_vec();
}

/// Collapse every full group of `BRANCHING` hashes into its parent. A
/// trailing partial group is carried up unchanged.
fn collapse(level: &[Hash]) -> Vec<Hash> {
    let mut next = Vec::with_capacity(level.len() / BRANCHING + BRANCHING);
    for group in level.chunks(BRANCHING) {
        if group.len() == BRANCHING {
            next.push(hash_parent(group));
        } else {
            next.extend_from_slice(group);
        }
    }
    return next;
}

fn roots_of(leaves: Vec<Hash>) -> Vec<Hash> {
    let mut current = leaves;
    while current.len() >= BRANCHING {
        current = collapse(&current);
    }
    return current;
}

/// The merkle tree over one scope log of one document.
pub struct ScopeLog {
    document_id: String,
    scope: Scope,
    leaves: Vec<Hash>,
}

/// A signed snapshot of a scope log, verifiable without the secret key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHead {
    pub author: KeyPub,
    pub document_id: String,
    pub scope: Scope,
    pub length: u64,
    pub roots: Vec<Hash>,
    pub signature: Signature,
}

/// A proof that an operation belongs to a signed head.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Sibling hashes at each level, from leaf to root.
    pub levels: Vec<ProofLevel>,
}

/// One level of a membership proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofLevel {
    /// The sibling hashes at this level, not including the one being proven.
    pub siblings: SmallVec<[Hash; BRANCHING - 1]>,
    /// Our position among the children (0..BRANCHING).
    pub position: usize,
}

impl ScopeLog {
    pub fn new(document_id: impl Into<String>, scope: Scope, operations: &[Operation]) -> ScopeLog {
        return ScopeLog {
            document_id: document_id.into(),
            scope,
            leaves: operations.iter().map(hash_leaf).collect(),
        };
    }

    /// Return the number of operations in the log.
    pub fn len(&self) -> u64 {
        return self.leaves.len() as u64;
    }

    pub fn is_empty(&self) -> bool {
        return self.leaves.is_empty();
    }

    /// Compute the current roots of the 16-tree.
    pub fn compute_roots(&self) -> Vec<Hash> {
        return roots_of(self.leaves.clone());
    }

    /// Sign the current state of the log.
    pub fn sign(&self, keypair: &KeyPair) -> SignedHead {
        let roots = self.compute_roots();
        let message = signable(&self.document_id, self.scope, &roots, self.len());
        let signature = keypair.sign(&message);
        debug!(document = %self.document_id, scope = %self.scope, length = self.len(), roots = roots.len(), "signed log head");
        return SignedHead {
            author: keypair.key_pub,
            document_id: self.document_id.clone(),
            scope: self.scope,
            length: self.len(),
            roots,
            signature,
        };
    }

    /// Generate a proof that the operation at `position` belongs to this log.
    pub fn proof(&self, position: u64) -> Option<Proof> {
        if position >= self.len() {
            return None;
        }

        let mut levels = Vec::new();
        let mut current = self.leaves.clone();
        let mut position = position as usize;

        while current.len() >= BRANCHING {
            let group_start = position / BRANCHING * BRANCHING;
            let group_end = (group_start + BRANCHING).min(current.len());

            // Only full groups hash into a parent; a partial group is
            // carried up and needs no level in the proof.
            if group_end - group_start == BRANCHING {
                let siblings = (group_start..group_end)
                    .filter(|i| *i != position)
                    .map(|i| current[i])
                    .collect();
                levels.push(ProofLevel {
                    siblings,
                    position: position % BRANCHING,
                });
                position /= BRANCHING;
            } else {
                position = current.len() / BRANCHING + (position - group_start);
            }
            current = collapse(&current);
        }

        return Some(Proof { levels });
    }
}

impl SignedHead {
    /// Verify that this head was signed by its author.
    pub fn verify(&self) -> bool {
        let message = signable(&self.document_id, self.scope, &self.roots, self.length);
        return self.author.verify(&message, &self.signature);
    }

    /// Verify that `operation` belongs to this head.
    pub fn verify_proof(&self, position: u64, operation: &Operation, proof: &Proof) -> bool {
        if position >= self.length || operation.scope != self.scope {
            return false;
        }

        let mut current = hash_leaf(operation);
        for level in &proof.levels {
            if level.position >= BRANCHING || level.siblings.len() != BRANCHING - 1 {
                return false;
            }
            let mut children = Vec::with_capacity(BRANCHING);
            children.extend_from_slice(&level.siblings[..level.position]);
            children.push(current);
            children.extend_from_slice(&level.siblings[level.position..]);
            current = hash_parent(&children);
        }

        return self.roots.contains(&current);
    }

    /// Verify a whole batch of operations against this head: the signature
    /// must hold and the batch must rebuild exactly the signed roots.
    pub fn verify_operations(&self, operations: &[Operation]) -> bool {
        if !self.verify() || operations.len() as u64 != self.length {
            return false;
        }
        let log = ScopeLog::new(self.document_id.clone(), self.scope, operations);
        return log.compute_roots() == self.roots;
    }
}
