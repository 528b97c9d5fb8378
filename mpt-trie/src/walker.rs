//! # Proof walking
//!
//! Descends a proof from the root toward a key, checking at every entry that
//! the node is exactly the one its parent referenced. The walk stops at the
//! first node that decides whether the key is present, and records every
//! node it visited so the updater can rebuild them.

use alloy_primitives::B256;
use tracing::{debug, trace};

use crate::error::{Result, TrieError};
use crate::hasher::{node_ref, NodeHasher};
use crate::nibbles::common_prefix_len;
use crate::node::{Node, NodeRef};

/// How the descent ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The key is present; its value sits in the last visited node
    Found,
    /// A leaf's path differs from the rest of the key
    LeafDiverged,
    /// An extension's path is not a prefix of the rest of the key
    ExtensionDiverged,
    /// A branch has no child for the next key nibble
    EmptySlot,
    /// The key ends at a branch that holds no value
    MissingBranchValue,
}

/// A node visited during the descent
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub(crate) node: Node,
    /// Key nibbles consumed before reaching this node
    pub(crate) offset: usize,
}

/// Result of walking a proof for one key
#[derive(Debug)]
pub(crate) struct Walk {
    /// Visited nodes, root first. Never empty.
    pub(crate) steps: Vec<Step>,
    pub(crate) outcome: Outcome,
}

impl Walk {
    /// Value stored under the key, if the walk found it
    pub(crate) fn value(&self) -> Option<&[u8]> {
        if self.outcome != Outcome::Found {
            return None;
        }
        match &self.steps.last()?.node {
            Node::Leaf { value, .. } => Some(value.as_slice()),
            Node::Branch { value, .. } => value.as_deref(),
            Node::Extension { .. } => None,
        }
    }
}

/// Walk `proof` from `root` toward the nibble path `key`.
pub(crate) fn walk<H, T>(hasher: &H, key: &[u8], proof: &[T], root: B256) -> Result<Walk>
where
    H: NodeHasher + ?Sized,
    T: AsRef<[u8]>,
{
    let mut steps = Vec::with_capacity(proof.len());
    let mut expected = NodeRef::Hash(root);
    let mut offset = 0;

    for (index, entry) in proof.iter().enumerate() {
        let entry = entry.as_ref();

        // The root is addressed by digest whatever its size.
        let actual = if index == 0 {
            NodeRef::Hash(hasher.digest(entry))
        } else {
            node_ref(hasher, entry)
        };
        if actual != expected {
            return Err(TrieError::invalid_proof(
                index,
                "node does not match the reference held by its parent",
            ));
        }

        let node = Node::decode(entry)?;
        let remaining = &key[offset..];
        trace!(index, kind = node.kind(), offset, "visiting proof node");

        let next = match &node {
            Node::Leaf { path, .. } => {
                if path.as_slice() == remaining {
                    Err(Outcome::Found)
                } else {
                    Err(Outcome::LeafDiverged)
                }
            }
            Node::Extension { path, child } => {
                if common_prefix_len(path.as_slice(), remaining) == path.len() {
                    Ok((child.clone(), path.len()))
                } else {
                    Err(Outcome::ExtensionDiverged)
                }
            }
            Node::Branch { children, value } => match remaining.first() {
                None if value.is_some() => Err(Outcome::Found),
                None => Err(Outcome::MissingBranchValue),
                Some(&nibble) => match &children[nibble as usize] {
                    Some(child) => Ok((child.clone(), 1)),
                    None => Err(Outcome::EmptySlot),
                },
            },
        };

        steps.push(Step { node, offset });

        match next {
            Ok((child, consumed)) => {
                expected = child;
                offset += consumed;
            }
            Err(outcome) => {
                if index + 1 != proof.len() {
                    return Err(TrieError::invalid_proof(
                        index + 1,
                        "proof continues past the terminal node",
                    ));
                }
                debug!(?outcome, depth = steps.len(), offset, "proof walk terminated");
                return Ok(Walk { steps, outcome });
            }
        }
    }

    Err(TrieError::invalid_proof(
        proof.len(),
        "proof ended before the key was resolved",
    ))
}
