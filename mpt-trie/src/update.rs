//! # Proof-driven updates
//!
//! Computes the root a trie would have after writing one value, given only
//! the current root and the proof for the key. The nodes visited by the walk
//! are rebuilt bottom-up over an explicit stack, so the depth of the trie
//! never turns into recursion depth.

use alloy_primitives::B256;
use tracing::debug;

use crate::error::{Result, TrieError};
use crate::hasher::{node_ref, NodeHasher};
use crate::nibbles::{common_prefix_len, Nibbles};
use crate::node::{Node, NodeRef};
use crate::proof::MerkleTrie;
use crate::walker::{Outcome, Step, Walk};

/// What used to sit where a new branch is inserted
enum Displaced {
    /// A leaf's value; its remaining path is hung below the new branch
    Leaf(Vec<u8>),
    /// An extension's child; its remaining path is kept in front of it
    Extension(NodeRef),
}

impl<H: NodeHasher> MerkleTrie<H> {
    /// Compute the root after setting `key` to `value`.
    ///
    /// `proof` must be the proof for `key` against `root`, whether or not the
    /// key is currently present. An empty proof against the empty root
    /// yields a single-leaf trie.
    pub fn update<T: AsRef<[u8]>>(&self, key: &[u8], value: &[u8], proof: &[T], root: B256) -> Result<B256> {
        let nibbles = Nibbles::from_bytes(key);
        let path = nibbles.as_slice();

        let Some(Walk { mut steps, outcome }) = self.walk(path, proof, root)? else {
            let leaf = Node::leaf(nibbles.clone(), value.to_vec());
            return Ok(self.hasher().digest(&leaf.encode()));
        };

        let Step {
            node: terminal,
            offset,
        } = steps
            .pop()
            .ok_or_else(|| TrieError::invalid_proof(0, "proof walk visited no nodes"))?;
        let mut node = self.splice(terminal, outcome, &path[offset..], value)?;
        debug!(?outcome, depth = steps.len() + 1, kind = node.kind(), "spliced value into terminal node");

        while let Some(Step { node: parent, offset }) = steps.pop() {
            node = match parent {
                Node::Extension { path: prefix, .. } => self.prepend(prefix, node),
                Node::Branch {
                    mut children,
                    value: own,
                } => {
                    let slot = *path.get(offset).ok_or_else(|| {
                        TrieError::invalid_proof(steps.len(), "branch ancestor without a key nibble")
                    })? as usize;
                    children[slot] = Some(self.reference(&node));

                    // A lone child with no value folds into its parent's path
                    let occupied = children.iter().filter(|c| c.is_some()).count();
                    if occupied == 1 && own.is_none() {
                        self.prepend(Nibbles::from_raw(vec![slot as u8]), node)
                    } else {
                        Node::Branch { children, value: own }
                    }
                }
                Node::Leaf { .. } => {
                    return Err(TrieError::invalid_proof(
                        steps.len(),
                        "leaf above the terminal node",
                    ))
                }
            };
        }

        let new_root = self.hasher().digest(&node.encode());
        debug!(%root, %new_root, "computed updated root");
        Ok(new_root)
    }

    /// Write `value` into the node the walk stopped at
    fn splice(&self, terminal: Node, outcome: Outcome, rest: &[u8], value: &[u8]) -> Result<Node> {
        let node = match (terminal, outcome) {
            (Node::Leaf { path, .. }, Outcome::Found) => Node::leaf(path, value.to_vec()),
            (Node::Leaf { path, value: old }, Outcome::LeafDiverged) => {
                self.diverge(path, Displaced::Leaf(old), rest, value)?
            }
            (Node::Extension { path, child }, Outcome::ExtensionDiverged) => {
                self.diverge(path, Displaced::Extension(child), rest, value)?
            }
            (Node::Branch { children, .. }, Outcome::Found | Outcome::MissingBranchValue) => {
                // A childless branch holding only a value is a leaf
                if children.iter().all(Option::is_none) {
                    Node::leaf(Nibbles::new(), value.to_vec())
                } else {
                    Node::Branch {
                        children,
                        value: Some(value.to_vec()),
                    }
                }
            }
            (Node::Branch { mut children, value: own }, Outcome::EmptySlot) => {
                let (&nibble, tail) = rest
                    .split_first()
                    .ok_or_else(|| TrieError::invalid_proof(0, "empty slot without a key nibble"))?;
                let leaf = Node::leaf(Nibbles::from(tail), value.to_vec());
                children[nibble as usize] = Some(self.reference(&leaf));
                Node::Branch { children, value: own }
            }
            _ => {
                return Err(TrieError::invalid_proof(
                    0,
                    "walk outcome does not match the terminal node",
                ))
            }
        };

        Ok(node)
    }

    /// Insert a branch where `rest` leaves `path`, keeping the shared part
    /// as an extension in front of it.
    fn diverge(&self, path: Nibbles, displaced: Displaced, rest: &[u8], value: &[u8]) -> Result<Node> {
        let common = common_prefix_len(path.as_slice(), rest);
        let old_tail = &path.as_slice()[common..];
        let new_tail = &rest[common..];

        let mut children: Box<[Option<NodeRef>; 16]> = Box::default();
        let mut branch_value = None;

        match (displaced, old_tail.split_first()) {
            (Displaced::Leaf(old), None) => branch_value = Some(old),
            (Displaced::Leaf(old), Some((&nibble, tail))) => {
                let leaf = Node::leaf(Nibbles::from(tail), old);
                children[nibble as usize] = Some(self.reference(&leaf));
            }
            (Displaced::Extension(child), Some((&nibble, []))) => {
                children[nibble as usize] = Some(child);
            }
            (Displaced::Extension(child), Some((&nibble, tail))) => {
                let extension = Node::extension(Nibbles::from(tail), child);
                children[nibble as usize] = Some(self.reference(&extension));
            }
            (Displaced::Extension(_), None) => {
                return Err(TrieError::invalid_proof(
                    0,
                    "extension path fully shared with a diverging key",
                ))
            }
        }

        match new_tail.split_first() {
            None => branch_value = Some(value.to_vec()),
            Some((&nibble, tail)) => {
                let leaf = Node::leaf(Nibbles::from(tail), value.to_vec());
                children[nibble as usize] = Some(self.reference(&leaf));
            }
        }

        let branch = Node::Branch {
            children,
            value: branch_value,
        };
        debug!(shared = common, "inserted branch at divergence");

        if common == 0 {
            Ok(branch)
        } else {
            Ok(Node::extension(Nibbles::from(&rest[..common]), self.reference(&branch)))
        }
    }

    /// Put `prefix` in front of `child`, merging paths when the child has one
    fn prepend(&self, mut prefix: Nibbles, child: Node) -> Node {
        match child {
            Node::Leaf { path, value } => {
                prefix.extend(&path);
                Node::leaf(prefix, value)
            }
            Node::Extension { path, child } => {
                prefix.extend(&path);
                Node::extension(prefix, child)
            }
            branch @ Node::Branch { .. } => Node::extension(prefix, self.reference(&branch)),
        }
    }

    fn reference(&self, node: &Node) -> NodeRef {
        node_ref(self.hasher(), &node.encode())
    }
}

/// Compute the Keccak-256 root after writing a value. See [`MerkleTrie::update`].
pub fn update<T: AsRef<[u8]>>(key: &[u8], value: &[u8], proof: &[T], root: B256) -> Result<B256> {
    MerkleTrie::new().update(key, value, proof, root)
}
