//! # Patricia Trie
//!
//! An in-memory trie with insert, get and proof generation. It exists to
//! build fixtures for the proof operations: the roots and proofs it produces
//! are derived independently of the proof-driven updater.

use std::collections::HashMap;

use alloy_primitives::B256;

use crate::hasher::{node_ref, Keccak256, NodeHasher, EMPTY_ROOT};
use crate::nibbles::{common_prefix_len, Nibbles};
use crate::node::{Node, NodeRef};

/// In-memory node store, keyed by digest
#[derive(Debug, Clone, Default)]
pub struct MemoryDB {
    nodes: HashMap<B256, Vec<u8>>,
}

impl MemoryDB {
    pub fn new() -> Self {
        MemoryDB {
            nodes: HashMap::new(),
        }
    }

    pub fn get(&self, hash: &B256) -> Option<&[u8]> {
        self.nodes.get(hash).map(Vec::as_slice)
    }

    pub fn insert(&mut self, hash: B256, data: Vec<u8>) {
        self.nodes.insert(hash, data);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Merkle Patricia Trie
#[derive(Debug)]
pub struct PatriciaTrie<H = Keccak256> {
    /// Root node, `None` for the empty trie
    root: Option<Node>,
    /// Hashed nodes
    db: MemoryDB,
    hasher: H,
}

impl PatriciaTrie<Keccak256> {
    /// Create new trie with in-memory database
    pub fn new_memory() -> Self {
        PatriciaTrie::with_hasher(Keccak256)
    }
}

impl<H: NodeHasher> PatriciaTrie<H> {
    /// Create new empty trie addressing nodes with `hasher`
    pub fn with_hasher(hasher: H) -> Self {
        PatriciaTrie {
            root: None,
            db: MemoryDB::new(),
            hasher,
        }
    }

    /// Get root hash
    pub fn root_hash(&self) -> B256 {
        match &self.root {
            Some(root) => self.hasher.digest(&root.encode()),
            None => EMPTY_ROOT,
        }
    }

    /// Check if trie is empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get value for key
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let nibbles = Nibbles::from_bytes(key);
        let mut key = nibbles.as_slice();
        let mut node = self.root.clone()?;

        loop {
            node = match node {
                Node::Leaf { path, value } => {
                    return (path.as_slice() == key).then_some(value);
                }
                Node::Extension { path, child } => {
                    key = key.strip_prefix(path.as_slice())?;
                    self.resolve(&child)?
                }
                Node::Branch { children, value } => match key.split_first() {
                    None => return value,
                    Some((&nibble, rest)) => {
                        key = rest;
                        self.resolve(children[nibble as usize].as_ref()?)?
                    }
                },
            };
        }
    }

    /// Collect the encoded nodes on the path to `key`, root first.
    ///
    /// The last entry is the node that decides whether `key` is present, so
    /// the result serves as an inclusion or an exclusion proof.
    pub fn prove(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let nibbles = Nibbles::from_bytes(key);
        let mut key = nibbles.as_slice();
        let mut proof = Vec::new();
        let mut next = self.root.clone();

        while let Some(node) = next {
            proof.push(node.encode());
            next = match node {
                Node::Leaf { .. } => None,
                Node::Extension { path, child } => match key.strip_prefix(path.as_slice()) {
                    Some(rest) => {
                        key = rest;
                        self.resolve(&child)
                    }
                    None => None,
                },
                Node::Branch { children, .. } => match key.split_first() {
                    Some((&nibble, rest)) => {
                        key = rest;
                        children[nibble as usize]
                            .as_ref()
                            .and_then(|child| self.resolve(child))
                    }
                    None => None,
                },
            };
        }

        proof
    }

    /// Insert key-value pair
    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) {
        let nibbles = Nibbles::from_bytes(key);
        let root = self.root.take();
        self.root = Some(self.insert_node(root, nibbles.as_slice(), value));
    }

    /// Internal recursive insert
    fn insert_node(&mut self, node: Option<Node>, key: &[u8], value: Vec<u8>) -> Node {
        let Some(node) = node else {
            return Node::leaf(Nibbles::from(key), value);
        };

        match node {
            Node::Leaf {
                path,
                value: leaf_value,
            } => {
                if path.as_slice() == key {
                    return Node::leaf(path, value);
                }

                // Split into branch at the first differing nibble
                let common = common_prefix_len(path.as_slice(), key);
                let mut children: Box<[Option<NodeRef>; 16]> = Box::default();
                let mut branch_value = None;
                self.place(&mut children, &mut branch_value, &path.as_slice()[common..], leaf_value);
                self.place(&mut children, &mut branch_value, &key[common..], value);

                self.with_prefix(&key[..common], Node::Branch {
                    children,
                    value: branch_value,
                })
            }

            Node::Extension { path, child } => {
                let common = common_prefix_len(path.as_slice(), key);

                if common == path.len() {
                    // Full match - descend into child
                    let child_node = self.resolve(&child);
                    let new_child = self.insert_node(child_node, &key[common..], value);
                    return Node::extension(path, self.store(new_child));
                }

                // Partial match - split extension
                let tail = &path.as_slice()[common..];
                let mut children: Box<[Option<NodeRef>; 16]> = Box::default();
                let mut branch_value = None;
                children[tail[0] as usize] = Some(if tail.len() == 1 {
                    child
                } else {
                    self.store(Node::extension(Nibbles::from(&tail[1..]), child))
                });
                self.place(&mut children, &mut branch_value, &key[common..], value);

                self.with_prefix(&key[..common], Node::Branch {
                    children,
                    value: branch_value,
                })
            }

            Node::Branch {
                mut children,
                value: branch_value,
            } => match key.split_first() {
                None => Node::Branch {
                    children,
                    value: Some(value),
                },
                Some((&nibble, rest)) => {
                    let slot = nibble as usize;
                    let child = children[slot].take().and_then(|c| self.resolve(&c));
                    let new_child = self.insert_node(child, rest, value);
                    children[slot] = Some(self.store(new_child));
                    Node::Branch {
                        children,
                        value: branch_value,
                    }
                }
            },
        }
    }

    /// Hang `value` off a new branch at the given key tail
    fn place(
        &mut self,
        children: &mut [Option<NodeRef>; 16],
        branch_value: &mut Option<Vec<u8>>,
        tail: &[u8],
        value: Vec<u8>,
    ) {
        match tail.split_first() {
            None => *branch_value = Some(value),
            Some((&nibble, rest)) => {
                children[nibble as usize] = Some(self.store(Node::leaf(Nibbles::from(rest), value)));
            }
        }
    }

    /// Wrap with extension if prefix exists
    fn with_prefix(&mut self, prefix: &[u8], node: Node) -> Node {
        if prefix.is_empty() {
            node
        } else {
            Node::extension(Nibbles::from(prefix), self.store(node))
        }
    }

    /// Store node in database, return reference
    fn store(&mut self, node: Node) -> NodeRef {
        let encoded = node.encode();
        let reference = node_ref(&self.hasher, &encoded);
        if let NodeRef::Hash(hash) = reference {
            self.db.insert(hash, encoded);
        }
        reference
    }

    /// Resolve a node reference
    fn resolve(&self, node_ref: &NodeRef) -> Option<Node> {
        match node_ref {
            NodeRef::Inline(data) => Node::decode(data).ok(),
            NodeRef::Hash(hash) => Node::decode(self.db.get(hash)?).ok(),
        }
    }
}
