//! # MPT Node Types
//!
//! The MPT has three node types:
//! 1. Leaf - stores a value at the end of a key
//! 2. Extension - shares a common prefix path
//! 3. Branch - 16-way branch point + optional value
//!
//! Nodes never own each other: a parent holds a [`NodeRef`] to each child.

use std::fmt;

use alloy_primitives::B256;

use crate::error::{Result, TrieError};
use crate::hasher::INLINE_THRESHOLD;
use crate::nibbles::Nibbles;
use crate::rlp::{self, Item};

/// Item count of an encoded branch node
const BRANCH_LIST_LENGTH: usize = 17;

/// Item count of an encoded leaf or extension node
const LEAF_OR_EXTENSION_LIST_LENGTH: usize = 2;

/// Reference from a parent node to a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    /// Inline data (< 32 bytes when RLP encoded)
    Inline(Vec<u8>),
    /// Digest of the child's encoding
    Hash(B256),
}

impl NodeRef {
    fn from_item(item: Item<'_>) -> Result<Option<Self>> {
        match item {
            Item::String([]) => Ok(None),
            Item::String(hash) if hash.len() == 32 => Ok(Some(NodeRef::Hash(B256::from_slice(hash)))),
            Item::String(other) => Err(TrieError::MalformedNode(format!(
                "child reference of {} bytes is neither a hash nor an embedded node",
                other.len()
            ))),
            Item::List(raw) if raw.len() < INLINE_THRESHOLD => Ok(Some(NodeRef::Inline(raw.to_vec()))),
            Item::List(raw) => Err(TrieError::MalformedNode(format!(
                "embedded node of {} bytes exceeds the inline threshold",
                raw.len()
            ))),
        }
    }

    fn as_item(&self) -> Item<'_> {
        match self {
            NodeRef::Inline(raw) => Item::List(raw),
            NodeRef::Hash(h) => Item::String(h.as_slice()),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Inline(raw) => write!(f, "inline:0x{}", hex::encode(raw)),
            NodeRef::Hash(h) => write!(f, "hash:0x{}", hex::encode(h)),
        }
    }
}

/// MPT node types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf node: [encoded_path, value]
    /// The path is the remaining key nibbles
    Leaf { path: Nibbles, value: Vec<u8> },

    /// Extension node: [encoded_path, child]
    /// The path is never empty
    Extension { path: Nibbles, child: NodeRef },

    /// Branch node: [child0, child1, ..., child15, value]
    /// 16 children (one per nibble) + optional value
    Branch {
        children: Box<[Option<NodeRef>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    /// Create branch node with no children and no value
    pub fn empty_branch() -> Self {
        Node::Branch {
            children: Box::default(),
            value: None,
        }
    }

    /// Create leaf node
    pub fn leaf(path: Nibbles, value: Vec<u8>) -> Self {
        Node::Leaf { path, value }
    }

    /// Create extension node
    pub fn extension(path: Nibbles, child: NodeRef) -> Self {
        debug_assert!(!path.is_empty(), "extension path must not be empty");
        Node::Extension { path, child }
    }

    /// Short name of the variant, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Leaf { .. } => "leaf",
            Node::Extension { .. } => "extension",
            Node::Branch { .. } => "branch",
        }
    }

    /// Decode an RLP encoded node
    pub fn decode(data: &[u8]) -> Result<Self> {
        let items = rlp::decode_list(data)?;

        match items.len() {
            BRANCH_LIST_LENGTH => {
                let mut children: Box<[Option<NodeRef>; 16]> = Box::default();
                for (slot, item) in children.iter_mut().zip(&items[..16]) {
                    *slot = NodeRef::from_item(*item)?;
                }

                let value = match items[16] {
                    Item::String([]) => None,
                    Item::String(value) => Some(value.to_vec()),
                    Item::List(_) => {
                        return Err(TrieError::MalformedNode(
                            "branch value must be a string".to_string(),
                        ))
                    }
                };

                Ok(Node::Branch { children, value })
            }
            LEAF_OR_EXTENSION_LIST_LENGTH => {
                let Item::String(encoded_path) = items[0] else {
                    return Err(TrieError::MalformedNode("node path must be a string".to_string()));
                };
                let (path, is_leaf) = Nibbles::decode_compact(encoded_path)?;

                if is_leaf {
                    let Item::String(value) = items[1] else {
                        return Err(TrieError::MalformedNode("leaf value must be a string".to_string()));
                    };
                    return Ok(Node::Leaf {
                        path,
                        value: value.to_vec(),
                    });
                }

                if path.is_empty() {
                    return Err(TrieError::MalformedNode("extension with empty path".to_string()));
                }
                let child = NodeRef::from_item(items[1])?.ok_or_else(|| {
                    TrieError::MalformedNode("extension without a child".to_string())
                })?;
                Ok(Node::Extension { path, child })
            }
            count => Err(TrieError::MalformedNode(format!(
                "expected {LEAF_OR_EXTENSION_LIST_LENGTH} or {BRANCH_LIST_LENGTH} items, found {count}"
            ))),
        }
    }

    /// RLP encode this node
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Node::Leaf { path, value } => {
                let path = path.encode_compact(true);
                rlp::encode_list(&[Item::String(&path), Item::String(value)])
            }

            Node::Extension { path, child } => {
                let path = path.encode_compact(false);
                rlp::encode_list(&[Item::String(&path), child.as_item()])
            }

            Node::Branch { children, value } => {
                let mut items = Vec::with_capacity(BRANCH_LIST_LENGTH);
                items.extend(
                    children
                        .iter()
                        .map(|child| child.as_ref().map_or(Item::String(&[]), NodeRef::as_item)),
                );
                items.push(Item::String(value.as_deref().unwrap_or_default()));

                rlp::encode_list(&items)
            }
        }
    }
}
