//! # Node references
//!
//! A parent points at a child by *reference*: the child's encoding itself
//! when it is shorter than [`INLINE_THRESHOLD`], otherwise its digest. This is
//! the only place the hash primitive is applied.

use alloy_primitives::{b256, keccak256, B256};

use crate::node::NodeRef;

/// Encodings shorter than this are embedded in their parent instead of hashed
pub const INLINE_THRESHOLD: usize = 32;

/// Empty trie root hash (keccak256(RLP("")))
pub const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// The digest function used to address nodes
pub trait NodeHasher {
    /// Digest an encoded node
    fn digest(&self, data: &[u8]) -> B256;
}

/// Keccak-256, the digest of the Ethereum trie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak256;

impl NodeHasher for Keccak256 {
    fn digest(&self, data: &[u8]) -> B256 {
        keccak256(data)
    }
}

/// Reference a parent stores for the given encoded node
pub fn node_ref<H: NodeHasher + ?Sized>(hasher: &H, encoded: &[u8]) -> NodeRef {
    if encoded.len() < INLINE_THRESHOLD {
        NodeRef::Inline(encoded.to_vec())
    } else {
        NodeRef::Hash(hasher.digest(encoded))
    }
}
