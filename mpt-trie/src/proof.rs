//! # Merkle Proofs
//!
//! Verify that a key/value pair belongs to a trie, or read a key's value,
//! using nothing but the root hash and the nodes on the path to the key.

use alloy_primitives::B256;
use tracing::debug;

use crate::error::{Result, TrieError};
use crate::hasher::{Keccak256, NodeHasher, EMPTY_ROOT};
use crate::nibbles::Nibbles;
use crate::walker::{self, Walk};

/// Proof operations over a trie addressed by `H`.
///
/// The type holds no trie state; each call is a pure function of its
/// arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleTrie<H = Keccak256> {
    hasher: H,
}

impl MerkleTrie<Keccak256> {
    /// Proof operations for the Keccak-256 trie
    pub fn new() -> Self {
        MerkleTrie { hasher: Keccak256 }
    }
}

impl<H: NodeHasher> MerkleTrie<H> {
    /// Proof operations for a trie addressed by a custom digest
    pub fn with_hasher(hasher: H) -> Self {
        MerkleTrie { hasher }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Check that `key` maps to exactly `value` in the trie committed to by
    /// `root`.
    ///
    /// Returns `Ok(false)` when the proof shows the key is absent or holds a
    /// different value. Structural problems with the proof are errors.
    pub fn verify_inclusion_proof<T: AsRef<[u8]>>(
        &self,
        key: &[u8],
        value: &[u8],
        proof: &[T],
        root: B256,
    ) -> Result<bool> {
        let found = self.get(key, proof, root)?;
        Ok(found.as_deref() == Some(value))
    }

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the proof shows the key is absent.
    pub fn get<T: AsRef<[u8]>>(&self, key: &[u8], proof: &[T], root: B256) -> Result<Option<Vec<u8>>> {
        let nibbles = Nibbles::from_bytes(key);
        let Some(walk) = self.walk(nibbles.as_slice(), proof, root)? else {
            return Ok(None);
        };
        let value = walk.value().map(<[u8]>::to_vec);
        debug!(found = value.is_some(), proof_len = proof.len(), "proof lookup");
        Ok(value)
    }

    /// Walk the proof for the nibble path `path`. `None` stands for the
    /// empty trie.
    pub(crate) fn walk<T: AsRef<[u8]>>(&self, path: &[u8], proof: &[T], root: B256) -> Result<Option<Walk>> {
        if proof.is_empty() {
            if root == EMPTY_ROOT {
                return Ok(None);
            }
            return Err(TrieError::invalid_proof(0, "empty proof for a non-empty trie"));
        }

        walker::walk(&self.hasher, path, proof, root).map(Some)
    }
}

/// Check a Keccak-256 inclusion proof. See [`MerkleTrie::verify_inclusion_proof`].
pub fn verify_inclusion_proof<T: AsRef<[u8]>>(
    key: &[u8],
    value: &[u8],
    proof: &[T],
    root: B256,
) -> Result<bool> {
    MerkleTrie::new().verify_inclusion_proof(key, value, proof, root)
}

/// Read a value through a Keccak-256 proof. See [`MerkleTrie::get`].
pub fn get<T: AsRef<[u8]>>(key: &[u8], proof: &[T], root: B256) -> Result<Option<Vec<u8>>> {
    MerkleTrie::new().get(key, proof, root)
}
