//! # Merkle Patricia Trie proofs
//!
//! Stateless operations over Ethereum's Modified Merkle Patricia Trie,
//! driven entirely by a root hash and the proof for one key.
//!
//! - Check that a key maps to a value
//! - Read the value under a key, or learn that it is absent
//! - Compute the root after writing a key, without the rest of the trie
//!
//! Keys are used as given. Callers working with secure tries hash their keys
//! before calling in.
//!
//! The `test-utils` feature adds an in-memory trie and a seeded fixture
//! generator for producing roots and proofs to test against.

pub mod error;
pub mod hasher;
pub mod nibbles;
pub mod node;
pub mod proof;
pub mod update;

mod rlp;
mod walker;

#[cfg(any(test, feature = "test-utils"))]
pub mod generator;
#[cfg(any(test, feature = "test-utils"))]
pub mod trie;

pub use error::{Result, TrieError};
pub use hasher::{node_ref, Keccak256, NodeHasher, EMPTY_ROOT, INLINE_THRESHOLD};
pub use nibbles::Nibbles;
pub use node::{Node, NodeRef};
pub use proof::{get, verify_inclusion_proof, MerkleTrie};
pub use update::update;

#[cfg(any(test, feature = "test-utils"))]
pub use generator::{GeneratorOptions, ProofTest, TrieTestGenerator, UpdateTest};
#[cfg(any(test, feature = "test-utils"))]
pub use trie::{MemoryDB, PatriciaTrie};
