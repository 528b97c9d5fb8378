//! # Error types for MPT proofs

use thiserror::Error;

/// MPT error types
///
/// A key that is simply absent from the trie is never an error: the proof
/// operations report it as `false` / `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The compact (hex-prefix) encoding of a node path is invalid
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// A node is not a well-formed 2- or 17-item list
    #[error("Malformed node: {0}")]
    MalformedNode(String),

    /// The proof does not chain from the root down to a terminal node
    #[error("Invalid proof at entry {index}: {reason}")]
    InvalidProof {
        index: usize,
        reason: &'static str,
    },
}

impl TrieError {
    pub(crate) fn invalid_proof(index: usize, reason: &'static str) -> Self {
        TrieError::InvalidProof { index, reason }
    }
}

impl From<alloy_rlp::Error> for TrieError {
    fn from(err: alloy_rlp::Error) -> Self {
        TrieError::MalformedNode(format!("RLP decode error: {err}"))
    }
}

/// Result type for trie operations
pub type Result<T> = std::result::Result<T, TrieError>;
