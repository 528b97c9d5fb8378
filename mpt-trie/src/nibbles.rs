//! # Nibbles
//!
//! Keys in the MPT are walked as nibbles (half-bytes / 4 bits), so every
//! branch node fans out to 16 children. Leaf and extension paths are stored
//! in compact (hex-prefix) form, where the first nibble carries the node kind
//! and the parity of the path length.

use std::fmt;

use crate::error::{Result, TrieError};

/// Prefix nibble of an even-length extension path.
const PREFIX_EXTENSION_EVEN: u8 = 0;

/// Prefix nibble of an odd-length extension path.
const PREFIX_EXTENSION_ODD: u8 = 1;

/// Prefix nibble of an even-length leaf path.
const PREFIX_LEAF_EVEN: u8 = 2;

/// Prefix nibble of an odd-length leaf path.
const PREFIX_LEAF_ODD: u8 = 3;

/// A sequence of nibbles (4-bit values)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nibbles {
    data: Vec<u8>,
}

impl Nibbles {
    /// Create empty nibbles
    pub fn new() -> Self {
        Nibbles { data: Vec::new() }
    }

    /// Create from bytes (each byte becomes 2 nibbles, high nibble first)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut data = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            data.push(byte >> 4);
            data.push(byte & 0x0f);
        }
        Nibbles { data }
    }

    /// Create from raw nibbles
    pub fn from_raw(nibbles: Vec<u8>) -> Self {
        debug_assert!(nibbles.iter().all(|n| *n < 16));
        Nibbles { data: nibbles }
    }

    /// Decode a compact (hex-prefix) encoded path.
    ///
    /// Returns the path and whether it belongs to a leaf.
    pub fn decode_compact(encoded: &[u8]) -> Result<(Self, bool)> {
        let Some(&first) = encoded.first() else {
            return Err(TrieError::MalformedPath("empty compact path".to_string()));
        };

        let (is_leaf, odd) = match first >> 4 {
            PREFIX_EXTENSION_EVEN => (false, false),
            PREFIX_EXTENSION_ODD => (false, true),
            PREFIX_LEAF_EVEN => (true, false),
            PREFIX_LEAF_ODD => (true, true),
            prefix => {
                return Err(TrieError::MalformedPath(format!(
                    "unknown prefix nibble {prefix:#x}"
                )))
            }
        };

        if !odd && first & 0x0f != 0 {
            return Err(TrieError::MalformedPath(format!(
                "non-zero padding in even path prefix {first:#04x}"
            )));
        }

        let mut data = Vec::with_capacity(encoded.len() * 2);
        if odd {
            data.push(first & 0x0f);
        }
        for byte in &encoded[1..] {
            data.push(byte >> 4);
            data.push(byte & 0x0f);
        }

        Ok((Nibbles { data }, is_leaf))
    }

    /// Encode to compact (hex-prefix) form
    pub fn encode_compact(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.data.len() % 2 == 1;
        let prefix = match (is_leaf, odd) {
            (false, false) => PREFIX_EXTENSION_EVEN,
            (false, true) => PREFIX_EXTENSION_ODD,
            (true, false) => PREFIX_LEAF_EVEN,
            (true, true) => PREFIX_LEAF_ODD,
        };

        let mut encoded = Vec::with_capacity(self.data.len() / 2 + 1);
        let rest = if odd {
            encoded.push(prefix << 4 | self.data[0]);
            &self.data[1..]
        } else {
            encoded.push(prefix << 4);
            &self.data[..]
        };
        encoded.extend(rest.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));

        encoded
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append another nibble sequence
    pub fn extend(&mut self, other: &Nibbles) {
        self.data.extend_from_slice(&other.data);
    }

    /// Get as slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Length of the shared prefix of two nibble slices
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl Default for Nibbles {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for Nibbles {
    /// Wraps a slice that already holds one nibble per byte.
    fn from(nibbles: &[u8]) -> Self {
        Nibbles::from_raw(nibbles.to_vec())
    }
}

impl fmt::Debug for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nibbles({self})")
    }
}

impl fmt::Display for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in &self.data {
            write!(f, "{:x}", n)?;
        }
        Ok(())
    }
}
