//! # Trie fixtures
//!
//! Builds seeded random tries and derives proof fixtures from them. Each
//! fixture carries everything a proof operation needs, plus the expected
//! answer computed independently through [`PatriciaTrie`].

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Bytes, B256};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::trie::PatriciaTrie;

/// Longest random key, in bytes
const MAX_KEY_LEN: usize = 32;

/// Longest random value, in bytes
const MAX_VALUE_LEN: usize = 64;

/// How to build a random trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Any string; equal seeds give equal tries
    pub seed: String,
    /// Number of distinct keys
    pub node_count: usize,
    /// Store entries under `keccak256(key)` instead of the key itself
    pub secure: bool,
}

impl GeneratorOptions {
    pub fn new(seed: impl Into<String>, node_count: usize) -> Self {
        GeneratorOptions {
            seed: seed.into(),
            node_count,
            secure: false,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// Inputs and expected result of an inclusion check or lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofTest {
    /// Key as stored in the trie (already hashed for secure tries)
    pub key: Bytes,
    pub val: Bytes,
    pub proof: Vec<Bytes>,
    pub root: B256,
}

/// Inputs and expected result of a root update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTest {
    pub key: Bytes,
    pub val: Bytes,
    pub proof: Vec<Bytes>,
    pub root: B256,
    pub new_root: B256,
}

/// A random trie plus the entries it was built from
#[derive(Debug)]
pub struct TrieTestGenerator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    trie: PatriciaTrie,
}

impl TrieTestGenerator {
    /// Build a trie of `node_count` random entries seeded by `seed`
    pub fn from_random(options: GeneratorOptions) -> Self {
        let mut rng = StdRng::from_seed(keccak256(options.seed.as_bytes()).0);

        let mut entries = BTreeMap::new();
        while entries.len() < options.node_count {
            let key = random_bytes(&mut rng, MAX_KEY_LEN);
            let value = random_bytes(&mut rng, MAX_VALUE_LEN);
            let key = if options.secure {
                keccak256(&key).to_vec()
            } else {
                key
            };
            entries.entry(key).or_insert(value);
        }

        Self::from_entries(entries.into_iter().collect())
    }

    /// Build a trie from explicit entries. Later duplicates win.
    pub fn from_entries(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        let trie = build(&entries);
        TrieTestGenerator { entries, trie }
    }

    pub fn entries(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.entries
    }

    pub fn trie(&self) -> &PatriciaTrie {
        &self.trie
    }

    pub fn root(&self) -> B256 {
        self.trie.root_hash()
    }

    /// Fixture proving that entry `index` is in the trie
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn make_inclusion_proof_test(&self, index: usize) -> ProofTest {
        let (key, val) = &self.entries[index];
        ProofTest {
            key: Bytes::copy_from_slice(key),
            val: Bytes::copy_from_slice(val),
            proof: self.proof(key),
            root: self.root(),
        }
    }

    /// Fixture setting entry `index` to `val`, with the root of a trie
    /// rebuilt from scratch over the modified entries
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn make_node_update_test(&self, index: usize, val: &[u8]) -> UpdateTest {
        let key = &self.entries[index].0;
        self.make_update_test(key, val)
    }

    /// Fixture writing `val` under any key, present or not
    pub fn make_update_test(&self, key: &[u8], val: &[u8]) -> UpdateTest {
        let mut modified = self.entries.clone();
        modified.push((key.to_vec(), val.to_vec()));

        UpdateTest {
            key: Bytes::copy_from_slice(key),
            val: Bytes::copy_from_slice(val),
            proof: self.proof(key),
            root: self.root(),
            new_root: build(&modified).root_hash(),
        }
    }

    fn proof(&self, key: &[u8]) -> Vec<Bytes> {
        self.trie.prove(key).into_iter().map(Bytes::from).collect()
    }
}

fn build(entries: &[(Vec<u8>, Vec<u8>)]) -> PatriciaTrie {
    let mut trie = PatriciaTrie::new_memory();
    for (key, value) in entries {
        trie.insert(key, value.clone());
    }
    trie
}

fn random_bytes(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
    let len = rng.gen_range(1..=max_len);
    let mut bytes = vec![0u8; len];
    rng.fill(bytes.as_mut_slice());
    bytes
}
