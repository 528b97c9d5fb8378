//! Proof operations against seeded random tries

use alloy_primitives::{keccak256, Bytes, B256};
use mpt_trie::{
    get, update, verify_inclusion_proof, GeneratorOptions, PatriciaTrie, ProofTest, TrieError,
    TrieTestGenerator, UpdateTest, EMPTY_ROOT,
};

const NODE_COUNTS: [usize; 3] = [1, 2, 128];

const UPDATE_VALUE: [u8; 8] = [0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0x34];

fn generator(seed: &str, node_count: usize) -> TrieTestGenerator {
    TrieTestGenerator::from_random(GeneratorOptions::new(seed, node_count))
}

/// Sampled entry indices for a trie of `node_count` entries
fn indices(node_count: usize) -> impl Iterator<Item = usize> {
    let step = if node_count > 8 { node_count / 8 } else { 1 };
    (0..node_count).step_by(step)
}

/// A key no generated trie contains: random keys are at most 32 bytes
fn absent_key(tag: u8) -> Vec<u8> {
    vec![tag; 33]
}

#[test]
fn test_verify_inclusion_proof() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.incluson.{node_count}"), node_count);

        for i in indices(node_count) {
            let ProofTest { key, val, proof, root } = generator.make_inclusion_proof_test(i);
            assert_eq!(
                verify_inclusion_proof(&key, &val, &proof, root),
                Ok(true),
                "trie of {node_count}, entry {i}"
            );
        }
    }
}

#[test]
fn test_verify_rejects_tampered_value() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.incluson.{node_count}"), node_count);

        for i in indices(node_count) {
            let test = generator.make_inclusion_proof_test(i);
            let mut val = test.val.to_vec();
            val[0] ^= 0xff;
            assert_eq!(verify_inclusion_proof(&test.key, &val, &test.proof, test.root), Ok(false));

            val.push(0);
            assert_eq!(verify_inclusion_proof(&test.key, &val, &test.proof, test.root), Ok(false));
        }
    }
}

#[test]
fn test_verify_rejects_tampered_proof() {
    let generator = generator("seed.incluson.128", 128);

    for i in indices(128) {
        let test = generator.make_inclusion_proof_test(i);

        for entry in 0..test.proof.len() {
            let mut proof: Vec<Vec<u8>> = test.proof.iter().map(|p| p.to_vec()).collect();
            let last = proof[entry].len() - 1;
            proof[entry][last] ^= 0x01;

            let result = verify_inclusion_proof(&test.key, &test.val, &proof, test.root);
            assert_ne!(result, Ok(true), "entry {i}, tampered node {entry}");
        }
    }
}

#[test]
fn test_verify_rejects_wrong_root() {
    let generator = generator("seed.incluson.2", 2);
    let test = generator.make_inclusion_proof_test(0);

    assert!(matches!(
        verify_inclusion_proof(&test.key, &test.val, &test.proof, B256::repeat_byte(0xab)),
        Err(TrieError::InvalidProof { index: 0, .. })
    ));
}

#[test]
fn test_get() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.get.{node_count}"), node_count);

        for i in indices(node_count) {
            let test = generator.make_inclusion_proof_test(i);
            assert_eq!(get(&test.key, &test.proof, test.root), Ok(Some(test.val.to_vec())));
        }
    }
}

#[test]
fn test_get_absent_keys() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.get.{node_count}"), node_count);
        let root = generator.root();

        for tag in [0x00, 0x7f, 0xff] {
            let key = absent_key(tag);
            let proof = generator.trie().prove(&key);
            assert_eq!(get(&key, &proof, root), Ok(None));
            assert_eq!(verify_inclusion_proof(&key, b"", &proof, root), Ok(false));
        }
    }
}

#[test]
fn test_get_agrees_with_verify() {
    let generator = generator("seed.get.128", 128);

    for i in indices(128) {
        let test = generator.make_inclusion_proof_test(i);
        let value = get(&test.key, &test.proof, test.root).unwrap().unwrap();
        assert_eq!(verify_inclusion_proof(&test.key, &value, &test.proof, test.root), Ok(true));
    }
}

#[test]
fn test_update() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.update.{node_count}"), node_count);

        for i in indices(node_count) {
            let UpdateTest { key, val, proof, root, new_root } =
                generator.make_node_update_test(i, &UPDATE_VALUE);
            assert_eq!(
                update(&key, &val, &proof, root),
                Ok(new_root),
                "trie of {node_count}, entry {i}"
            );
        }
    }
}

#[test]
fn test_update_keeps_other_entries() {
    let generator = generator("seed.update.128", 128);
    let test = generator.make_node_update_test(5, &UPDATE_VALUE);
    let new_root = update(&test.key, &test.val, &test.proof, test.root).unwrap();

    let mut after = PatriciaTrie::new_memory();
    for (key, value) in generator.entries() {
        after.insert(key, value.clone());
    }
    after.insert(&test.key, test.val.to_vec());
    assert_eq!(after.root_hash(), new_root);

    let proof = after.prove(&test.key);
    assert_eq!(get(&test.key, &proof, new_root), Ok(Some(UPDATE_VALUE.to_vec())));

    for (key, value) in generator.entries().iter().step_by(9) {
        if key.as_slice() == &test.key[..] {
            continue;
        }
        let proof = after.prove(key);
        assert_eq!(verify_inclusion_proof(key, value, &proof, new_root), Ok(true));
    }
}

#[test]
fn test_update_inserts_absent_keys() {
    for node_count in NODE_COUNTS {
        let generator = generator(&format!("seed.update.{node_count}"), node_count);

        for tag in [0x00, 0x42, 0xff] {
            let key = absent_key(tag);
            let test = generator.make_update_test(&key, b"inserted");
            assert_eq!(update(&test.key, &test.val, &test.proof, test.root), Ok(test.new_root));
        }

        // a strict prefix of an existing key
        let (existing, _) = &generator.entries()[0];
        if existing.len() > 1 {
            let test = generator.make_update_test(&existing[..1], b"prefix");
            assert_eq!(update(&test.key, &test.val, &test.proof, test.root), Ok(test.new_root));
        }
    }
}

#[test]
fn test_update_chains() {
    let generator = generator("seed.update.128", 128);
    let mut trie = PatriciaTrie::new_memory();
    for (key, value) in generator.entries() {
        trie.insert(key, value.clone());
    }

    let mut root = trie.root_hash();
    for (n, (key, _)) in generator.entries().iter().enumerate().step_by(16) {
        let value = vec![n as u8; 40];
        let proof = trie.prove(key);
        root = update(key, &value, &proof, root).unwrap();
        trie.insert(key, value);
        assert_eq!(root, trie.root_hash());
    }
}

#[test]
fn test_update_empty_trie() {
    let proof: Vec<Bytes> = Vec::new();
    let new_root = update(b"key", b"value", &proof, EMPTY_ROOT).unwrap();

    let mut trie = PatriciaTrie::new_memory();
    trie.insert(b"key", b"value".to_vec());
    assert_eq!(new_root, trie.root_hash());
}

#[test]
fn test_insertion_order_independence() {
    let generator = generator("seed.order.64", 64);
    let mut reversed = generator.entries().to_vec();
    reversed.reverse();

    let rebuilt = TrieTestGenerator::from_entries(reversed);
    assert_eq!(rebuilt.root(), generator.root());
}

#[test]
fn test_secure_fixtures() {
    let generator =
        TrieTestGenerator::from_random(GeneratorOptions::new("seed.secure.32", 32).secure(true));

    for i in indices(32) {
        let test = generator.make_inclusion_proof_test(i);
        assert_eq!(test.key.len(), 32);
        assert_eq!(verify_inclusion_proof(&test.key, &test.val, &test.proof, test.root), Ok(true));

        let test = generator.make_node_update_test(i, &UPDATE_VALUE);
        assert_eq!(update(&test.key, &test.val, &test.proof, test.root), Ok(test.new_root));
    }
}

#[test]
fn test_fixture_serde() {
    let generator = generator("seed.json.16", 16);
    let test = generator.make_inclusion_proof_test(3);

    let json = serde_json::to_value(&test).unwrap();
    assert!(json["root"].as_str().is_some_and(|r| r.starts_with("0x") && r.len() == 66));
    assert!(json["proof"].as_array().is_some_and(|p| p.len() == test.proof.len()));

    let parsed: ProofTest = serde_json::from_value(json).unwrap();
    assert_eq!(verify_inclusion_proof(&parsed.key, &parsed.val, &parsed.proof, parsed.root), Ok(true));
}

#[test]
fn test_malformed_node_is_an_error() {
    // a list of three items is neither a branch nor a leaf/extension
    let node = vec![0xc3, 0x01, 0x02, 0x03];
    let root = keccak256(&node);
    let proof = [node];

    assert!(matches!(get(b"key", &proof, root), Err(TrieError::MalformedNode(_))));
    assert!(matches!(
        verify_inclusion_proof(b"key", b"value", &proof, root),
        Err(TrieError::MalformedNode(_))
    ));
    assert!(matches!(update(b"key", b"value", &proof, root), Err(TrieError::MalformedNode(_))));
}

#[test]
fn test_malformed_path_is_an_error() {
    // path byte 0x41 carries the unknown prefix nibble 4
    let node = vec![0xc2, 0x41, 0x01];
    let root = keccak256(&node);
    let proof = [node];

    assert!(matches!(get(b"key", &proof, root), Err(TrieError::MalformedPath(_))));
    assert!(matches!(update(b"key", b"value", &proof, root), Err(TrieError::MalformedPath(_))));
}
