//! # mpt
//!
//! Command-line interface for Merkle Patricia Trie proofs.
//!
//! Usage:
//!   mpt generate --seed <SEED> [--count N] [--index I] [--secure] [--update HEX]
//!   mpt verify <FIXTURE.json>
//!   mpt get <FIXTURE.json>
//!   mpt update <FIXTURE.json> [--value HEX]
//!
//! Examples:
//!   mpt generate --seed demo --count 128 --index 7 > proof.json
//!   mpt verify proof.json
//!   mpt generate --seed demo --update 0x1234 > update.json
//!   mpt -v update update.json

use std::path::{Path, PathBuf};

use alloy_primitives::{Bytes, B256};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mpt_trie::MerkleTrie;
#[cfg(feature = "generate")]
use mpt_trie::{GeneratorOptions, TrieTestGenerator};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mpt")]
#[command(author, version, about = "Check and update Merkle Patricia Trie proofs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a random trie and print a fixture for one of its entries
    #[cfg(feature = "generate")]
    Generate {
        /// Seed string; equal seeds give equal tries
        #[arg(short, long)]
        seed: String,

        /// Number of entries in the trie
        #[arg(short = 'n', long, default_value = "16")]
        count: usize,

        /// Entry to build the fixture for
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// Store entries under the Keccak-256 of their keys
        #[arg(long)]
        secure: bool,

        /// Emit an update fixture writing this hex value
        #[arg(short, long)]
        update: Option<String>,
    },
    /// Check that the fixture's key maps to its value
    Verify {
        /// Path to the fixture JSON file
        file: PathBuf,
    },
    /// Read the fixture's key through its proof
    Get {
        /// Path to the fixture JSON file
        file: PathBuf,
    },
    /// Compute the root after writing a value under the fixture's key
    Update {
        /// Path to the fixture JSON file
        file: PathBuf,

        /// Hex value to write instead of the fixture's own
        #[arg(long)]
        value: Option<String>,
    },
}

/// Proof or update fixture, as printed by `generate`
#[derive(Debug, Deserialize)]
struct Fixture {
    key: Bytes,
    val: Bytes,
    proof: Vec<Bytes>,
    root: B256,
    #[serde(default)]
    new_root: Option<B256>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse hex with or without a `0x` prefix
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).with_context(|| format!("invalid hex value: {input}"))
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse fixture {}", path.display()))?;
    debug!(path = %path.display(), proof_len = fixture.proof.len(), "loaded fixture");
    Ok(fixture)
}

#[cfg(feature = "generate")]
fn generate(
    seed: String,
    count: usize,
    index: usize,
    secure: bool,
    update: Option<&str>,
) -> Result<String> {
    if index >= count {
        bail!("index {index} out of range for a trie of {count} entries");
    }

    let generator =
        TrieTestGenerator::from_random(GeneratorOptions::new(seed, count).secure(secure));
    tracing::info!(root = %generator.root(), count, "generated trie");

    let json = match update {
        Some(value) => {
            let value = parse_hex(value)?;
            serde_json::to_string_pretty(&generator.make_node_update_test(index, &value))?
        }
        None => serde_json::to_string_pretty(&generator.make_inclusion_proof_test(index))?,
    };
    Ok(json)
}

fn verify(fixture: &Fixture) -> Result<String> {
    let included = MerkleTrie::new()
        .verify_inclusion_proof(&fixture.key, &fixture.val, &fixture.proof, fixture.root)
        .context("proof verification failed")?;
    Ok(included.to_string())
}

fn get(fixture: &Fixture) -> Result<String> {
    let value = MerkleTrie::new()
        .get(&fixture.key, &fixture.proof, fixture.root)
        .context("proof lookup failed")?;
    Ok(match value {
        Some(value) => format!("0x{}", hex::encode(value)),
        None => "not found".to_string(),
    })
}

fn update(fixture: &Fixture, value: Option<&str>) -> Result<String> {
    let (value, expected) = match value {
        Some(value) => (parse_hex(value)?, None),
        None => (fixture.val.to_vec(), fixture.new_root),
    };

    let new_root = MerkleTrie::new()
        .update(&fixture.key, &value, &fixture.proof, fixture.root)
        .context("proof update failed")?;

    if let Some(expected) = expected {
        if new_root != expected {
            bail!("computed root {new_root} does not match expected {expected}");
        }
    }
    Ok(new_root.to_string())
}

fn run(cli: Cli) -> Result<String> {
    match cli.command {
        #[cfg(feature = "generate")]
        Commands::Generate {
            seed,
            count,
            index,
            secure,
            update: value,
        } => generate(seed, count, index, secure, value.as_deref()),
        Commands::Verify { file } => verify(&load_fixture(&file)?),
        Commands::Get { file } => get(&load_fixture(&file)?),
        Commands::Update { file, value } => update(&load_fixture(&file)?, value.as_deref()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_fixture(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x1234").unwrap(), vec![0x12, 0x34]);
        assert_eq!(parse_hex("abcd").unwrap(), vec![0xab, 0xcd]);
        assert!(parse_hex("0xzz").is_err());
    }

    #[cfg(feature = "generate")]
    #[test]
    fn test_generate_rejects_bad_index() {
        assert!(generate("seed".into(), 4, 4, false, None).is_err());
    }

    #[cfg(feature = "generate")]
    #[test]
    fn test_proof_fixture_round_trip() {
        let json = generate("seed.cli".into(), 32, 3, false, None).unwrap();
        let file = write_fixture(&json);
        let fixture = load_fixture(file.path()).unwrap();

        assert!(fixture.new_root.is_none());
        assert_eq!(verify(&fixture).unwrap(), "true");
        assert_eq!(get(&fixture).unwrap(), format!("0x{}", hex::encode(&fixture.val)));
    }

    #[cfg(feature = "generate")]
    #[test]
    fn test_update_fixture_checks_new_root() {
        let json = generate("seed.cli".into(), 32, 3, false, Some("0x12341234")).unwrap();
        let file = write_fixture(&json);
        let fixture = load_fixture(file.path()).unwrap();

        let expected = fixture.new_root.unwrap();
        assert_eq!(update(&fixture, None).unwrap(), expected.to_string());

        let mut wrong = fixture;
        wrong.new_root = Some(B256::ZERO);
        assert!(update(&wrong, None).is_err());
    }

    #[test]
    fn test_unparsable_fixture() {
        let file = write_fixture(r#"{"key": "0x01"}"#);
        let err = load_fixture(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse fixture"));
    }

    #[test]
    fn test_missing_fixture() {
        let err = load_fixture(Path::new("/nonexistent/fixture.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read fixture"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["mpt", "-v", "update", "fixture.json", "--value", "0x01"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Update { value: Some(_), .. }));
    }
}
