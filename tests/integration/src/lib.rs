//! Integration tests for the CASK codec and CLI.
//!
//! Property tests exercise the public library API end to end. CLI tests run
//! the `cask` binary and are skipped when it has not been built.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

// ============================================================================
// CLI Harness
// ============================================================================

/// Runs the `cask` binary.
pub struct CaskCli {
    binary: PathBuf,
}

impl CaskCli {
    /// Locates the binary, or returns `None` if it has not been built.
    pub fn find() -> Option<Self> {
        find_cli_binary().map(|binary| Self { binary })
    }

    /// Runs the CLI with `args`, feeding `stdin` to it.
    pub fn run(&self, args: &[&str], stdin: &str) -> Result<Output> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .env_remove("CASK_PROVIDER_SIGNATURE")
            .env_remove("CASK_PROVIDER_KIND")
            .env_remove("CASK_PROVIDER_DATA")
            .env_remove("CASK_SIZE")
            .env_remove("CASK_SECRET")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start CLI: {:?}", self.binary))?;

        child
            .stdin
            .take()
            .context("CLI stdin not captured")?
            .write_all(stdin.as_bytes())
            .context("Failed to write CLI stdin")?;

        child.wait_with_output().context("Failed to wait for CLI")
    }
}

/// Find the CLI binary in the target directory.
fn find_cli_binary() -> Option<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());

    // Try debug build first, then release
    let candidates = [
        Path::new(&manifest_dir).join("../../target/debug/cask"),
        Path::new(&manifest_dir).join("../../target/debug/cask.exe"),
        Path::new(&manifest_dir).join("../../target/release/cask"),
        Path::new(&manifest_dir).join("../../target/release/cask.exe"),
    ];

    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .and_then(|candidate| candidate.canonicalize().ok())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cask::base64url::{self, ALPHABET};
    use cask::correlating_id;
    use cask::layout::{MAX_KEY_BYTES, MAX_KEY_CHARS};
    use cask::{
        compare_hash, find_keys, generate_hash, generate_key, generate_key_into, is_cask,
        is_cask_bytes, is_cask_utf8, CaskKey, KeyKind, SensitiveDataSize,
    };
    use proptest::prelude::*;

    const KEY: &str = "__________________________________________8AQJJQBAONHCBMABCDTESTQ2Bn";
    const HASH: &str = "1wrJw_6mWmTYPkXkBnhndcSVUqMM455oq3aq1e820qgAQJJQBAONHCJMABCDTESTA4am";

    fn size_strategy() -> impl Strategy<Value = SensitiveDataSize> {
        prop::sample::select(SensitiveDataSize::ALL.to_vec())
    }

    fn kind_strategy() -> impl Strategy<Value = char> {
        prop::sample::select(ALPHABET.to_vec()).prop_map(char::from)
    }

    fn all_forms(candidate: &str) -> [bool; 3] {
        let bytes_form = base64url::decode(candidate)
            .map(|b| is_cask_bytes(&b))
            .unwrap_or(false);
        [is_cask(candidate), is_cask_utf8(candidate.as_bytes()), bytes_form]
    }

    proptest! {
        #[test]
        fn prop_generated_keys_validate_and_round_trip(
            signature in "[A-Za-z0-9_-]{4}",
            kind in kind_strategy(),
            data in "([A-Za-z0-9_-]{4}){0,4}",
            size in size_strategy(),
        ) {
            let key = generate_key(&signature, kind, Some(&data), size).unwrap();

            prop_assert!(base64url::is_base64url(key.as_str()));
            prop_assert_eq!(all_forms(key.as_str()), [true; 3]);

            prop_assert_eq!(key.kind(), Some(KeyKind::PrimaryKey));
            prop_assert_eq!(key.size(), Some(size));
            prop_assert_eq!(key.provider_signature(), Some(signature.as_str()));
            prop_assert_eq!(key.provider_kind(), Some(kind));
            prop_assert_eq!(key.provider_data(), Some(data.as_str()));

            let mut bytes = [0u8; MAX_KEY_BYTES];
            let len = key.decode_into(&mut bytes).unwrap();
            let from_bytes = CaskKey::from_bytes(&bytes[..len]).unwrap();
            prop_assert_eq!(from_bytes.as_str(), key.as_str());
            let parsed = key.as_str().parse::<CaskKey>().unwrap();
            prop_assert_eq!(parsed.as_str(), key.as_str());
        }

        #[test]
        fn prop_single_character_change_is_rejected(
            size in size_strategy(),
            data in "([A-Za-z0-9_-]{4}){0,4}",
            position in any::<prop::sample::Index>(),
            replacement in prop::sample::select(ALPHABET.to_vec()),
        ) {
            let key = generate_key("TEST", 'A', Some(&data), size).unwrap();
            let mut chars = key.as_str().as_bytes().to_vec();
            let position = position.index(chars.len());
            prop_assume!(chars[position] != replacement);

            chars[position] = replacement;
            let candidate = String::from_utf8(chars).unwrap();
            prop_assert_eq!(all_forms(&candidate), [false; 3]);
        }

        #[test]
        fn prop_forms_agree_on_arbitrary_input(candidate in "[A-Za-z0-9_=+/ -]{0,130}") {
            let [text, utf8, bytes] = all_forms(&candidate);
            prop_assert_eq!(text, utf8);
            prop_assert_eq!(text, bytes);
        }

        #[test]
        fn prop_hash_is_deterministic(
            input in prop::collection::vec(any::<u8>(), 0..64),
            size in size_strategy(),
        ) {
            let secret = generate_key("TEST", 'h', None, size).unwrap();
            let hash = generate_hash(&input, &secret).unwrap();

            prop_assert!(is_cask(hash.as_str()));
            prop_assert_eq!(hash.kind(), Some(KeyKind::Hash));
            prop_assert_eq!(hash.size(), Some(SensitiveDataSize::Bits256));
            let rehash = generate_hash(&input, &secret).unwrap();
            prop_assert_eq!(rehash.as_str(), hash.as_str());
            prop_assert!(compare_hash(&hash, &input, &secret));

            let mut other_input = input.clone();
            other_input.push(0);
            prop_assert!(!compare_hash(&hash, &other_input, &secret));
        }

        #[test]
        fn prop_scan_finds_embedded_keys(
            prefix in "[ .,:;=\"'\n]{0,8}",
            suffix in "[ .,:;=\"'\n]{0,8}",
            size in size_strategy(),
        ) {
            let key = generate_key("SCAN", 's', None, size).unwrap();
            let text = format!("{prefix}{key}{suffix}");
            prop_assert_eq!(find_keys(&text).collect::<Vec<_>>(), vec![key.as_str()]);
        }
    }

    #[test]
    fn test_generation_is_not_deterministic() {
        let keys: std::collections::HashSet<_> = (0..32)
            .map(|_| {
                generate_key("TEST", 'A', None, SensitiveDataSize::Bits128)
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(keys.len(), 32);
    }

    #[test]
    fn test_generate_into_buffer_parses() {
        let mut buffer = [0u8; MAX_KEY_CHARS];
        let len = generate_key_into(
            "TEST",
            'A',
            Some("ABCDEFGHIJKLMNOP"),
            SensitiveDataSize::Bits512,
            &mut buffer,
        )
        .unwrap();
        assert_eq!(len, MAX_KEY_CHARS);

        let key = CaskKey::parse(std::str::from_utf8(&buffer[..len]).unwrap()).unwrap();
        assert_eq!(key.provider_data(), Some("ABCDEFGHIJKLMNOP"));
        assert_eq!(key.size(), Some(SensitiveDataSize::Bits512));
    }

    #[test]
    fn test_known_vectors() {
        let key = CaskKey::parse(KEY).unwrap();
        assert_eq!(generate_hash(b"test", &key).unwrap().as_str(), HASH);
        assert_eq!(correlating_id::compute("test"), "C3IDsWlHNoIX1f1PeHXLkxXc");
        assert_eq!(correlating_id::compute(""), "C3IDL8F1ZHsZsd5e_chruaXq");
    }

    #[test]
    fn test_cross_thread_generation() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..16)
                        .map(|_| generate_key("TEST", 'A', None, SensitiveDataSize::Bits256))
                        .collect::<Result<Vec<_>, _>>()
                })
            })
            .collect();

        for handle in handles {
            for key in handle.join().unwrap().unwrap() {
                assert!(is_cask(key.as_str()));
            }
        }
    }

    // ------------------------------------------------------------------------
    // CLI
    // ------------------------------------------------------------------------

    fn cli() -> Option<CaskCli> {
        let cli = CaskCli::find();
        if cli.is_none() {
            eprintln!("cask binary not built, skipping CLI test");
        }
        cli
    }

    fn stdout(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    #[test]
    fn test_cli_generate_then_validate() {
        let Some(cli) = cli() else { return };

        let output = cli
            .run(
                &["generate", "--provider-signature", "TEST", "--count", "3"],
                "",
            )
            .unwrap();
        assert!(output.status.success());

        let keys = stdout(&output);
        assert_eq!(keys.lines().count(), 3);
        for key in keys.lines() {
            assert!(is_cask(key));
        }

        let output = cli.run(&["validate"], &keys).unwrap();
        assert!(output.status.success());
        assert_eq!(stdout(&output).lines().filter(|l| *l == "valid").count(), 3);
    }

    #[test]
    fn test_cli_validate_rejects() {
        let Some(cli) = cli() else { return };

        let output = cli.run(&["validate", &KEY[1..]], "").unwrap();
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).starts_with("invalid"));
    }

    #[test]
    fn test_cli_hash_and_compare() {
        let Some(cli) = cli() else { return };

        let output = cli.run(&["hash", "--input", "test"], KEY).unwrap();
        assert!(output.status.success());
        assert_eq!(stdout(&output).trim(), HASH);

        let output = cli
            .run(&["compare-hash", HASH, "--input", "test", "--secret", KEY], "")
            .unwrap();
        assert!(output.status.success());

        let output = cli
            .run(&["compare-hash", HASH, "--input", "other", "--secret", KEY], "")
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_cli_inspect_json() {
        let Some(cli) = cli() else { return };

        let output = cli.run(&["inspect", KEY, "--format", "json"], "").unwrap();
        assert!(output.status.success());
        let json = stdout(&output);
        assert!(json.contains("\"provider_signature\": \"TEST\""));
        assert!(json.contains("\"timestamp\": \"2025-01-15T13:07Z\""));
    }

    #[test]
    fn test_cli_scan_file() {
        let Some(cli) = cli() else { return };

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.env");
        std::fs::write(&path, format!("# settings\nTOKEN={KEY}\n")).unwrap();
        let path = path.to_string_lossy().into_owned();

        let output = cli.run(&["scan", &path], "").unwrap();
        assert_eq!(output.status.code(), Some(1));
        let report = stdout(&output);
        assert!(report.contains(":2:7:"));
        assert!(report.contains(&correlating_id::compute(KEY)));
        assert!(!report.contains(KEY));

        let output = cli.run(&["scan", "-"], "no keys here\n").unwrap();
        assert!(output.status.success());
    }

    #[test]
    fn test_cli_correlate() {
        let Some(cli) = cli() else { return };

        let output = cli.run(&["correlate", "test"], "").unwrap();
        assert!(output.status.success());
        assert_eq!(stdout(&output).trim(), "C3IDsWlHNoIX1f1PeHXLkxXc");
    }
}
