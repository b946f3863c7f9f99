//! CASK CLI - Generate, validate and inspect CASK keys.

use std::fs;
use std::io::{self, BufRead, Read};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cask::{
    compare_hash, correlating_id, find_keys, generate_hash, generate_key, validate, CaskKey,
    SensitiveDataSize,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "cask")]
#[command(about = "CASK CLI - Generate, validate and inspect Common Annotated Security Keys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate new primary keys
    Generate {
        /// Provider signature (4 base64url characters)
        #[arg(long, env = "CASK_PROVIDER_SIGNATURE")]
        provider_signature: String,
        /// Provider kind (1 base64url character)
        #[arg(long, default_value = "A", env = "CASK_PROVIDER_KIND")]
        provider_kind: char,
        /// Optional provider data (base64url, multiple of 4 characters)
        #[arg(long, env = "CASK_PROVIDER_DATA")]
        provider_data: Option<String>,
        /// Sensitive data size (128, 256, 384 or 512)
        #[arg(long, default_value = "256", env = "CASK_SIZE")]
        size: SensitiveDataSize,
        /// Number of keys to generate
        #[arg(long, default_value = "1")]
        count: usize,
    },
    /// Validate keys (one per line on stdin if none given); exits 1 if any is invalid
    Validate {
        /// Key to validate
        key: Option<String>,
    },
    /// Print the metadata embedded in a key
    Inspect {
        /// Key to inspect (read from stdin if not provided)
        key: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Derive a hash of a primary key
    Hash {
        /// Derivation input
        #[arg(long)]
        input: String,
        /// Primary key (read from stdin if not provided)
        #[arg(long, env = "CASK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Check a hash against a primary key; exits 1 on mismatch
    CompareHash {
        /// Hash to check
        hash: String,
        /// Derivation input
        #[arg(long)]
        input: String,
        /// Primary key (read from stdin if not provided)
        #[arg(long, env = "CASK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Compute the correlating id of a secret
    Correlate {
        /// Secret (read from stdin if not provided)
        secret: Option<String>,
    },
    /// Report keys found in a file (or stdin with '-'); exits 1 if any is found
    Scan {
        /// File to scan
        #[arg(default_value = "-")]
        path: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Debug, Serialize)]
struct KeyInfo {
    kind: String,
    size: String,
    provider_signature: String,
    provider_kind: String,
    provider_data: String,
    timestamp: String,
    correlating_id: String,
}

impl KeyInfo {
    fn from_key(key: &CaskKey) -> Self {
        Self {
            kind: display_or_empty(key.kind()),
            size: display_or_empty(key.size()),
            provider_signature: key.provider_signature().unwrap_or_default().to_string(),
            provider_kind: display_or_empty(key.provider_kind()),
            provider_data: key.provider_data().unwrap_or_default().to_string(),
            timestamp: key
                .timestamp()
                .map(|t| t.format("%Y-%m-%dT%H:%MZ").to_string())
                .unwrap_or_default(),
            correlating_id: key.correlating_id(),
        }
    }
}

fn display_or_empty<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, PartialEq, Eq)]
struct Finding {
    line: usize,
    column: usize,
    correlating_id: String,
}

// ============================================================================
// Input Helpers
// ============================================================================

/// Returns the argument, or the first line of stdin when absent.
fn arg_or_stdin(value: Option<String>, what: &str) -> Result<String> {
    let value = match value {
        Some(v) => v,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .with_context(|| format!("Failed to read {} from stdin", what))?;
            line
        },
    };

    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{} cannot be empty", what);
    }
    Ok(value)
}

fn parse_key(text: &str, what: &str) -> Result<CaskKey> {
    CaskKey::parse(text).with_context(|| format!("Invalid {}", what))
}

/// Scans raw input. Invalid UTF-8 is replaced rather than rejected, so
/// binary noise in a log does not stop the scan.
fn scan_bytes(bytes: &[u8]) -> Vec<Finding> {
    scan_text(&String::from_utf8_lossy(bytes))
}

fn scan_text(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (index, line) in text.lines().enumerate() {
        for key in find_keys(line) {
            // Keys are subslices of the line.
            let offset = key.as_ptr() as usize - line.as_ptr() as usize;
            findings.push(Finding {
                line: index + 1,
                column: line[..offset].chars().count() + 1,
                correlating_id: correlating_id::compute(key),
            });
        }
    }

    findings
}

// ============================================================================
// Command Handlers
// ============================================================================

fn cmd_generate(
    provider_signature: &str,
    provider_kind: char,
    provider_data: Option<&str>,
    size: SensitiveDataSize,
    count: usize,
) -> Result<ExitCode> {
    for _ in 0..count {
        let key = generate_key(provider_signature, provider_kind, provider_data, size)
            .context("Key generation failed")?;
        println!("{}", key);
    }

    tracing::info!(count, size = %size, "Generated keys");
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(key: Option<String>) -> Result<ExitCode> {
    let candidates = match key {
        Some(k) => vec![k],
        None => io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Failed to read keys from stdin")?,
    };

    let mut all_valid = true;
    for candidate in candidates.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        match validate::validate(candidate) {
            Ok(_) => println!("valid"),
            Err(reason) => {
                all_valid = false;
                println!("invalid: {}", reason);
            },
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_inspect(key: Option<String>, format: OutputFormat) -> Result<ExitCode> {
    let key = parse_key(&arg_or_stdin(key, "Key")?, "key")?;
    let info = KeyInfo::from_key(&key);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        },
        OutputFormat::Text => {
            println!("CASK key:");
            println!("  Kind:               {}", info.kind);
            println!("  Size:               {}", info.size);
            println!("  Provider signature: {}", info.provider_signature);
            println!("  Provider kind:      {}", info.provider_kind);
            println!("  Provider data:      {}", info.provider_data);
            println!("  Timestamp:          {}", info.timestamp);
            println!("  Correlating id:     {}", info.correlating_id);
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_hash(input: &str, secret: Option<String>) -> Result<ExitCode> {
    let secret = parse_key(&arg_or_stdin(secret, "Secret")?, "secret")?;
    let hash = generate_hash(input.as_bytes(), &secret).context("Hash derivation failed")?;
    println!("{}", hash);
    Ok(ExitCode::SUCCESS)
}

fn cmd_compare_hash(hash: &str, input: &str, secret: Option<String>) -> Result<ExitCode> {
    let hash = parse_key(hash, "hash")?;
    let secret = parse_key(&arg_or_stdin(secret, "Secret")?, "secret")?;

    if compare_hash(&hash, input.as_bytes(), &secret) {
        println!("match");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("mismatch");
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_correlate(secret: Option<String>) -> Result<ExitCode> {
    let secret = arg_or_stdin(secret, "Secret")?;
    println!("{}", correlating_id::compute(&secret));
    Ok(ExitCode::SUCCESS)
}

fn cmd_scan(path: &str) -> Result<ExitCode> {
    let bytes = if path == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        bytes
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path))?
    };

    let findings = scan_bytes(&bytes);
    for finding in &findings {
        println!(
            "{}:{}:{}: {}",
            path, finding.line, finding.column, finding.correlating_id
        );
    }

    tracing::debug!(path, found = findings.len(), "Scan complete");

    Ok(if findings.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            provider_signature,
            provider_kind,
            provider_data,
            size,
            count,
        } => cmd_generate(
            &provider_signature,
            provider_kind,
            provider_data.as_deref(),
            size,
            count,
        ),
        Commands::Validate { key } => cmd_validate(key),
        Commands::Inspect { key, format } => cmd_inspect(key, format),
        Commands::Hash { input, secret } => cmd_hash(&input, secret),
        Commands::CompareHash {
            hash,
            input,
            secret,
        } => cmd_compare_hash(&hash, &input, secret),
        Commands::Correlate { secret } => cmd_correlate(secret),
        Commands::Scan { path } => cmd_scan(&path),
    }
}
