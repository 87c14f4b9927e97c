use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eas_offchain_codec::{
    build_share_url_with_base, compact, decode_from_text, decompact, encode_to_text,
    parse_share_url, CompactAttestation, ShareablePackage,
};
use eas_offchain_types::AttestationPackage;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// Convert EAS off-chain attestation packages to and from compact tuples, shareable text and
/// share URLs.
///
/// Package input is the `{ sig, signer }` JSON produced by the signing side; both the nested and
/// the flat (`r`/`s`/`v` at top level) signature shapes are accepted.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (eg, `debug`, `eas_offchain_codec=trace`).
    #[arg(long, env = "EAS_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a package into shareable text.
    Encode {
        /// Package JSON file; stdin when omitted.
        input: Option<PathBuf>,
    },
    /// Decode shareable text or a share URL into package JSON.
    Decode {
        /// Shareable text or share URL; stdin when omitted.
        text: Option<String>,
    },
    /// Build a share URL for a package.
    Url {
        /// Package JSON file; stdin when omitted.
        input: Option<PathBuf>,

        /// Origin prepended to the share path (eg, https://sepolia.easscan.org).
        #[arg(long, env = "EAS_SHARE_BASE_URL", default_value = "")]
        base_url: String,
    },
    /// Print the 18-slot compact tuple for a package.
    Compact {
        /// Package JSON file; stdin when omitted.
        input: Option<PathBuf>,
    },
    /// Expand a compact tuple JSON array into package JSON.
    Decompact {
        /// Compact tuple JSON file; stdin when omitted.
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Encode { input } => {
            let package = read_package(input.as_deref())?;
            println!("{}", encode_to_text(&package).context("failed encoding package")?);
        }
        Command::Decode { text } => {
            let text = match text {
                Some(text) => text,
                None => read_input(None)?,
            };
            let text = text.trim();
            let package = if looks_like_share_url(text) {
                parse_share_url(text).context("failed decoding share url")?
            } else {
                decode_from_text(text).context("failed decoding shareable text")?
            };
            print_json(&package)?;
        }
        Command::Url { input, base_url } => {
            let package = read_package(input.as_deref())?;
            let url = build_share_url_with_base(&base_url, &package)
                .context("failed building share url")?;
            println!("{url}");
        }
        Command::Compact { input } => {
            let package = read_package(input.as_deref())?;
            print_json(&compact(&package))?;
        }
        Command::Decompact { input } => {
            let raw = read_input(input.as_deref())?;
            let slots: Vec<Value> =
                serde_json::from_str(&raw).context("compact tuple must be a JSON array")?;
            let tuple = CompactAttestation::from_slots(&slots).context("malformed compact tuple")?;
            print_json(&decompact(&tuple).context("failed expanding compact tuple")?)?;
        }
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed reading stdin")?;
            Ok(buf)
        }
    }
}

fn read_package(path: Option<&Path>) -> Result<AttestationPackage> {
    let raw = read_input(path)?;
    let shareable: ShareablePackage =
        serde_json::from_str(&raw).context("failed parsing attestation package JSON")?;
    if shareable.sig.is_legacy_flat() {
        tracing::info!("input uses the flat signature shape; treating it as V1");
    }

    let package = AttestationPackage::from(shareable);
    if !package.sig.has_canonical_types() {
        // Only the version tag travels; the decoded package gets the canonical field list.
        tracing::warn!(
            version = ?package.sig.version,
            primary_type = %package.sig.primary_type,
            "package types differ from the canonical layout for its version"
        );
    }
    Ok(package)
}

fn looks_like_share_url(text: &str) -> bool {
    text.contains('#') || text.contains("attestation=")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed serialising output JSON")?;
    println!("{out}");
    Ok(())
}
