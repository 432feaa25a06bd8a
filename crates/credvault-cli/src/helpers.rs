//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, data directory resolution, generator
//! policy overrides and JSON section parsing.

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use credvault_core::GeneratorPolicy;
use credvault_core::config::Section;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::cli::GenerateArgs;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "CREDVAULT_DATA_DIR";

/// Data directory used when neither the flag nor the environment set one.
pub const DEFAULT_DATA_DIR: &str = ".credvault";

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// Call after `.env` has been loaded so a `RUST_LOG` set there applies.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(default_level))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// `RUST_LOG` if set and valid, otherwise `default_level`.
fn log_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pick the data directory: the flag, then the environment, then the
/// default.
pub fn resolve_data_dir(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Apply command-line overrides to a saved policy.
pub fn apply_overrides(mut policy: GeneratorPolicy, args: &GenerateArgs) -> GeneratorPolicy {
    if let Some(length) = args.length {
        policy.length = length;
    }
    if args.no_uppercase {
        policy.use_uppercase = false;
    }
    if args.no_digits {
        policy.use_digits = false;
    }
    if let Some(special) = &args.special {
        policy.special_chars = special.clone();
        policy.use_special = true;
    }
    if args.no_special {
        policy.use_special = false;
    }
    policy
}

/// Parse a JSON object given on the command line.
pub fn parse_section(json: &str) -> Result<Section> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("section must be valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("section must be a JSON object"),
    }
}

/// Prompt for a password without echo.
///
/// When stdin is not a terminal the password is read as one line from it,
/// so `echo pw | credvault add ...` works in scripts.
pub fn read_secret() -> Result<Zeroizing<String>> {
    if io::stdin().is_terminal() {
        let secret = rpassword::prompt_password("Password: ").context("failed to read password")?;
        Ok(Zeroizing::new(secret))
    } else {
        read_secret_from(&mut io::stdin().lock())
    }
}

fn read_secret_from(reader: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let secret =
        rpassword::read_password_from_bufread(reader).context("failed to read password")?;
    Ok(Zeroizing::new(secret))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            length: None,
            no_uppercase: false,
            no_digits: false,
            no_special: false,
            special: None,
            save: false,
            copy: false,
        }
    }

    #[test]
    fn data_dir_precedence() {
        assert_eq!(
            resolve_data_dir(Some("/flag".into()), Some("/env".into())),
            PathBuf::from("/flag")
        );
        assert_eq!(resolve_data_dir(None, Some("/env".into())), PathBuf::from("/env"));
        assert_eq!(resolve_data_dir(None, Some("  ".into())), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(resolve_data_dir(None, None), PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn no_overrides_keeps_policy() {
        let policy = GeneratorPolicy::default();
        assert_eq!(apply_overrides(policy.clone(), &args()), policy);
    }

    #[test]
    fn overrides_apply() {
        let overrides = GenerateArgs {
            length: Some(24),
            no_digits: true,
            special: Some("#$".into()),
            ..args()
        };
        let policy = apply_overrides(GeneratorPolicy::default(), &overrides);
        assert_eq!(policy.length, 24);
        assert!(!policy.use_digits);
        assert!(policy.use_uppercase);
        assert!(policy.use_special);
        assert_eq!(policy.special_chars, "#$");
    }

    #[test]
    fn no_special_wins_over_special_set() {
        let overrides = GenerateArgs {
            no_special: true,
            special: Some("#".into()),
            ..args()
        };
        let policy = apply_overrides(GeneratorPolicy::default(), &overrides);
        assert!(!policy.use_special);
    }

    #[test]
    fn piped_secret_drops_line_ending() {
        let mut input = io::Cursor::new("hunter2\r\nignored\n");
        assert_eq!(read_secret_from(&mut input).unwrap().as_str(), "hunter2");
    }

    #[test]
    fn log_filter_honours_rust_log_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "RUST_LOG=credvault_core=trace\n").unwrap();

        dotenvy::from_path_override(&env_file).unwrap();

        assert!(log_filter("warn").to_string().contains("credvault_core=trace"));
    }

    #[test]
    fn parse_section_requires_object() {
        assert_eq!(parse_section(r#"{"x": 1}"#).unwrap()["x"], 1);
        assert!(parse_section("[1, 2]").is_err());
        assert!(parse_section("{").is_err());
    }
}
