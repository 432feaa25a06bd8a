//! Local credential vault.
//!
//! Stores site/account credentials with each password sealed under a single
//! AES-256-GCM master key, refuses to store the same account twice across
//! known domain aliases, and generates passwords under a configurable
//! policy. All state lives in three files: the key file, the accounts
//! document and the settings document.
//!
//! # Modules
//!
//! - [`keys`]: master key file: load, or generate on first run.
//! - [`crypto`]: AES-256-GCM sealing of individual secrets.
//! - [`domain`]: canonical domains and duplicate-detection fingerprints.
//! - [`store`]: the accounts document.
//! - [`config`]: the sectioned settings document.
//! - [`generator`]: random passwords from a policy.
//! - [`export`]: plain-text export, one file per account.
//! - [`vault`]: the [`Vault`] context object tying them together.
//! - [`error`]: unified error type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use credvault_core::{Vault, VaultPaths};
//!
//! # fn example() -> credvault_core::Result<()> {
//! let vault = Vault::open(VaultPaths::in_dir(Path::new("data")))?;
//!
//! let policy = vault.generator_policy();
//! let password = vault.generate_password(&policy)?;
//! vault.add_account("gmail.com", "bob", &password, None)?;
//!
//! // "googlemail.com" canonicalizes to "gmail.com": rejected as a duplicate.
//! let err = vault.add_account("googlemail.com", "BOB", "other", None).unwrap_err();
//! assert!(err.is_duplicate());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod export;
pub mod fsutil;
pub mod generator;
pub mod keys;
pub mod store;
pub mod vault;

pub use config::ConfigStore;
pub use domain::DomainNormalizer;
pub use error::{Result, VaultError};
pub use generator::GeneratorPolicy;
pub use keys::{KeyManager, KeyMaterial};
pub use store::{AccountRecord, AccountStore};
pub use vault::{Vault, VaultPaths};
