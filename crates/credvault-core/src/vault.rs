//! The vault context object.
//!
//! [`Vault`] ties the key, the account store and the settings store together
//! and is the only thing a front end needs to hold. It owns the master key
//! for its whole lifetime; there is no process-wide state.

use std::path::{Path, PathBuf};

use serde_json::Map;
use zeroize::Zeroizing;

use crate::config::{ConfigStore, Section};
use crate::domain::DomainNormalizer;
use crate::error::Result;
use crate::export::{self, ExportReport};
use crate::generator::{self, GeneratorPolicy};
use crate::keys::{KeyManager, KeyMaterial};
use crate::store::{AccountRecord, AccountStore};

/// File locations used by a [`Vault`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    pub key_file: PathBuf,
    pub accounts_file: PathBuf,
    pub config_file: PathBuf,
}

impl VaultPaths {
    /// The default layout inside `data_dir`: `vault.key`, `accounts.json`,
    /// `config.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            key_file: KeyManager::default_path(data_dir),
            accounts_file: AccountStore::default_path(data_dir),
            config_file: ConfigStore::default_path(data_dir),
        }
    }
}

/// Open credential vault.
///
/// # Example
///
/// ```rust,no_run
/// # use std::path::Path;
/// # use credvault_core::{Vault, VaultPaths};
/// # fn example() -> credvault_core::Result<()> {
/// let vault = Vault::open(VaultPaths::in_dir(Path::new("data")))?;
///
/// vault.add_account("gmail.com", "bob", "hunter2", Some("personal"))?;
///
/// for account in vault.list_accounts()? {
///     match vault.reveal_secret(&account) {
///         Ok(secret) => println!("{} {} {}", account.site, account.username, *secret),
///         Err(e) => eprintln!("{}: {e}", account.site),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Vault {
    keys: KeyManager,
    accounts: AccountStore,
    config: ConfigStore,
}

impl Vault {
    /// Open the vault at `paths` with the built-in alias table.
    ///
    /// The master key is loaded (or generated) here, so a vault that opened
    /// successfully can always encrypt and decrypt.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be obtained; see
    /// [`KeyManager::get_or_create_key`].
    pub fn open(paths: VaultPaths) -> Result<Self> {
        Self::open_with_normalizer(paths, DomainNormalizer::default())
    }

    /// Open the vault with a custom domain normalizer.
    pub fn open_with_normalizer(paths: VaultPaths, normalizer: DomainNormalizer) -> Result<Self> {
        let keys = KeyManager::new(paths.key_file);
        keys.get_or_create_key()?;

        tracing::debug!(
            accounts = %paths.accounts_file.display(),
            config = %paths.config_file.display(),
            "vault ready"
        );

        Ok(Self {
            keys,
            accounts: AccountStore::with_normalizer(paths.accounts_file, normalizer),
            config: ConfigStore::new(paths.config_file),
        })
    }

    /// The account store.
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    /// The settings store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    fn key(&self) -> Result<&KeyMaterial> {
        self.keys.get_or_create_key()
    }

    // -- Accounts -----------------------------------------------------------

    /// Add an account, rejecting duplicates by fingerprint.
    pub fn add_account(
        &self,
        site: &str,
        username: &str,
        secret: &str,
        nickname: Option<&str>,
    ) -> Result<AccountRecord> {
        self.accounts.add(site, username, secret, nickname, self.key()?)
    }

    /// All accounts, sorted by site. Secrets stay encrypted.
    pub fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        self.accounts.list_sorted()
    }

    /// The account stored under exactly `(site, username)`.
    pub fn find_account(&self, site: &str, username: &str) -> Result<AccountRecord> {
        self.accounts.find(site, username)
    }

    /// Delete the account stored under exactly `(site, username)`.
    pub fn delete_account(&self, site: &str, username: &str) -> Result<AccountRecord> {
        self.accounts.delete(site, username)
    }

    /// Decrypt an account's secret.
    pub fn reveal_secret(&self, record: &AccountRecord) -> Result<Zeroizing<String>> {
        self.accounts.reveal_secret(record, self.key()?)
    }

    /// Export every account, sorted by site, as plain-text files in `dir`.
    pub fn export_accounts(&self, dir: &Path) -> Result<ExportReport> {
        let records = self.list_accounts()?;
        export::export_accounts(dir, &records, |r| self.reveal_secret(r))
    }

    // -- Generator ----------------------------------------------------------

    /// The saved generator policy merged with defaults.
    pub fn generator_policy(&self) -> GeneratorPolicy {
        self.config.generator_policy()
    }

    /// Validate and persist a generator policy.
    pub fn save_generator_policy(&self, policy: &GeneratorPolicy) -> Result<()> {
        policy.validate()?;
        self.config.save_generator_policy(policy)
    }

    /// Overwrite the saved generator policy with the built-in defaults.
    pub fn reset_generator_policy(&self) -> Result<GeneratorPolicy> {
        let policy = GeneratorPolicy::default();
        self.config.save_generator_policy(&policy)?;
        Ok(policy)
    }

    /// Generate a password under `policy`.
    pub fn generate_password(&self, policy: &GeneratorPolicy) -> Result<String> {
        generator::generate(policy)
    }

    // -- UI sections --------------------------------------------------------

    /// Read an opaque settings section. Missing sections read as empty.
    pub fn ui_section(&self, name: &str) -> Section {
        self.config.load_section(name, &Map::new())
    }

    /// Replace an opaque settings section.
    pub fn save_ui_section(&self, name: &str, values: Section) -> Result<()> {
        self.config.save_section(name, values)
    }
}
