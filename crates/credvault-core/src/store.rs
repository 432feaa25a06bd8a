//! JSON-backed account store.
//!
//! The accounts document is the single source of truth. [`AccountStore`]
//! keeps no cache: every operation loads the whole document, works on it in
//! memory, and (for mutations) writes the whole document back through
//! [`fsutil::write_atomic`].
//!
//! # Document
//!
//! ```json
//! [
//!   {
//!     "site": "gmail.com",
//!     "username": "bob",
//!     "secret": "<base64 nonce||ciphertext||tag>",
//!     "nickname": "personal",
//!     "created_at": "2024-05-01 09:30:00"
//!   }
//! ]
//! ```
//!
//! Documents written with the field names `usuario`, `senha`, `apelido` and
//! `data_criacao` are read as well.
//!
//! # Concurrency
//!
//! The read-modify-write cycle holds no lock. Two writers racing on the same
//! file lose one update (last writer wins). The store is meant for one
//! process at a time.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use crate::crypto;
use crate::domain::DomainNormalizer;
use crate::error::{Result, VaultError};
use crate::fsutil;
use crate::keys::KeyMaterial;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Timestamp format used in the accounts document.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored account.
///
/// `secret` always holds ciphertext. Use [`AccountStore::reveal_secret`] to
/// get the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Site or service the account belongs to, as entered.
    pub site: String,

    /// Login name, as entered.
    #[serde(alias = "usuario")]
    pub username: String,

    /// Text-encoded authenticated ciphertext of the password.
    #[serde(alias = "senha")]
    pub secret: String,

    /// Optional human-readable label.
    #[serde(
        default,
        alias = "apelido",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub nickname: Option<String>,

    /// Local time the account was added.
    #[serde(alias = "data_criacao", with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl AccountRecord {
    /// `true` if this record is exactly `(site, username)`, byte for byte.
    pub fn matches(&self, site: &str, username: &str) -> bool {
        self.site == site && self.username == username
    }
}

// ---------------------------------------------------------------------------
// AccountStore
// ---------------------------------------------------------------------------

/// Durable collection of [`AccountRecord`]s.
pub struct AccountStore {
    path: PathBuf,
    normalizer: DomainNormalizer,
}

impl AccountStore {
    /// Create a store backed by the document at `path`, using the built-in
    /// alias table.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_normalizer(path, DomainNormalizer::default())
    }

    /// Create a store with a custom domain normalizer.
    pub fn with_normalizer(path: impl Into<PathBuf>, normalizer: DomainNormalizer) -> Self {
        Self {
            path: path.into(),
            normalizer,
        }
    }

    /// Default document location: `<data_dir>/accounts.json`.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("accounts.json")
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The normalizer used for fingerprints.
    pub fn normalizer(&self) -> &DomainNormalizer {
        &self.normalizer
    }

    // -- Document I/O -------------------------------------------------------

    /// Read every record in insertion order.
    ///
    /// A missing document is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Storage`] if the document exists but is not a
    /// valid accounts array, and [`VaultError::Io`] if it cannot be read.
    pub fn load(&self) -> Result<Vec<AccountRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no accounts document, store is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let accounts: Vec<AccountRecord> =
            serde_json::from_str(&content).map_err(|e| VaultError::storage(&self.path, e))?;

        tracing::debug!(count = accounts.len(), "loaded accounts");
        Ok(accounts)
    }

    /// Replace the document with `accounts`.
    pub fn save(&self, accounts: &[AccountRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(accounts)?;
        fsutil::write_atomic(&self.path, &json)?;

        tracing::debug!(count = accounts.len(), "saved accounts");
        Ok(())
    }

    // -- Operations ---------------------------------------------------------

    /// Add a new account.
    ///
    /// `site`, `username` and `secret` are trimmed and must be non-empty. An
    /// empty nickname is stored as absent. The secret is encrypted under
    /// `key` before anything is written.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidInput`] for an empty required field.
    /// - [`VaultError::Duplicate`] if a stored account has the same
    ///   fingerprint. Nothing is written in that case.
    pub fn add(
        &self,
        site: &str,
        username: &str,
        secret: &str,
        nickname: Option<&str>,
        key: &KeyMaterial,
    ) -> Result<AccountRecord> {
        let site = required("site", site)?;
        let username = required("username", username)?;
        let secret = required("secret", secret)?;
        let nickname = nickname
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let mut accounts = self.load()?;

        let fingerprint = self.normalizer.fingerprint(site, username);
        if accounts
            .iter()
            .any(|a| self.normalizer.fingerprint(&a.site, &a.username) == fingerprint)
        {
            tracing::info!(site, "rejected duplicate account");
            return Err(VaultError::Duplicate {
                site: site.to_string(),
                username: username.to_string(),
            });
        }

        let record = AccountRecord {
            site: site.to_string(),
            username: username.to_string(),
            secret: crypto::encrypt(secret, key)?,
            nickname,
            created_at: Local::now().naive_local().trunc_subsecs(0),
        };

        accounts.push(record.clone());
        self.save(&accounts)?;

        tracing::info!(site, count = accounts.len(), "stored account");
        Ok(record)
    }

    /// All accounts ordered by site, case-insensitively. Accounts with the
    /// same site keep their insertion order.
    pub fn list_sorted(&self) -> Result<Vec<AccountRecord>> {
        let mut accounts = self.load()?;
        accounts.sort_by_cached_key(|a| a.site.to_lowercase());
        Ok(accounts)
    }

    /// Find the account stored under exactly `(site, username)`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] if there is no exact match.
    pub fn find(&self, site: &str, username: &str) -> Result<AccountRecord> {
        self.load()?
            .into_iter()
            .find(|a| a.matches(site, username))
            .ok_or_else(|| not_found(site, username))
    }

    /// Delete the first account stored under exactly `(site, username)`.
    ///
    /// Matching is byte-for-byte, not by fingerprint, so the record removed
    /// is the one a listing showed.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] if there is no exact match.
    pub fn delete(&self, site: &str, username: &str) -> Result<AccountRecord> {
        let mut accounts = self.load()?;

        let index = accounts
            .iter()
            .position(|a| a.matches(site, username))
            .ok_or_else(|| not_found(site, username))?;

        let removed = accounts.remove(index);
        self.save(&accounts)?;

        tracing::info!(site, count = accounts.len(), "deleted account");
        Ok(removed)
    }

    /// Decrypt the secret of `record`.
    ///
    /// # Errors
    ///
    /// Propagates [`VaultError::Authentication`] unchanged.
    pub fn reveal_secret(
        &self,
        record: &AccountRecord,
        key: &KeyMaterial,
    ) -> Result<Zeroizing<String>> {
        crypto::decrypt(&record.secret, key)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(VaultError::InvalidInput { field });
    }
    Ok(value)
}

fn not_found(site: &str, username: &str) -> VaultError {
    VaultError::NotFound {
        site: site.to_string(),
        username: username.to_string(),
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: AccountStore,
        key: KeyMaterial,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(AccountStore::default_path(dir.path()));
        Fixture {
            _dir: dir,
            store,
            key: KeyMaterial::generate().unwrap(),
        }
    }

    #[test]
    fn missing_document_is_empty() {
        let f = fixture();
        assert!(f.store.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_a_storage_error() {
        let f = fixture();
        std::fs::write(f.store.path(), "{ not json").unwrap();

        let err = f.store.load().unwrap_err();
        assert!(matches!(err, VaultError::Storage { .. }));
    }

    #[test]
    fn add_then_reveal() {
        let f = fixture();
        let record = f
            .store
            .add("github.com", "alice", "hunter2", Some("work"), &f.key)
            .unwrap();

        assert_ne!(record.secret, "hunter2");
        assert_eq!(record.nickname.as_deref(), Some("work"));

        let stored = f.store.find("github.com", "alice").unwrap();
        assert_eq!(stored, record);
        assert_eq!(f.store.reveal_secret(&stored, &f.key).unwrap().as_str(), "hunter2");
    }

    #[test]
    fn add_trims_fields_and_drops_blank_nickname() {
        let f = fixture();
        let record = f
            .store
            .add("  site.com ", " u ", " p ", Some("   "), &f.key)
            .unwrap();

        assert_eq!(record.site, "site.com");
        assert_eq!(record.username, "u");
        assert_eq!(record.nickname, None);
        assert_eq!(f.store.reveal_secret(&record, &f.key).unwrap().as_str(), "p");
    }

    #[test]
    fn add_rejects_empty_fields() {
        let f = fixture();
        let err = f.store.add("site.com", "  ", "p", None, &f.key).unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput { field: "username" }));
        assert!(!f.store.path().exists());
    }

    #[test]
    fn duplicate_across_aliases_is_rejected_without_writing() {
        let f = fixture();
        f.store.add("gmail.com", "bob", "pw1", None, &f.key).unwrap();
        let before = std::fs::read(f.store.path()).unwrap();

        let err = f
            .store
            .add("googlemail.com", "BOB", "pw2", None, &f.key)
            .unwrap_err();
        assert!(err.is_duplicate());

        assert_eq!(std::fs::read(f.store.path()).unwrap(), before);
        assert_eq!(f.store.load().unwrap().len(), 1);
    }

    #[test]
    fn list_sorted_is_case_insensitive_and_stable() {
        let f = fixture();
        f.store.add("zeta.io", "u1", "p", None, &f.key).unwrap();
        f.store.add("Alpha.com", "first", "p", None, &f.key).unwrap();
        f.store.add("beta.org", "u2", "p", None, &f.key).unwrap();
        f.store.add("alpha.com", "second", "p", None, &f.key).unwrap();

        let listed = f.store.list_sorted().unwrap();
        let order: Vec<_> = listed
            .iter()
            .map(|a| (a.site.as_str(), a.username.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                ("Alpha.com", "first"),
                ("alpha.com", "second"),
                ("beta.org", "u2"),
                ("zeta.io", "u1"),
            ]
        );

        assert_eq!(f.store.list_sorted().unwrap(), listed);
    }

    #[test]
    fn delete_matches_exactly() {
        let f = fixture();
        f.store.add("Site.com", "User", "p", None, &f.key).unwrap();

        let err = f.store.delete("site.com", "user").unwrap_err();
        assert!(err.is_not_found());

        let removed = f.store.delete("Site.com", "User").unwrap();
        assert_eq!(removed.username, "User");
        assert!(f.store.load().unwrap().is_empty());
    }

    #[test]
    fn reads_legacy_field_names() {
        let f = fixture();
        let blob = crypto::encrypt("pw", &f.key).unwrap();
        let legacy = serde_json::json!([{
            "site": "gmail.com",
            "usuario": "bob",
            "senha": blob,
            "apelido": "",
            "data_criacao": "2024-01-02 03:04:05"
        }]);
        std::fs::write(f.store.path(), legacy.to_string()).unwrap();

        let accounts = f.store.load().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "bob");
        assert_eq!(accounts[0].nickname, None);
        assert_eq!(
            accounts[0].created_at.format(TIMESTAMP_FORMAT).to_string(),
            "2024-01-02 03:04:05"
        );
        assert_eq!(f.store.reveal_secret(&accounts[0], &f.key).unwrap().as_str(), "pw");
    }

    #[test]
    fn writes_fixed_timestamp_format() {
        let f = fixture();
        f.store.add("site.com", "u", "p", None, &f.key).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(f.store.path()).unwrap()).unwrap();
        let ts = raw[0]["created_at"].as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok());
        assert!(raw[0].get("nickname").is_none());
    }

    #[test]
    fn corrupted_secret_does_not_block_listing() {
        let f = fixture();
        f.store.add("a.com", "u", "p1", None, &f.key).unwrap();
        f.store.add("b.com", "u", "p2", None, &f.key).unwrap();

        let mut accounts = f.store.load().unwrap();
        accounts[0].secret = "AAAA".into();
        f.store.save(&accounts).unwrap();

        let listed = f.store.list_sorted().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(f.store.reveal_secret(&listed[0], &f.key).unwrap_err().is_authentication());
        assert_eq!(f.store.reveal_secret(&listed[1], &f.key).unwrap().as_str(), "p2");
    }
}
