//! Master key lifecycle.
//!
//! The vault has exactly one symmetric key. It lives in a dedicated key file
//! outside the account store, holding the raw [`KEY_LEN`] bytes and nothing
//! else. On first run the file is absent, so [`KeyManager`] generates a key
//! from the system CSPRNG and writes it; every later run reads it back.
//!
//! A key file of the wrong length is an error, never a reason to generate a
//! fresh key: replacing the key would orphan every stored secret.
//!
//! # Security Notes
//!
//! - On Unix the key file is created with mode 0600; the key bytes never sit
//!   in a file other users can read.
//! - [`KeyMaterial`] wipes its bytes on drop and never prints them.
//! - Anyone who can read the key file can decrypt the store. Protecting the
//!   host is out of scope.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, KEY_LEN};
use crate::error::{Result, VaultError};
use crate::fsutil;

// ---------------------------------------------------------------------------
// Key material
// ---------------------------------------------------------------------------

/// The AES-256 key that seals every account secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_LEN]);

impl KeyMaterial {
    /// Generate a new random key.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::EncryptionFailed`] if the system CSPRNG fails.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        crypto::fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidKey`] unless `bytes` is exactly
    /// [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| VaultError::InvalidKey {
            reason: format!("key must be {} bytes, got {}", KEY_LEN, bytes.len()),
        })?;
        Ok(Self(array))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Key manager
// ---------------------------------------------------------------------------

/// Loads the master key from its key file, creating it on first use.
///
/// The key is read at most once per manager; later calls return the cached
/// value.
pub struct KeyManager {
    key_file: PathBuf,
    key: OnceLock<KeyMaterial>,
}

impl KeyManager {
    /// Create a manager for the key stored at `key_file`.
    ///
    /// Nothing is read or written until [`get_or_create_key`](Self::get_or_create_key).
    pub fn new(key_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
            key: OnceLock::new(),
        }
    }

    /// Default key file location: `<data_dir>/vault.key`.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("vault.key")
    }

    /// Path of the key file this manager owns.
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Return the master key, loading or generating it on the first call.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Io`] if the key file cannot be read or written.
    /// - [`VaultError::InvalidKey`] if the key file has the wrong length.
    pub fn get_or_create_key(&self) -> Result<&KeyMaterial> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let key = if self.key_file.exists() {
            self.load()?
        } else {
            self.create()?
        };

        Ok(self.key.get_or_init(|| key))
    }

    fn load(&self) -> Result<KeyMaterial> {
        let data = zeroize::Zeroizing::new(std::fs::read(&self.key_file)?);
        let key = KeyMaterial::from_bytes(&data).map_err(|e| match e {
            VaultError::InvalidKey { reason } => VaultError::InvalidKey {
                reason: format!("{}: {reason}", self.key_file.display()),
            },
            other => other,
        })?;

        tracing::info!(path = %self.key_file.display(), "loaded master key");
        Ok(key)
    }

    fn create(&self) -> Result<KeyMaterial> {
        let key = KeyMaterial::generate()?;

        fsutil::write_atomic_private(&self.key_file, key.as_bytes())?;

        tracing::info!(path = %self.key_file.display(), "generated new master key");
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn creates_key_file_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());

        let manager = KeyManager::new(&path);
        let key = manager.get_or_create_key().unwrap().clone();

        let on_disk = fs::read(&path).unwrap();
        assert_eq!(on_disk.len(), KEY_LEN);
        assert_eq!(on_disk.as_slice(), key.as_bytes());
    }

    #[test]
    fn reloads_same_key_across_managers() {
        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());

        let first = KeyManager::new(&path).get_or_create_key().unwrap().clone();
        let second = KeyManager::new(&path).get_or_create_key().unwrap().clone();

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn caches_key_for_manager_lifetime() {
        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());
        let manager = KeyManager::new(&path);

        let first = manager.get_or_create_key().unwrap().clone();
        // Removing the file must not cause a regeneration.
        fs::remove_file(&path).unwrap();
        let second = manager.get_or_create_key().unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert!(!path.exists());
    }

    #[test]
    fn wrong_length_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());
        fs::write(&path, b"too short").unwrap();

        let err = KeyManager::new(&path).get_or_create_key().unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey { .. }));
        // The bad file is left alone.
        assert_eq!(fs::read(&path).unwrap(), b"too short");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());
        KeyManager::new(&path).get_or_create_key().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn failed_key_write_leaves_no_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = KeyManager::default_path(dir.path());
        fs::create_dir(dir.path().join("vault.key.tmp")).unwrap();

        let err = KeyManager::new(&path).get_or_create_key().unwrap_err();
        assert!(matches!(err, VaultError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = KeyMaterial::from_bytes(&[7u8; KEY_LEN]).unwrap();
        assert_eq!(format!("{key:?}"), "KeyMaterial(<redacted>)");
    }
}
