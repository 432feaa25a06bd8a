//! Vault error types.
//!
//! Every public API in this crate returns [`VaultError`]. The variants map
//! one-to-one onto the failure kinds a caller has to tell apart: a duplicate
//! account is not the same problem as a tampered secret, and neither is the
//! same as a full disk.

use std::path::PathBuf;

/// Unified error type for the credential vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    // -- Key errors ---------------------------------------------------------
    /// The key file exists but does not hold usable key material.
    #[error("invalid key material: {reason}")]
    InvalidKey { reason: String },

    // -- Crypto errors ------------------------------------------------------
    /// Encryption failed (CSPRNG or `ring` internal failure).
    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    /// The ciphertext was tampered with, truncated, badly encoded, or sealed
    /// under a different key.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    // -- Store errors -------------------------------------------------------
    /// A persisted document exists but could not be parsed.
    #[error("malformed document {}: {reason}", path.display())]
    Storage { path: PathBuf, reason: String },

    /// An account with the same fingerprint is already stored.
    #[error("account already exists: site={site}, username={username}")]
    Duplicate { site: String, username: String },

    /// No account matches the given site and username exactly.
    #[error("account not found: site={site}, username={username}")]
    NotFound { site: String, username: String },

    /// A required field was empty after trimming.
    #[error("invalid input: {field} must not be empty")]
    InvalidInput { field: &'static str },

    // -- Generator errors ---------------------------------------------------
    /// The generator policy is out of range.
    #[error("invalid generator policy: {reason}")]
    InvalidPolicy { reason: String },

    /// The policy produced no characters to draw from.
    #[error("generator alphabet is empty")]
    EmptyAlphabet,

    // -- Underlying errors --------------------------------------------------
    /// JSON encoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// `true` for [`VaultError::Duplicate`].
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// `true` for [`VaultError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// `true` for [`VaultError::Authentication`].
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the vault crate.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_variants() {
        let dup = VaultError::Duplicate {
            site: "gmail.com".into(),
            username: "bob".into(),
        };
        assert!(dup.is_duplicate());
        assert!(!dup.is_not_found());

        let auth = VaultError::Authentication {
            reason: "bad tag".into(),
        };
        assert!(auth.is_authentication());
    }

    #[test]
    fn storage_error_names_the_file() {
        let err = VaultError::storage("/tmp/accounts.json", "expected value at line 1");
        let msg = err.to_string();
        assert!(msg.contains("accounts.json"));
        assert!(msg.contains("expected value"));
    }
}
