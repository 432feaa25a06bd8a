//! AES-256-GCM encryption of individual secrets using the `ring` crate.
//!
//! Every account secret is sealed on its own with a fresh random 96-bit
//! nonce and stored as text:
//!
//! ```text
//! base64( [12 bytes: nonce] [ciphertext] [16 bytes: GCM tag] )
//! ```
//!
//! Because the nonce is random, sealing the same plaintext twice yields two
//! different blobs. Ciphertext equality must never be used to detect
//! duplicate secrets.
//!
//! Opening fails with [`VaultError::Authentication`] for anything that does
//! not verify: a flipped byte, a truncated blob, bad base64, or a blob sealed
//! under another key. The error is per-secret; callers listing many accounts
//! can report it and carry on.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::aead::{self, Aad, BoundKey, NONCE_LEN, Nonce, NonceSequence, SealingKey, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};
use crate::keys::KeyMaterial;

/// Length of the AES-256-GCM key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the AES-256-GCM nonce in bytes (96 bits).
pub const NONCE_LEN_BYTES: usize = NONCE_LEN;

/// Length of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

static AEAD_ALG: &aead::Algorithm = &aead::AES_256_GCM;

// ---------------------------------------------------------------------------
// Nonce handling
// ---------------------------------------------------------------------------

/// A nonce sequence that yields exactly one nonce and then errors, so each
/// bound key is used for a single seal or open.
struct SingleNonce(Option<[u8; NONCE_LEN_BYTES]>);

impl SingleNonce {
    fn new(bytes: [u8; NONCE_LEN_BYTES]) -> Self {
        Self(Some(bytes))
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

// ---------------------------------------------------------------------------
// Secret strings
// ---------------------------------------------------------------------------

/// Encrypt a secret string and return its text-encoded authenticated
/// ciphertext.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the system CSPRNG or `ring`
/// reports a failure.
pub fn encrypt(plaintext: &str, key: &KeyMaterial) -> Result<String> {
    let (nonce, sealed) = seal(plaintext.as_bytes(), key)?;

    let mut blob = Vec::with_capacity(NONCE_LEN_BYTES + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);

    Ok(BASE64.encode(blob))
}

/// Decrypt a text-encoded ciphertext produced by [`encrypt`].
///
/// The returned plaintext is wiped from memory when dropped.
///
/// # Errors
///
/// Returns [`VaultError::Authentication`] if the ciphertext is malformed,
/// was modified, or was sealed under a different key.
pub fn decrypt(ciphertext: &str, key: &KeyMaterial) -> Result<Zeroizing<String>> {
    let blob = BASE64
        .decode(ciphertext.trim())
        .map_err(|e| VaultError::Authentication {
            reason: format!("ciphertext is not valid base64: {e}"),
        })?;

    if blob.len() < NONCE_LEN_BYTES + TAG_LEN {
        return Err(VaultError::Authentication {
            reason: format!(
                "ciphertext is {} bytes, shorter than nonce and tag ({})",
                blob.len(),
                NONCE_LEN_BYTES + TAG_LEN
            ),
        });
    }

    let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN_BYTES);
    let mut nonce = [0u8; NONCE_LEN_BYTES];
    nonce.copy_from_slice(nonce_bytes);

    let plaintext = open(&nonce, sealed, key)?;

    std::str::from_utf8(&plaintext)
        .map(|s| Zeroizing::new(s.to_owned()))
        .map_err(|_| VaultError::Authentication {
            reason: "decrypted secret is not valid UTF-8".into(),
        })
}

// ---------------------------------------------------------------------------
// Raw sealing
// ---------------------------------------------------------------------------

/// Seal `plaintext` with AES-256-GCM under `key`.
///
/// Returns `(nonce, ciphertext)` where `ciphertext` carries the 128-bit tag
/// appended by `ring`.
pub fn seal(plaintext: &[u8], key: &KeyMaterial) -> Result<([u8; NONCE_LEN_BYTES], Vec<u8>)> {
    let rng = SystemRandom::new();

    let mut nonce_bytes = [0u8; NONCE_LEN_BYTES];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to generate random nonce".into(),
        })?;

    let unbound_key =
        UnboundKey::new(AEAD_ALG, key.as_bytes()).map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to create AES-256-GCM key".into(),
        })?;

    let mut sealing_key = SealingKey::new(unbound_key, SingleNonce::new(nonce_bytes));

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "seal_in_place failed".into(),
        })?;

    tracing::trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = in_out.len(),
        "sealed secret"
    );

    Ok((nonce_bytes, in_out))
}

/// Open a ciphertext (including its GCM tag) sealed by [`seal`].
pub fn open(
    nonce: &[u8; NONCE_LEN_BYTES],
    ciphertext: &[u8],
    key: &KeyMaterial,
) -> Result<Zeroizing<Vec<u8>>> {
    let unbound_key =
        UnboundKey::new(AEAD_ALG, key.as_bytes()).map_err(|_| VaultError::Authentication {
            reason: "failed to create AES-256-GCM key".into(),
        })?;

    let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(*nonce));

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = opening_key
        .open_in_place(Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::Authentication {
            reason: "wrong key or corrupted data".into(),
        })?
        .len();
    in_out.truncate(plaintext_len);

    tracing::trace!(
        ciphertext_len = ciphertext.len(),
        plaintext_len,
        "opened secret"
    );

    Ok(in_out)
}

// ---------------------------------------------------------------------------
// Random bytes
// ---------------------------------------------------------------------------

/// Fill `buf` with cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [`VaultError::EncryptionFailed`] if the system CSPRNG fails.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| VaultError::EncryptionFailed {
            reason: "failed to generate random bytes".into(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
