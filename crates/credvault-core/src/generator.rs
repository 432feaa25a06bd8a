//! Random password generation.
//!
//! The alphabet is always the lowercase ASCII letters, extended with the
//! uppercase letters, the digits and the policy's special characters when
//! those are enabled. Every output character is drawn independently and
//! uniformly from that alphabet using the operating system CSPRNG.
//!
//! There is no per-category guarantee. A 4-character password with every
//! category enabled can, with low probability, contain no digit at all.
//! Special characters are appended as given, so a character repeated in
//! `special_chars` is proportionally more likely to be drawn.
//!
//! Because lowercase letters are always present, the alphabet is never empty
//! and [`VaultError::EmptyAlphabet`] cannot be returned for a policy built
//! through this module. The variant exists for callers that construct
//! alphabets themselves via [`generate_from`].

use rand::Rng;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Shortest password the generator will produce.
pub const MIN_LENGTH: usize = 4;

/// Longest password the generator will produce.
pub const MAX_LENGTH: usize = 128;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Special characters enabled by default.
pub const DEFAULT_SPECIAL_CHARS: &str = "!@#$%&*()_+-=[]{}|;:,.<>?";

/// Switches controlling password generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorPolicy {
    /// Number of characters to generate, between [`MIN_LENGTH`] and
    /// [`MAX_LENGTH`].
    pub length: usize,
    /// Include `A-Z`.
    pub use_uppercase: bool,
    /// Include `0-9`.
    pub use_digits: bool,
    /// Include `special_chars`.
    pub use_special: bool,
    /// Special characters to draw from when `use_special` is set. May be
    /// empty.
    pub special_chars: String,
}

impl Default for GeneratorPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            use_uppercase: true,
            use_digits: true,
            use_special: true,
            special_chars: DEFAULT_SPECIAL_CHARS.to_string(),
        }
    }
}

impl GeneratorPolicy {
    /// Check the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidPolicy`] if `length` is outside
    /// [`MIN_LENGTH`]..=[`MAX_LENGTH`].
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(VaultError::InvalidPolicy {
                reason: format!(
                    "length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {}",
                    self.length
                ),
            });
        }
        Ok(())
    }

    /// The characters a password under this policy is drawn from, in order:
    /// lowercase, uppercase, digits, specials.
    pub fn alphabet(&self) -> Vec<char> {
        let mut alphabet: Vec<char> = LOWERCASE.chars().collect();
        if self.use_uppercase {
            alphabet.extend(UPPERCASE.chars());
        }
        if self.use_digits {
            alphabet.extend(DIGITS.chars());
        }
        if self.use_special {
            alphabet.extend(self.special_chars.chars());
        }
        alphabet
    }
}

/// Generate a password under `policy` using the OS CSPRNG.
///
/// # Errors
///
/// Returns [`VaultError::InvalidPolicy`] if the policy does not validate.
pub fn generate(policy: &GeneratorPolicy) -> Result<String> {
    generate_with(policy, &mut OsRng)
}

/// Generate a password under `policy` using the supplied random source.
pub fn generate_with<R: Rng + ?Sized>(policy: &GeneratorPolicy, rng: &mut R) -> Result<String> {
    policy.validate()?;
    let password = generate_from(&policy.alphabet(), policy.length, rng)?;

    tracing::debug!(length = policy.length, "generated password");
    Ok(password)
}

/// Draw `length` characters independently and uniformly from `alphabet`.
///
/// # Errors
///
/// Returns [`VaultError::EmptyAlphabet`] if `alphabet` is empty.
pub fn generate_from<R: Rng + ?Sized>(
    alphabet: &[char],
    length: usize,
    rng: &mut R,
) -> Result<String> {
    if alphabet.is_empty() {
        tracing::warn!("refusing to generate from an empty alphabet");
        return Err(VaultError::EmptyAlphabet);
    }

    (0..length)
        .map(|_| alphabet.choose(&mut *rng).copied().ok_or(VaultError::EmptyAlphabet))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
