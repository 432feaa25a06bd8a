//! Sectioned settings document.
//!
//! Non-secret settings live in one JSON object keyed by section name:
//!
//! ```json
//! {
//!   "generator": { "length": 20, "use_uppercase": true, ... },
//!   "console":   { "x": 100, "y": 100, "width": 700, "height": 400 }
//! }
//! ```
//!
//! [`ConfigStore`] reads and writes whole sections. Sections it does not know
//! about (window geometry and the like) are carried through every save
//! untouched.
//!
//! A corrupt settings document is not fatal: it only holds preferences, so
//! it reads as empty and a warning is logged. Compare the account store,
//! where a corrupt document is an error. A document that exists but cannot
//! be read is different: lookups fall back to defaults, but saves fail
//! rather than overwrite sections they never saw.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::fsutil;
use crate::generator::GeneratorPolicy;

/// A section's contents.
pub type Section = Map<String, Value>;

/// Name of the password generator section.
pub const GENERATOR_SECTION: &str = "generator";

/// Generator section name used by older settings documents. Read only when
/// [`GENERATOR_SECTION`] is absent; never written.
pub const LEGACY_GENERATOR_SECTION: &str = "gerador_senhas";

const LEGACY_GENERATOR_KEYS: &[(&str, &str)] = &[
    ("comprimento", "length"),
    ("maiusculas", "use_uppercase"),
    ("numeros", "use_digits"),
    ("especiais", "use_special"),
    ("caracteres_especiais", "special_chars"),
];

/// Settings document backed by a JSON file.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store backed by the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default document location: `<data_dir>/config.json`.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the section `name`, filling every key it lacks from `defaults`.
    ///
    /// Keys present in the stored section but absent from `defaults` are
    /// returned too. The stored document is not modified.
    pub fn load_section(&self, name: &str, defaults: &Section) -> Section {
        let mut section = take_section(&mut self.load_document(), name).unwrap_or_default();

        for (key, value) in defaults {
            if !section.contains_key(key) {
                section.insert(key.clone(), value.clone());
            }
        }

        section
    }

    /// Replace the section `name` with `values` and rewrite the document.
    ///
    /// Every other section is written back as it was read.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Io`](crate::VaultError::Io) if the existing document cannot be read or
    /// the new one cannot be written. The file is left untouched in both
    /// cases.
    pub fn save_section(&self, name: &str, values: Section) -> Result<()> {
        let mut document = self.read_document()?;
        document.insert(name.to_string(), Value::Object(values));

        let json = serde_json::to_vec_pretty(&document)?;
        fsutil::write_atomic(&self.path, &json)?;

        tracing::info!(section = name, "saved config section");
        Ok(())
    }

    /// Read the generator policy, merged with the built-in defaults.
    ///
    /// Values of the wrong type fall back to their default. When only the
    /// legacy `gerador_senhas` section exists, its settings are used.
    pub fn generator_policy(&self) -> GeneratorPolicy {
        let defaults = GeneratorPolicy::default();
        let mut document = self.load_document();
        let section = match take_section(&mut document, GENERATOR_SECTION) {
            Some(section) => section,
            None => take_section(&mut document, LEGACY_GENERATOR_SECTION)
                .map(from_legacy_generator)
                .unwrap_or_default(),
        };

        let policy = GeneratorPolicy {
            length: field(&section, "length").unwrap_or(defaults.length),
            use_uppercase: field(&section, "use_uppercase").unwrap_or(defaults.use_uppercase),
            use_digits: field(&section, "use_digits").unwrap_or(defaults.use_digits),
            use_special: field(&section, "use_special").unwrap_or(defaults.use_special),
            special_chars: field(&section, "special_chars")
                .unwrap_or_else(|| defaults.special_chars.clone()),
        };

        tracing::debug!(length = policy.length, "loaded generator policy");
        policy
    }

    /// Persist the generator policy.
    pub fn save_generator_policy(&self, policy: &GeneratorPolicy) -> Result<()> {
        self.save_section(GENERATOR_SECTION, to_section(policy))
    }

    /// Read the whole document for a lookup. Any failure reads as empty.
    fn load_document(&self) -> Section {
        self.read_document().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot read config, using defaults");
            Map::new()
        })
    }

    /// Read the whole document.
    ///
    /// A missing file, malformed JSON, or a top-level value that is not an
    /// object reads as empty. Failing to read an existing file is an error.
    fn read_document(&self) -> Result<Section> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => {
                tracing::warn!(path = %self.path.display(), found = %json_kind(&other), "config is not an object, using defaults");
                Ok(Map::new())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed config, using defaults");
                Ok(Map::new())
            }
        }
    }
}

/// Remove the section `name` from `document`. A non-object value is
/// discarded with a warning.
fn take_section(document: &mut Section, name: &str) -> Option<Section> {
    match document.remove(name)? {
        Value::Object(section) => Some(section),
        other => {
            tracing::warn!(section = name, found = %json_kind(&other), "config section is not an object, using defaults");
            None
        }
    }
}

/// Rename the keys of a legacy generator section to the current names.
/// Unknown keys are dropped.
fn from_legacy_generator(legacy: Section) -> Section {
    legacy
        .into_iter()
        .filter_map(|(key, value)| {
            LEGACY_GENERATOR_KEYS
                .iter()
                .find(|(old, _)| *old == key)
                .map(|(_, new)| (new.to_string(), value))
        })
        .collect()
}

fn to_section<T: Serialize>(value: &T) -> Section {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn field<T: for<'de> Deserialize<'de>>(section: &Section, key: &str) -> Option<T> {
    section
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
