//! Canonical-domain normalization and account fingerprints.
//!
//! Two accounts are the same account when their *fingerprints* match:
//!
//! ```text
//! normalize_domain(site) + "||" + lowercase(trim(username))
//! ```
//!
//! Normalization lower-cases and trims the site, then walks the alias table
//! in order and returns the canonical domain of the first alias that occurs
//! anywhere in the site. Matching is by substring, not by host, so
//! `"mail.google.com"` canonicalizes through `"google.com"`. The walk order
//! is part of the contract: with overlapping aliases the earlier entry wins,
//! and a site that merely contains an alias (say `"notgmail.community"`)
//! still canonicalizes. Both quirks are kept as-is.

/// Separator between the domain and username halves of a fingerprint.
pub const FINGERPRINT_SEPARATOR: &str = "||";

/// Built-in alias table, in matching order.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("gmail.com", "gmail.com"),
    ("googlemail.com", "gmail.com"),
    ("google.com", "gmail.com"),
    ("google.com.br", "gmail.com"),
    ("hotmail.com", "outlook.com"),
    ("live.com", "outlook.com"),
    ("live.com.br", "outlook.com"),
    ("msn.com", "outlook.com"),
];

/// Maps site identifiers to canonical domains using an ordered alias table.
#[derive(Debug, Clone)]
pub struct DomainNormalizer {
    aliases: Vec<(String, String)>,
}

impl Default for DomainNormalizer {
    fn default() -> Self {
        Self::with_aliases(DEFAULT_ALIASES.iter().copied())
    }
}

impl DomainNormalizer {
    /// Build a normalizer from `(substring, canonical)` pairs, matched in the
    /// order given. Alias keys are lower-cased so matching stays
    /// case-insensitive.
    pub fn with_aliases<'a>(aliases: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(alias, canonical)| (alias.to_lowercase(), canonical.to_string()))
                .collect(),
        }
    }

    /// Canonicalize a site identifier.
    pub fn normalize_domain(&self, site: &str) -> String {
        let site = site.trim().to_lowercase();

        self.aliases
            .iter()
            .find(|(alias, _)| site.contains(alias.as_str()))
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or(site)
    }

    /// Compute the duplicate-detection fingerprint of a `(site, username)`
    /// pair.
    pub fn fingerprint(&self, site: &str, username: &str) -> String {
        format!(
            "{}{}{}",
            self.normalize_domain(site),
            FINGERPRINT_SEPARATOR,
            username.trim().to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unknown_site_is_trimmed_and_lowercased() {
        let n = DomainNormalizer::default();
        assert_eq!(n.normalize_domain("  Example.ORG "), "example.org");
    }

    #[test]
    fn google_variants_collapse_to_gmail() {
        let n = DomainNormalizer::default();
        for site in ["gmail.com", "GoogleMail.com", "mail.google.com", "google.com.br"] {
            assert_eq!(n.normalize_domain(site), "gmail.com", "site = {site}");
        }
    }

    #[test]
    fn microsoft_variants_collapse_to_outlook() {
        let n = DomainNormalizer::default();
        for site in ["hotmail.com", "login.live.com", "live.com.br", "msn.com"] {
            assert_eq!(n.normalize_domain(site), "outlook.com", "site = {site}");
        }
    }

    #[test]
    fn substring_match_is_loose() {
        let n = DomainNormalizer::default();
        assert_eq!(n.normalize_domain("notgmail.community"), "gmail.com");
    }

    #[test]
    fn earlier_alias_wins_on_overlap() {
        let n = DomainNormalizer::with_aliases([("b.com", "first"), ("ab.com", "second")]);
        assert_eq!(n.normalize_domain("ab.com"), "first");

        let n = DomainNormalizer::with_aliases([("ab.com", "second"), ("b.com", "first")]);
        assert_eq!(n.normalize_domain("ab.com"), "second");
    }

    #[test]
    fn fingerprint_ignores_username_case_and_padding() {
        let n = DomainNormalizer::default();
        assert_eq!(n.fingerprint("gmail.com", "bob"), "gmail.com||bob");
        assert_eq!(n.fingerprint("googlemail.com", "  BOB "), "gmail.com||bob");
    }

    #[test]
    fn alias_equivalence() {
        let n = DomainNormalizer::default();
        assert_eq!(
            n.fingerprint("mail.google.com", "a@x.com"),
            n.fingerprint("googlemail.com", "a@x.com")
        );
    }

    proptest! {
        #[test]
        fn fingerprint_is_idempotent(site in "[ -~]{0,24}", user in "[ -~]{0,16}") {
            let n = DomainNormalizer::default();
            let once = n.fingerprint(&site, &user);
            let twice = n.fingerprint(&n.normalize_domain(&site), &user);
            prop_assert_eq!(once, twice);
        }
    }
}
