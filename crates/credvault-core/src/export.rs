//! Plain-text export, one file per account.
//!
//! File names are built from the site and username with everything except
//! alphanumerics, space, `-` and `_` removed and trailing whitespace
//! trimmed. An empty result becomes `unknown_site` or `unknown_user`. When
//! the name is taken, `_1`, `_2`, ... is appended before the extension.
//!
//! The exported files hold decrypted secrets. They are written with default
//! permissions; keeping them safe is the caller's business.

use std::path::{Path, PathBuf};

use chrono::Local;
use zeroize::Zeroizing;

use crate::error::Result;
use crate::store::{AccountRecord, TIMESTAMP_FORMAT};

const UNKNOWN_SITE: &str = "unknown_site";
const UNKNOWN_USER: &str = "unknown_user";

/// Outcome of an export.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Files written, in the order the records were given.
    pub written: Vec<PathBuf>,
}

/// Write one text file per record into `dir`.
///
/// `reveal` decrypts a record's secret. The first record it fails on aborts
/// the export with that error; files written before it are kept.
pub fn export_accounts<F>(dir: &Path, records: &[AccountRecord], mut reveal: F) -> Result<ExportReport>
where
    F: FnMut(&AccountRecord) -> Result<Zeroizing<String>>,
{
    std::fs::create_dir_all(dir)?;

    let mut report = ExportReport::default();
    for record in records {
        let secret = reveal(record)?;
        let path = unique_path(dir, &file_stem(&record.site, &record.username));

        let body = Zeroizing::new(render(record, &secret));
        std::fs::write(&path, body.as_bytes())?;

        report.written.push(path);
    }

    tracing::info!(count = report.written.len(), dir = %dir.display(), "exported accounts");
    Ok(report)
}

/// Keep alphanumerics, space, `-` and `_`, then drop trailing whitespace.
pub fn sanitize(part: &str) -> String {
    let kept: String = part
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

fn file_stem(site: &str, username: &str) -> String {
    let site = non_empty_or(sanitize(site), UNKNOWN_SITE);
    let username = non_empty_or(sanitize(username), UNKNOWN_USER);
    format!("{site}_{username}")
}

fn non_empty_or(value: String, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}.txt"));
    let mut counter = 1u32;
    while path.exists() {
        path = dir.join(format!("{stem}_{counter}.txt"));
        counter += 1;
    }
    path
}

fn render(record: &AccountRecord, secret: &str) -> String {
    let now = Local::now();
    format!(
        "EXPORTED ACCOUNT\n\
         Exported at: {exported}\n\
         \n\
         Site: {site}\n\
         Username: {username}\n\
         Password: {secret}\n\
         Nickname: {nickname}\n\
         Created at: {created}\n\
         \n\
         This file contains a plaintext password. Store it somewhere safe and\n\
         delete it when it is no longer needed.\n",
        exported = now.format(TIMESTAMP_FORMAT),
        site = record.site,
        username = record.username,
        nickname = record.nickname.as_deref().unwrap_or("None"),
        created = record.created_at.format(TIMESTAMP_FORMAT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;

    fn record(site: &str, username: &str) -> AccountRecord {
        AccountRecord {
            site: site.into(),
            username: username.into(),
            secret: "ciphertext".into(),
            nickname: None,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
                .and_then(|d| d.and_hms_opt(3, 4, 5))
                .unwrap(),
        }
    }

    fn reveal_plain(_: &AccountRecord) -> Result<Zeroizing<String>> {
        Ok(Zeroizing::new("pw".to_string()))
    }

    #[test]
    fn sanitize_strips_punctuation() {
        assert_eq!(sanitize("mail.google.com"), "mailgooglecom");
        assert_eq!(sanitize("bob@example.com"), "bobexamplecom");
        assert_eq!(sanitize("my site-1_a  "), "my site-1_a");
        assert_eq!(sanitize("çafé"), "çafé");
    }

    #[test]
    fn empty_parts_get_placeholders() {
        assert_eq!(file_stem("...", "@@"), "unknown_site_unknown_user");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let records = [record("a.com", "u"), record("a.com", "u!"), record("acom", "u")];

        let report = export_accounts(dir.path(), &records, reveal_plain).unwrap();
        let names: Vec<_> = report
            .written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["acom_u.txt", "acom_u_1.txt", "acom_u_2.txt"]);
    }

    #[test]
    fn body_contains_plaintext_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = record("site.com", "alice");
        rec.nickname = Some("work".into());

        let report = export_accounts(dir.path(), &[rec], reveal_plain).unwrap();
        let body = std::fs::read_to_string(&report.written[0]).unwrap();

        assert!(body.contains("Site: site.com"));
        assert!(body.contains("Username: alice"));
        assert!(body.contains("Password: pw"));
        assert!(body.contains("Nickname: work"));
        assert!(body.contains("Created at: 2024-01-02 03:04:05"));
    }

    #[test]
    fn reveal_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let records = [record("a.com", "u"), record("b.com", "u")];

        let err = export_accounts(dir.path(), &records, |r| {
            if r.site == "b.com" {
                Err(VaultError::Authentication {
                    reason: "bad tag".into(),
                })
            } else {
                reveal_plain(r)
            }
        })
        .unwrap_err();

        assert!(err.is_authentication());
        assert!(dir.path().join("acom_u.txt").exists());
        assert!(!dir.path().join("bcom_u.txt").exists());
    }
}
