//! Subcommand handlers.
//!
//! Each handler talks to the vault only through [`Vault`]'s public API and
//! turns its errors into user-facing messages.

use std::path::Path;

use anyhow::{Context, Result, bail};
use credvault_core::{Vault, VaultError};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::cli::{GenerateArgs, PolicyAction, UiAction};
use crate::clipboard;
use crate::helpers::{apply_overrides, parse_section, read_secret};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub fn add(
    vault: &Vault,
    site: &str,
    username: &str,
    password: Option<String>,
    generate: bool,
    nickname: Option<&str>,
) -> Result<()> {
    let secret = match (password, generate) {
        (Some(password), _) => Zeroizing::new(password),
        (None, true) => {
            let generated = vault
                .generate_password(&vault.generator_policy())
                .context("failed to generate password")?;
            println!("Generated password: {generated}");
            Zeroizing::new(generated)
        }
        (None, false) => read_secret()?,
    };

    match vault.add_account(site, username, &secret, nickname) {
        Ok(record) => {
            println!("Added {} / {}", record.site, record.username);
            Ok(())
        }
        Err(VaultError::Duplicate { .. }) => {
            bail!("an account for this site and username already exists")
        }
        Err(e) => Err(e).context("failed to add account"),
    }
}

pub fn list(vault: &Vault) -> Result<()> {
    let accounts = vault.list_accounts().context("failed to load accounts")?;

    if accounts.is_empty() {
        println!("No accounts saved.");
        return Ok(());
    }

    for account in &accounts {
        match &account.nickname {
            Some(nickname) => println!("{} | {} | {}", account.site, account.username, nickname),
            None => println!("{} | {}", account.site, account.username),
        }
    }

    info!(count = accounts.len(), "listed accounts");
    Ok(())
}

pub fn show(vault: &Vault, site: &str, username: &str, reveal: bool, copy: bool) -> Result<()> {
    let account = vault
        .find_account(site, username)
        .context("failed to find account")?;

    println!("Site:       {}", account.site);
    println!("Username:   {}", account.username);
    println!("Nickname:   {}", account.nickname.as_deref().unwrap_or("-"));
    println!(
        "Created at: {}",
        account.created_at.format(credvault_core::store::TIMESTAMP_FORMAT)
    );

    if !reveal && !copy {
        println!("Password:   ********");
        return Ok(());
    }

    let secret = match vault.reveal_secret(&account) {
        Ok(secret) => secret,
        Err(e) => {
            warn!(site = %account.site, "secret could not be decrypted");
            println!("Password:   <unreadable: {e}>");
            return Ok(());
        }
    };

    if reveal {
        println!("Password:   {}", secret.as_str());
    } else {
        println!("Password:   ********");
    }

    if copy {
        clipboard::copy_with_clear(&secret)?;
        eprintln!(
            "Password copied to clipboard. Will clear in {} seconds.",
            clipboard::CLEAR_SECONDS
        );
    }

    Ok(())
}

pub fn delete(vault: &Vault, site: &str, username: &str) -> Result<()> {
    let removed = vault
        .delete_account(site, username)
        .context("failed to delete account")?;
    println!("Deleted {} / {}", removed.site, removed.username);
    Ok(())
}

pub fn export(vault: &Vault, dir: &Path) -> Result<()> {
    let report = vault
        .export_accounts(dir)
        .with_context(|| format!("failed to export to {}", dir.display()))?;

    if report.written.is_empty() {
        println!("No accounts to export.");
    } else {
        println!(
            "Exported {} account(s) to {}",
            report.written.len(),
            dir.display()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub fn generate(vault: &Vault, args: &GenerateArgs) -> Result<()> {
    let policy = apply_overrides(vault.generator_policy(), args);

    let password = vault
        .generate_password(&policy)
        .context("failed to generate password")?;

    if args.save {
        vault
            .save_generator_policy(&policy)
            .context("failed to save generator policy")?;
    }

    println!("{password}");

    if args.copy {
        clipboard::copy_with_clear(&password)?;
        eprintln!(
            "Password copied to clipboard. Will clear in {} seconds.",
            clipboard::CLEAR_SECONDS
        );
    }
    Ok(())
}

pub fn policy(vault: &Vault, action: PolicyAction) -> Result<()> {
    let policy = match action {
        PolicyAction::Show => vault.generator_policy(),
        PolicyAction::Reset => vault
            .reset_generator_policy()
            .context("failed to reset generator policy")?,
    };

    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings sections
// ---------------------------------------------------------------------------

pub fn ui(vault: &Vault, action: UiAction) -> Result<()> {
    match action {
        UiAction::Get { name } => {
            let section = vault.ui_section(&name);
            println!("{}", serde_json::to_string_pretty(&section)?);
        }
        UiAction::Set { name, json } => {
            let values = parse_section(&json)?;
            vault
                .save_ui_section(&name, values)
                .with_context(|| format!("failed to save section '{name}'"))?;
            println!("Saved section '{name}'");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub fn status(vault: &Vault, data_dir: &Path) -> Result<()> {
    println!();
    println!("  credvault Status");
    println!("  ================");
    println!();
    println!("  Data directory:   {}", data_dir.display());
    println!("  Accounts file:    {}", vault.accounts().path().display());
    println!("  Config file:      {}", vault.config().path().display());

    match vault.list_accounts() {
        Ok(accounts) => println!("  Accounts:         {}", accounts.len()),
        Err(e) => println!("  Accounts:         UNREADABLE ({e})"),
    }

    let policy = vault.generator_policy();
    println!("  Generator length: {}", policy.length);
    println!();

    Ok(())
}
