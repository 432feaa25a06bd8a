//! CLI entry point for credvault.
//!
//! This binary provides the `credvault` command with subcommands for adding,
//! listing, revealing and deleting accounts, generating passwords, and
//! managing settings sections.

mod cli;
mod clipboard;
mod commands;
mod helpers;

use anyhow::{Context, Result};
use clap::Parser;
use credvault_core::{Vault, VaultPaths};

use crate::cli::{Cli, Commands};
use crate::helpers::{DATA_DIR_ENV, init_tracing, resolve_data_dir};

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(if cli.verbose { "debug" } else { "warn" });

    let data_dir = resolve_data_dir(cli.data_dir, std::env::var(DATA_DIR_ENV).ok());
    let vault = Vault::open(VaultPaths::in_dir(&data_dir))
        .with_context(|| format!("failed to open vault in {}", data_dir.display()))?;

    match cli.command {
        Commands::Add {
            site,
            username,
            password,
            generate,
            nickname,
        } => commands::add(&vault, &site, &username, password, generate, nickname.as_deref()),
        Commands::List => commands::list(&vault),
        Commands::Show {
            site,
            username,
            reveal,
            copy,
        } => commands::show(&vault, &site, &username, reveal, copy),
        Commands::Delete { site, username } => commands::delete(&vault, &site, &username),
        Commands::Generate(args) => commands::generate(&vault, &args),
        Commands::Policy { action } => commands::policy(&vault, action),
        Commands::Ui { action } => commands::ui(&vault, action),
        Commands::Export { dir } => commands::export(&vault, &dir),
        Commands::Status => commands::status(&vault, &data_dir),
    }
}
