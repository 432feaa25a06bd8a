//! CLI argument definitions for credvault.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// credvault -- a local, single-user credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    version,
    about = "credvault -- local encrypted credential vault",
    long_about = "Stores site credentials encrypted at rest, rejects duplicate accounts \
                  across domain aliases, and generates passwords under a saved policy."
)]
pub struct Cli {
    /// Directory holding the key file, accounts and settings.
    /// Defaults to $CREDVAULT_DATA_DIR, then ./.credvault.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add an account. The password is read from stdin unless given.
    Add {
        /// Site or service, e.g. gmail.com.
        site: String,
        /// Login name.
        username: String,
        /// Password to store.
        #[arg(long, short, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate the password with the saved policy and print it.
        #[arg(long, short)]
        generate: bool,
        /// Optional label.
        #[arg(long, short)]
        nickname: Option<String>,
    },

    /// List accounts sorted by site.
    List,

    /// Show one account.
    Show {
        /// Site exactly as listed.
        site: String,
        /// Username exactly as listed.
        username: String,
        /// Print the decrypted password.
        #[arg(long, short)]
        reveal: bool,
        /// Copy the decrypted password to the clipboard; it is cleared
        /// again after a few seconds.
        #[arg(long, short)]
        copy: bool,
    },

    /// Delete one account.
    Delete {
        /// Site exactly as listed.
        site: String,
        /// Username exactly as listed.
        username: String,
    },

    /// Generate a password.
    Generate(GenerateArgs),

    /// Show or reset the saved generator policy.
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Read or write an opaque settings section.
    Ui {
        #[command(subcommand)]
        action: UiAction,
    },

    /// Export every account to plain-text files.
    Export {
        /// Destination directory.
        dir: PathBuf,
    },

    /// Show file locations and account count.
    Status,
}

/// Overrides applied on top of the saved generator policy.
#[derive(Args)]
pub struct GenerateArgs {
    /// Password length (4 to 128).
    #[arg(long, short)]
    pub length: Option<usize>,

    /// Leave out A-Z.
    #[arg(long)]
    pub no_uppercase: bool,

    /// Leave out 0-9.
    #[arg(long)]
    pub no_digits: bool,

    /// Leave out special characters.
    #[arg(long)]
    pub no_special: bool,

    /// Special characters to use instead of the saved set.
    #[arg(long)]
    pub special: Option<String>,

    /// Save the resulting policy as the new default.
    #[arg(long)]
    pub save: bool,

    /// Copy the password to the clipboard; it is cleared again after a few
    /// seconds.
    #[arg(long, short)]
    pub copy: bool,
}

/// Actions for the generator policy.
#[derive(Subcommand)]
pub enum PolicyAction {
    /// Print the saved policy.
    Show,
    /// Restore the built-in defaults.
    Reset,
}

/// Actions for opaque settings sections.
#[derive(Subcommand)]
pub enum UiAction {
    /// Print a section as JSON.
    Get {
        /// Section name.
        name: String,
    },
    /// Replace a section with a JSON object.
    Set {
        /// Section name.
        name: String,
        /// JSON object, e.g. '{"width": 700, "height": 400}'.
        json: String,
    },
}
