use anyhow::Result;
use clap::{Parser, Subcommand};
use hm_cli::commands::{proof, verify, LabelArgs, VaultArgs};
use hm_prov::Vault;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Hallmark: timestamped copyright proofs for static content.
#[derive(Parser, Debug)]
#[command(name = "hallmark", author = "Hallmark Contributors", version)]
struct Cli {
    #[command(flatten)]
    vault: VaultArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a proof for a file, or for every matching file in a directory.
    Protect {
        /// File or directory to protect.
        path: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
    },
    /// Check a file against its most recent proof.
    ///
    /// Exits 0 on a match, 3 on a mismatch and 4 when no proof exists.
    Verify {
        /// File to check.
        file: PathBuf,
        /// Check against this proof document instead of the registry.
        #[arg(long)]
        proof: Option<PathBuf>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show every proof recorded for a file.
    Log {
        /// Protected file.
        file: PathBuf,
    },
    /// Summarize every protected file.
    Report,
    /// Bundle a file's proof documents into a package directory.
    Export {
        /// Protected file.
        file: PathBuf,
        /// Directory to create the package in (default: <base-dir>/proofs/packages).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    let vault = Vault::open(cli.vault.resolve()?);
    match cli.command {
        Commands::Protect { path, labels } => proof::cmd_protect(&vault, path, labels.into()),
        Commands::Verify { file, proof, json } => verify::cmd_verify(&vault, file, proof, json),
        Commands::Log { file } => proof::cmd_log(&vault, file),
        Commands::Report => proof::cmd_report(&vault),
        Commands::Export { file, out } => proof::cmd_export(&vault, file, out),
    }
}
