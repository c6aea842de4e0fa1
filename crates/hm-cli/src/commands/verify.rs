//! The verify command and its exit codes.

use anyhow::{Context, Result};
use colored::Colorize;
use hm_prov::{Vault, Verification, VerifyStatus};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when the file changed since its proof.
pub const EXIT_MISMATCH: u8 = 3;

/// Exit code when the file has no proof.
pub const EXIT_NO_PROOF: u8 = 4;

/// Process exit status for a verification outcome.
pub fn exit_status(status: VerifyStatus) -> u8 {
    match status {
        VerifyStatus::Match => 0,
        VerifyStatus::Mismatch => EXIT_MISMATCH,
        VerifyStatus::NoProofFound => EXIT_NO_PROOF,
    }
}

/// Handle `hallmark verify`.
pub fn cmd_verify(
    vault: &Vault,
    file: PathBuf,
    proof: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    let verification = match &proof {
        Some(doc) => vault.verify_with_document(&file, doc).with_context(|| {
            format!(
                "failed to verify {} against {}",
                file.display(),
                doc.display()
            )
        })?,
        None => vault
            .verify(&file)
            .with_context(|| format!("failed to verify {}", file.display()))?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&verification)?);
    } else {
        print_verification(&verification);
    }
    Ok(ExitCode::from(exit_status(verification.status)))
}

fn print_verification(v: &Verification) {
    let (mark, status) = match v.status {
        VerifyStatus::Match => ("✓".green().bold(), v.status.to_string().green().bold()),
        VerifyStatus::Mismatch => ("✗".red().bold(), v.status.to_string().red().bold()),
        VerifyStatus::NoProofFound => ("?".yellow().bold(), v.status.to_string().yellow().bold()),
    };
    println!("{} {}", mark, v.file_path.to_string().bold());
    if let Some(expected) = &v.expected_hash {
        println!("  {}: {}", "Expected".bold(), expected);
    }
    println!("  {}: {}", "Actual".bold(), v.actual_hash);
    if let Some(proof) = &v.proof {
        println!("  {}: {}", "Proved".bold(), proof.created_at.to_rfc3339());
    }
    println!("  {}: {}", "Status".bold(), status);
}
