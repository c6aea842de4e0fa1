//! Protect, log, report and export commands.

use anyhow::{Context, Result};
use colored::Colorize;
use hm_prov::{BatchReport, ProofLabels, ProofOutcome, ProofRecord, Vault};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Handle `hallmark protect`. A directory protects every matching file in it.
pub fn cmd_protect(vault: &Vault, path: PathBuf, labels: ProofLabels) -> Result<ExitCode> {
    if path.is_dir() {
        let report = vault
            .protect_dir(&path, &labels)
            .with_context(|| format!("failed to protect {}", path.display()))?;
        print_batch(&path, &report);
        return Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let outcome = vault
        .protect(&path, &labels)
        .with_context(|| format!("failed to protect {}", path.display()))?;
    print_outcome(&outcome);
    Ok(ExitCode::SUCCESS)
}

fn print_outcome(outcome: &ProofOutcome) {
    let record = &outcome.record;
    println!("{} {}", "✓".green().bold(), record.file_path.to_string().bold());
    println!("  {}: {}", record.algorithm.to_string().bold(), record.content_hash);
    println!("  {}: {}", "Created".bold(), record.created_at.to_rfc3339());
    if let Some(project) = &record.project_label {
        println!("  {}: {}", "Project".bold(), project);
    }
    println!("  {}: {}", "Proof".bold(), outcome.document.display());
}

fn print_batch(dir: &Path, report: &BatchReport) {
    for outcome in &report.protected {
        println!(
            "{} {} {}",
            "✓".green().bold(),
            outcome.record.file_path,
            outcome.record.short_hash().dimmed()
        );
    }
    for failure in &report.failed {
        println!(
            "{} {}: {}",
            "✗".red().bold(),
            failure.path.display(),
            failure.error
        );
    }

    println!();
    println!("{}", "Summary:".bold().underline());
    println!("  {}: {}", "Directory".bold(), dir.display());
    println!("  {}: {}", "Protected".bold(), report.protected.len());
    if !report.skipped.is_empty() {
        println!("  {}: {}", "Skipped".bold(), report.skipped.len());
    }
    if !report.failed.is_empty() {
        println!(
            "  {}: {}",
            "Failed".bold(),
            report.failed.len().to_string().red().bold()
        );
    }
}

/// Handle `hallmark log`: every proof recorded for one file.
pub fn cmd_log(vault: &Vault, file: PathBuf) -> Result<ExitCode> {
    let history = vault
        .history(&file)
        .with_context(|| format!("failed to read proof history for {}", file.display()))?;

    if history.is_empty() {
        println!("{}", "No proofs recorded".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Proof History".bold().underline());
    println!("{}: {}", "File".bold(), history[0].file_path);
    println!("{}: {}", "Proofs".bold(), history.len());
    println!();

    for (idx, record) in history.iter().enumerate() {
        println!("{} {}", "Proof".bold().cyan(), (idx + 1).to_string().cyan());
        print_record(record);
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn print_record(record: &ProofRecord) {
    println!("  {}: {}", record.algorithm.to_string().bold(), record.content_hash);
    println!("  {}: {}", "Created".bold(), record.created_at.to_rfc3339());
    if let Some(size) = record.size_bytes {
        println!("  {}: {} bytes", "Size".bold(), size);
    }
    if let Some(project) = &record.project_label {
        println!("  {}: {}", "Project".bold(), project);
    }
    if let Some(client) = &record.client {
        println!("  {}: {}", "Client".bold(), client);
    }
    if let Some(description) = &record.description {
        println!("  {}: \"{}\"", "Description".bold(), description);
    }
    match &record.proof_document {
        Some(doc) => println!("  {}: {}", "Document".bold(), doc),
        None => println!("  {}: {}", "Document".bold(), "none".yellow()),
    }
}

/// Handle `hallmark report`.
pub fn cmd_report(vault: &Vault) -> Result<ExitCode> {
    let report = vault.report().context("failed to build registry report")?;
    println!("{report}");
    Ok(ExitCode::SUCCESS)
}

/// Handle `hallmark export`.
pub fn cmd_export(vault: &Vault, file: PathBuf, out: Option<PathBuf>) -> Result<ExitCode> {
    let package = vault
        .export(&file, out.as_deref())
        .with_context(|| format!("failed to export proof package for {}", file.display()))?;
    println!(
        "{} Proof package written to {}",
        "✓".green(),
        package.display()
    );
    Ok(ExitCode::SUCCESS)
}
