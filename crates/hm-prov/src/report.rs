//! Plain-text registry report.

use crate::error::Result;
use crate::registry::Registry;
use crate::types::ProofRecord;
use crate::vault::Vault;
use chrono::{DateTime, Utc};
use std::fmt;

/// One protected file in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub latest: ProofRecord,
    pub proof_count: usize,
}

/// Snapshot of the registry for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub lines: Vec<ReportLine>,
}

impl Report {
    pub fn from_registry(registry: &Registry, generated_at: DateTime<Utc>) -> Self {
        let lines = registry
            .iter()
            .filter_map(|(_, history)| {
                history.last().map(|latest| ReportLine {
                    latest: latest.clone(),
                    proof_count: history.len(),
                })
            })
            .collect();
        Self {
            generated_at,
            lines,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "COPYRIGHT REGISTRY")?;
        writeln!(
            f,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;

        for line in &self.lines {
            let record = &line.latest;
            writeln!(f, "File: {}", record.file_path)?;
            writeln!(f, "{}: {}", record.algorithm, record.content_hash)?;
            writeln!(f, "Protected: {}", record.created_at.to_rfc3339())?;
            if let Some(project) = &record.project_label {
                writeln!(f, "Project: {project}")?;
            }
            if let Some(client) = &record.client {
                writeln!(f, "Client: {client}")?;
            }
            if let Some(description) = &record.description {
                writeln!(f, "Description: {description}")?;
            }
            writeln!(f, "Proofs: {}", line.proof_count)?;
            writeln!(f, "{}", "-".repeat(40))?;
            writeln!(f)?;
        }

        write!(f, "Protected files: {}", self.lines.len())
    }
}

impl Vault {
    pub fn report(&self) -> Result<Report> {
        let registry = self.store().load()?;
        Ok(Report::from_registry(&registry, Utc::now()))
    }
}
