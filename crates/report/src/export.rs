//! Persisted relations output.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use copbrief_model::{RelationsReport, ResultTable};
use copbrief_primitives::{Date, Horizon};
use serde::{Deserialize, Serialize};

use crate::ReportError;

/// One line of the combined relations CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationsRecord {
    /// Horizon label (`1d` or `5d`).
    pub horizon: Horizon,
    /// Factor name or the residual row.
    pub factor: String,
    /// Standardized factor value.
    pub value: Option<f64>,
    /// Regression coefficient.
    pub coef: Option<f64>,
    /// Capped contribution.
    pub contribution: f64,
    /// Correlation over the last five rows.
    pub corr_5d: Option<f64>,
    /// Composite driver score.
    pub score: Option<f64>,
    /// `yes` when the contribution was capped.
    pub capped: String,
}

/// Flatten the non-empty tables into CSV records, in table order.
#[must_use]
pub fn relations_records(tables: &[&ResultTable]) -> Vec<RelationsRecord> {
    tables
        .iter()
        .filter(|t| !t.is_empty())
        .flat_map(|t| {
            t.rows.iter().map(|r| RelationsRecord {
                horizon: t.horizon,
                factor: r.factor.clone(),
                value: r.value,
                coef: r.coefficient,
                contribution: r.contribution,
                corr_5d: r.corr_5d,
                score: r.score,
                capped: if r.capped { "yes".to_string() } else { String::new() },
            })
        })
        .collect()
}

fn create_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write the combined 1d and 5d table followed by the summary as comments.
///
/// Returns the number of data rows written.
///
/// # Errors
/// Propagates CSV and filesystem errors.
pub fn export_relations_csv(
    path: impl AsRef<Path>,
    tables: &[&ResultTable],
    summary: &str,
) -> Result<usize, ReportError> {
    let path = path.as_ref();
    create_parent(path)?;
    let records = relations_records(tables);

    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    drop(writer);

    let mut file = OpenOptions::new().append(true).open(path)?;
    writeln!(file, "\n# Summary:")?;
    for line in summary.lines() {
        writeln!(file, "# {line}")?;
    }
    Ok(records.len())
}

/// Relations output of one daily run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationsSnapshot {
    /// Briefing date.
    pub date: Date,
    /// Chosen local-risk proxy.
    pub local_risk: String,
    /// Whether the local proxy fell back to the default.
    pub local_defaulted: bool,
    /// Risk-aversion flag.
    pub risk_on: bool,
    /// Rule-based summary.
    pub summary: String,
    /// Latest-day tables, 1-day first.
    pub tables: Vec<ResultTable>,
}

impl RelationsSnapshot {
    /// Capture a relations report for `date`.
    #[must_use]
    pub fn from_report(date: Date, report: &RelationsReport) -> Self {
        Self {
            date,
            local_risk: report.local_risk().ticker.to_string(),
            local_defaulted: report.local_risk().defaulted,
            risk_on: report.risk_on(),
            summary: report.summary().to_string(),
            tables: report.tables().into_iter().cloned().collect(),
        }
    }

    /// Number of table rows across horizons.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Write a snapshot as pretty-printed JSON.
///
/// # Errors
/// Propagates serialization and filesystem errors.
pub fn export_relations_json(path: impl AsRef<Path>, snapshot: &RelationsSnapshot) -> Result<(), ReportError> {
    let path = path.as_ref();
    create_parent(path)?;
    serde_json::to_writer_pretty(File::create(path)?, snapshot)?;
    Ok(())
}
