//! News source lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::NewsError;

/// A homepage to scan for articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Display name of the outlet.
    pub source: String,
    /// Homepage URL.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SourceRow {
    source: Option<String>,
    url: Option<String>,
}

/// Read `source,url` rows, skipping rows with a blank URL.
///
/// A missing source name becomes `unknown`.
///
/// # Errors
/// Returns [`NewsError::Csv`] if the file cannot be read or parsed.
pub fn load_sources_csv(path: impl AsRef<Path>) -> Result<Vec<SourceEntry>, NewsError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_path(path)?;
    let mut entries = Vec::new();
    for row in reader.deserialize::<SourceRow>() {
        let row = row?;
        let Some(url) = row.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
            continue;
        };
        let source = row.source.filter(|s| !s.is_empty()).unwrap_or_else(|| "unknown".to_string());
        entries.push(SourceEntry { source, url });
    }
    Ok(entries)
}
