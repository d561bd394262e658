//! Ticker type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Market data ticker as quoted by the price source (e.g. `COP=X`, `DX-Y.NYB`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(pub String);

impl Ticker {
    /// Create a new ticker.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system friendly form of the ticker, used for per-symbol CSV files.
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced by `_`, so `^VIX`
    /// becomes `_VIX` and `COP=X` becomes `COP_X`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect()
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
