//! Settings file of the `copbrief` binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use copbrief::{
    model::RelationsConfig, news::KeywordConfig, primitives::Ticker, report::LlmConfig,
};
use serde::Deserialize;

/// Default location of the settings file.
pub(crate) const DEFAULT_SETTINGS: &str = "config/settings.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) storage: StorageSettings,
    pub(crate) reports: ReportSettings,
    pub(crate) prices: PriceSettings,
    pub(crate) news: NewsSettings,
    pub(crate) llm: LlmConfig,
    pub(crate) newsletter: NewsletterSettings,
    pub(crate) relations: RelationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct StorageSettings {
    /// Root of `raw/` and `processed/`.
    pub(crate) base_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { base_dir: PathBuf::from("data") }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct ReportSettings {
    pub(crate) dir: PathBuf,
    pub(crate) relations_dir: PathBuf,
    /// Also write `briefing_<date>.html` next to the Markdown.
    pub(crate) html: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports/briefings"),
            relations_dir: PathBuf::from("reports/relations"),
            html: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct PriceSettings {
    /// Tickers to download. Empty means every ticker the relations engine reads.
    pub(crate) tickers: Vec<Ticker>,
    pub(crate) period_years: u32,
    pub(crate) rate_limit_ms: u64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self { tickers: Vec::new(), period_years: 5, rate_limit_ms: 250 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct NewsSettings {
    pub(crate) enabled: bool,
    pub(crate) sources_csv: PathBuf,
    pub(crate) max_per_source: usize,
    pub(crate) delay_ms: u64,
    pub(crate) timeout_secs: u64,
    pub(crate) keywords: KeywordConfig,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sources_csv: PathBuf::from("config/info_sources.csv"),
            max_per_source: 20,
            delay_ms: 500,
            timeout_secs: 10,
            keywords: KeywordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NewsletterSettings {
    pub(crate) newsletter: Option<String>,
    pub(crate) subject: Option<String>,
}

impl Settings {
    /// Read and parse a TOML settings file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Like [`Settings::load`], but falls back to defaults when the file is absent.
    pub(crate) fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "settings file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Tickers to download, deduplicated in order.
    pub(crate) fn price_tickers(&self) -> Vec<Ticker> {
        let wanted =
            if self.prices.tickers.is_empty() { self.relations.tickers() } else { self.prices.tickers.clone() };
        let mut out: Vec<Ticker> = Vec::with_capacity(wanted.len());
        for ticker in wanted {
            if !out.contains(&ticker) {
                out.push(ticker);
            }
        }
        out
    }

    pub(crate) fn raw_dir(&self) -> PathBuf {
        self.storage.base_dir.join("raw")
    }

    pub(crate) fn processed_dir(&self) -> PathBuf {
        self.storage.base_dir.join("processed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_settings() {
        let text = r#"
[storage]
base_dir = "/tmp/copbrief"

[prices]
tickers = ["COP=X", "DX-Y.NYB", "COP=X"]
period_years = 3

[news]
enabled = false

[news.keywords]
link_keywords = ["peso"]
relevance_threshold = 4

[llm]
model = "local-model"

[relations]
regression_window = 60
local_candidates = ["ICOL", "GXG"]
"#;
        let settings: Settings = toml::from_str(text).unwrap();
        assert_eq!(settings.storage.base_dir, PathBuf::from("/tmp/copbrief"));
        assert_eq!(settings.raw_dir(), PathBuf::from("/tmp/copbrief/raw"));
        assert_eq!(settings.prices.period_years, 3);
        assert_eq!(settings.price_tickers(), vec![Ticker::new("COP=X"), Ticker::new("DX-Y.NYB")]);
        assert!(!settings.news.enabled);
        assert_eq!(settings.news.keywords.link_keywords, vec!["peso".to_string()]);
        assert_eq!(settings.news.keywords.relevance_threshold, 4);
        assert_eq!(settings.news.keywords.strong, KeywordConfig::default().strong);
        assert_eq!(settings.llm.model, "local-model");
        assert_eq!(settings.llm.max_headlines, 8);
        assert_eq!(settings.relations.regression_window, 60);
        assert_eq!(settings.relations.local_candidates[0], Ticker::new("ICOL"));
        assert_eq!(settings.relations.target, Ticker::new("COP=X"));
        assert_eq!(settings.reports.dir, PathBuf::from("reports/briefings"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.storage.base_dir, PathBuf::from("data"));
        assert_eq!(settings.prices.period_years, 5);
        assert_eq!(settings.price_tickers(), settings.relations.tickers());
        assert!(settings.news.enabled);
        assert!(settings.newsletter.newsletter.is_none());
    }

    #[test]
    fn bundled_settings_parse() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../").join(DEFAULT_SETTINGS);
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.relations, RelationsConfig::default());
        assert!(settings.price_tickers().contains(&Ticker::new("COP=X")));
    }
}
