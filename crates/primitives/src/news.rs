//! News article type definitions.

use serde::{Deserialize, Serialize};

/// A scraped news article with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Canonical URL of the article.
    pub url: String,
    /// Headline, if one could be extracted.
    pub title: Option<String>,
    /// Summary or meta description.
    pub description: Option<String>,
    /// Publication timestamp as published by the source.
    pub published: Option<String>,
    /// Cleaned body text.
    pub text: String,
    /// Name of the source the article was discovered on.
    #[serde(default)]
    pub source: Option<String>,
    /// Keyword relevance score.
    #[serde(default)]
    pub relevance_score: i32,
}

impl Article {
    /// Headline to display, falling back to the URL.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.url)
    }
}
