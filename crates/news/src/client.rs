//! HTTP scraping of configured news sources.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use copbrief_primitives::Article;
use copbrief_traits::{NewsSource, SourceError};
use reqwest::header::CONTENT_TYPE;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    KeywordConfig, NewsError, SourceEntry, extract_article, find_candidate_links, keyword_match,
    score_article,
};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122 Safari/537.36";

/// File name of the scraped article dump.
pub const ARTICLES_FILE: &str = "articles.jsonl";

/// Whether a `Content-Type` header announces a text page.
#[must_use]
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/") || content_type.contains("html")
}

/// Write one JSON object per line.
///
/// # Errors
/// Propagates serialization and filesystem errors.
pub fn write_jsonl(path: impl AsRef<Path>, articles: &[Article]) -> Result<(), NewsError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for article in articles {
        serde_json::to_writer(&mut out, article)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Read articles written by [`write_jsonl`], skipping blank lines.
///
/// # Errors
/// Propagates parse and filesystem errors.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<Article>, NewsError> {
    let reader = BufReader::new(File::open(path)?);
    let mut articles = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        articles.push(serde_json::from_str(&line)?);
    }
    Ok(articles)
}

/// Scrapes homepages for relevant USD/COP articles.
#[derive(Debug, Clone)]
pub struct NewsScraper {
    client: reqwest::Client,
    sources: Vec<SourceEntry>,
    keywords: KeywordConfig,
    max_per_source: usize,
    delay: Duration,
    out_dir: Option<PathBuf>,
}

impl NewsScraper {
    /// Create a scraper over `sources` with a 10 second request timeout.
    ///
    /// # Errors
    /// Returns [`NewsError::Network`] if the HTTP client cannot be built.
    pub fn try_new(sources: Vec<SourceEntry>, keywords: KeywordConfig) -> Result<Self, NewsError> {
        Self::with_timeout(sources, keywords, Duration::from_secs(10))
    }

    /// Create a scraper with a custom request timeout.
    ///
    /// # Errors
    /// Returns [`NewsError::Network`] if the HTTP client cannot be built.
    pub fn with_timeout(
        sources: Vec<SourceEntry>,
        keywords: KeywordConfig,
        timeout: Duration,
    ) -> Result<Self, NewsError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self {
            client,
            sources,
            keywords,
            max_per_source: 20,
            delay: Duration::from_millis(500),
            out_dir: None,
        })
    }

    /// Candidates fetched per source.
    #[must_use]
    pub const fn with_max_per_source(mut self, max_per_source: usize) -> Self {
        self.max_per_source = max_per_source;
        self
    }

    /// Pause after each accepted article.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write `articles.jsonl` into `dir` after each scrape.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    /// Configured sources.
    #[must_use]
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    /// Keyword configuration.
    #[must_use]
    pub const fn keywords(&self) -> &KeywordConfig {
        &self.keywords
    }

    /// Fetch a page, returning `None` for non-HTML responses.
    ///
    /// # Errors
    /// Returns [`NewsError::Http`] for non-200 answers and
    /// [`NewsError::Network`] for transport failures.
    pub async fn fetch_page(&self, url: &str) -> Result<Option<String>, NewsError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(NewsError::Http { status: status.as_u16(), url: url.to_string() });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html_content_type(&content_type) {
            debug!(url, content_type, "skipping non-html response");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    /// Links of a homepage worth fetching, in document order.
    ///
    /// # Errors
    /// Returns [`NewsError::Selector`] only if a built-in selector is invalid.
    pub fn candidates(&self, homepage: &str, base: &str) -> Result<Vec<String>, NewsError> {
        Ok(find_candidate_links(homepage, base)?
            .into_iter()
            .filter(|link| keyword_match(&link.match_text(), &self.keywords.link_keywords))
            .map(|link| link.href)
            .take(self.max_per_source)
            .collect())
    }

    async fn scrape_source(&self, source: &SourceEntry) -> Result<Vec<Article>, NewsError> {
        let base = source.url.trim_end_matches('/');
        let Some(homepage) = self.fetch_page(base).await? else {
            return Ok(Vec::new());
        };

        let candidates = self.candidates(&homepage, base)?;
        debug!(source = %source.source, candidates = candidates.len(), "homepage scanned");

        let mut accepted = Vec::new();
        for url in candidates {
            let html = match self.fetch_page(&url).await {
                Ok(Some(html)) => html,
                Ok(None) => continue,
                Err(err) => {
                    debug!(%url, %err, "article fetch failed");
                    continue;
                }
            };
            let Some(mut article) = extract_article(&url, &html)? else {
                continue;
            };
            let score = score_article(&article, &self.keywords);
            if !self.keywords.is_relevant(score) {
                continue;
            }
            article.source = Some(source.source.clone());
            article.relevance_score = score;
            accepted.push(article);
            sleep(self.delay).await;
        }
        Ok(accepted)
    }

    /// Scrape every source, skipping those that fail.
    ///
    /// # Errors
    /// Returns an error only when the output file cannot be written.
    pub async fn scrape(&self) -> Result<Vec<Article>, NewsError> {
        let mut collected = Vec::new();
        for source in &self.sources {
            match self.scrape_source(source).await {
                Ok(articles) => {
                    info!(source = %source.source, articles = articles.len(), "source scraped");
                    collected.extend(articles);
                }
                Err(err) => warn!(source = %source.source, %err, "skipping source"),
            }
        }

        if let Some(dir) = &self.out_dir {
            write_jsonl(dir.join(ARTICLES_FILE), &collected)?;
        }
        info!(sources = self.sources.len(), articles = collected.len(), "news scraping finished");
        Ok(collected)
    }
}

impl NewsSource for NewsScraper {
    async fn fetch_articles(&self) -> Result<Vec<Article>, SourceError> {
        Ok(self.scrape().await?)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("text/html; charset=utf-8", true)]
    #[case("TEXT/PLAIN", true)]
    #[case("application/xhtml+xml", true)]
    #[case("application/pdf", false)]
    #[case("", false)]
    fn content_types(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_html_content_type(value), expected);
    }

    #[test]
    fn candidates_follow_keywords_and_limit() {
        let homepage = r#"
            <a href="/economia/dolar-cierra-al-alza">Mercados</a>
            <a href="/deportes/seleccion">Fútbol</a>
            <a href="/finanzas/nota-1">El peso colombiano</a>
            <a href="/finanzas/usdcop-hoy">Hoy</a>
        "#;
        let scraper = NewsScraper::try_new(Vec::new(), KeywordConfig::default()).unwrap();
        assert_eq!(
            scraper.candidates(homepage, "https://example.com").unwrap(),
            vec![
                "https://example.com/economia/dolar-cierra-al-alza",
                "https://example.com/finanzas/nota-1",
                "https://example.com/finanzas/usdcop-hoy",
            ]
        );

        let limited = scraper.with_max_per_source(1);
        assert_eq!(limited.candidates(homepage, "https://example.com").unwrap().len(), 1);
    }

    #[test]
    fn jsonl_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("copbrief-news-{}", std::process::id()))
            .join(ARTICLES_FILE);
        let article = Article {
            url: "https://example.com/a".to_string(),
            title: Some("Dólar hoy".to_string()),
            description: None,
            published: None,
            text: "La TRM sube.".to_string(),
            source: Some("Portafolio".to_string()),
            relevance_score: 7,
        };
        write_jsonl(&path, &[article.clone(), article.clone()]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Dólar hoy"));
        assert_eq!(read_jsonl(&path).unwrap(), vec![article.clone(), article]);
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
