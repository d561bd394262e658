//! Link discovery and article extraction from raw HTML.

use std::collections::HashSet;

use copbrief_primitives::Article;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{NewsError, clean_text};

/// An anchor found on a homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute URL.
    pub href: String,
    /// Anchor text with surrounding whitespace removed.
    pub text: String,
}

impl Link {
    /// Last path segment with dashes turned into spaces.
    #[must_use]
    pub fn slug(&self) -> String {
        self.href.trim_end_matches('/').rsplit('/').next().unwrap_or_default().replace('-', " ")
    }

    /// Anchor text and slug joined for keyword matching.
    #[must_use]
    pub fn match_text(&self) -> String {
        format!("{} {}", self.text, self.slug())
    }
}

fn selector(css: &str) -> Result<Selector, NewsError> {
    Selector::parse(css).map_err(|e| NewsError::Selector(format!("{css}: {e:?}")))
}

fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element.text().map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(separator)
}

/// Absolute links of a page, deduplicated in document order.
///
/// Root-relative links are resolved against `base`; anything that is not
/// `http(s)` afterwards is dropped.
///
/// # Errors
/// Returns [`NewsError::Selector`] only if the built-in selector is invalid.
pub fn find_candidate_links(html: &str, base: &str) -> Result<Vec<Link>, NewsError> {
    let document = Html::parse_document(html);
    let base_url = Url::parse(base).ok();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&selector("a[href]")?) {
        let Some(raw) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };
        let href = match (&base_url, raw.starts_with('/')) {
            (Some(base), true) => match base.join(raw) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            },
            _ => raw.to_string(),
        };
        if !href.starts_with("http") || !seen.insert(href.clone()) {
            continue;
        }
        links.push(Link { href, text: joined_text(anchor, "") });
    }
    Ok(links)
}

fn meta_content(document: &Html, key: &str) -> Result<Option<String>, NewsError> {
    for attr in ["property", "name"] {
        let css = format!("meta[{attr}=\"{key}\"]");
        if let Some(tag) = document.select(&selector(&css)?).next() {
            return Ok(tag
                .value()
                .attr("content")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string));
        }
    }
    Ok(None)
}

fn first_meta(document: &Html, keys: &[&str]) -> Result<Option<String>, NewsError> {
    for key in keys {
        if let Some(content) = meta_content(document, key)? {
            return Ok(Some(content));
        }
    }
    Ok(None)
}

fn published(document: &Html) -> Result<Option<String>, NewsError> {
    for css in ["meta[property=\"article:published_time\"]", "meta[name=\"date\"]", "time[datetime]"] {
        let Some(tag) = document.select(&selector(css)?).next() else {
            continue;
        };
        let value = ["content", "datetime", "value"]
            .iter()
            .find_map(|a| tag.value().attr(a))
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(value) = value {
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn body(document: &Html) -> Result<String, NewsError> {
    let paragraphs = selector("p")?;
    let mut blocks: Vec<String> = Vec::new();
    if let Some(article) = document.select(&selector("article")?).next() {
        blocks = article.select(&paragraphs).map(|p| joined_text(p, " ")).collect();
    }
    if blocks.is_empty() {
        blocks = document.select(&paragraphs).map(|p| joined_text(p, " ")).collect();
    }
    blocks.retain(|b| !b.is_empty());
    Ok(clean_text(&blocks.join("\n")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}

/// Extract title, description, publication time and body from an article page.
///
/// Returns `None` when the page has no paragraph text. The article is
/// returned unscored.
///
/// # Errors
/// Returns [`NewsError::Selector`] only if a built-in selector is invalid.
pub fn extract_article(url: &str, html: &str) -> Result<Option<Article>, NewsError> {
    let document = Html::parse_document(html);

    let text = body(&document)?;
    if text.is_empty() {
        return Ok(None);
    }

    let mut title = first_meta(&document, &["og:title", "twitter:title"])?;
    if title.is_none() {
        title = document.select(&selector("title")?).next().map(|t| joined_text(t, ""));
    }
    let description = first_meta(&document, &["og:description", "twitter:description", "description"])?;

    Ok(Some(Article {
        url: url.to_string(),
        title: non_empty(title),
        description: non_empty(description),
        published: published(&document)?,
        text,
        source: None,
        relevance_score: 0,
    }))
}
