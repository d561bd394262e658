//! Keyword lists and article relevance scoring.

use copbrief_primitives::Article;
use serde::{Deserialize, Serialize};

use crate::{clean_text, normalize};

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Keyword lists and thresholds behind article selection.
///
/// Terms are matched on lower-cased, accent-stripped text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Terms a homepage link must mention to be fetched.
    pub link_keywords: Vec<String>,
    /// Direct exchange-rate terms.
    pub strong: Vec<String>,
    /// Dollar terms.
    pub dollar: Vec<String>,
    /// Macro and rates terms.
    pub macro_terms: Vec<String>,
    /// Off-topic terms that lower the score.
    pub negative: Vec<String>,
    /// Minimum score an article needs to be kept.
    pub relevance_threshold: i32,
    /// Body characters checked for off-topic terms.
    pub body_preview_chars: usize,
    /// Bodies shorter than this many words are penalised.
    pub min_body_words: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            link_keywords: terms(&["peso", "dolar", "USDCOP"]),
            strong: terms(&[
                "usd/cop",
                "usdcop",
                "usd cop",
                "trm",
                "tasa representativa",
                "peso colombiano",
                "dolar en colombia",
                "tipo de cambio",
                "devaluacion",
                "revaluacion",
            ]),
            dollar: terms(&["dolar", "usd", "billete verde"]),
            macro_terms: terms(&[
                "banrep",
                "banco de la republica",
                "inflacion",
                "tasas",
                "interes",
                "mercado cambiario",
                "divisas",
                "emergentes",
                "fed",
                "riesgo pais",
                "bonos",
                "tes",
            ]),
            negative: terms(&[
                "gafas",
                "tecnologia",
                "videojuego",
                "moda",
                "celebridad",
                "futbol",
                "baloncesto",
                "musica",
                "entretenimiento",
                "espectaculo",
                "smartphone",
                "gadget",
            ]),
            relevance_threshold: 3,
            body_preview_chars: 400,
            min_body_words: 40,
        }
    }
}

impl KeywordConfig {
    /// Replace the link keywords, keeping every other default.
    #[must_use]
    pub fn with_link_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { link_keywords: keywords.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Whether an article with `score` is kept.
    #[must_use]
    pub const fn is_relevant(&self, score: i32) -> bool {
        score >= self.relevance_threshold
    }
}

/// Whether `text` mentions any of `terms`.
#[must_use]
pub fn keyword_match<S: AsRef<str>>(text: &str, terms: &[S]) -> bool {
    let norm = normalize(text);
    terms.iter().any(|t| norm.contains(&normalize(t.as_ref())))
}

/// Total non-overlapping occurrences of `terms` in `text`.
#[must_use]
pub fn count_terms<S: AsRef<str>>(text: &str, terms: &[S]) -> usize {
    let norm = normalize(text);
    terms
        .iter()
        .map(|t| normalize(t.as_ref()))
        .filter(|t| !t.is_empty())
        .map(|t| norm.matches(t.as_str()).count())
        .sum()
}

/// Relevance of an article to USD/COP.
#[must_use]
pub fn score_article(article: &Article, config: &KeywordConfig) -> i32 {
    let title = clean_text(article.title.as_deref().unwrap_or_default());
    let description = clean_text(article.description.as_deref().unwrap_or_default());
    let text = clean_text(&article.text);
    let head = format!("{title} {description}");
    let combined = format!("{head} {text}");
    let preview: String = text.chars().take(config.body_preview_chars).collect();

    let count = |s: &str, t: &[String]| i32::try_from(count_terms(s, t)).unwrap_or(i32::MAX);
    let strong = count(&combined, &config.strong);
    let dollar = count(&combined, &config.dollar);
    let macro_hits = count(&combined, &config.macro_terms);
    let negative_head = count(&head, &config.negative);
    let negative_body = count(&preview, &config.negative);

    let mut score = strong.saturating_mul(3);
    score += dollar.min(3) * 2;
    score += macro_hits.min(3);
    if dollar > 0 && macro_hits > 0 {
        score += 2;
    }
    score = score.saturating_sub(negative_head.saturating_mul(2)).saturating_sub(negative_body);

    if title.is_empty() {
        score -= 1;
    }
    if text.split_whitespace().count() < config.min_body_words {
        score -= 1;
    }
    score
}
