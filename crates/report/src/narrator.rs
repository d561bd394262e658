//! Narrative generators for the briefing body.

use std::time::Duration;

use copbrief_traits::{NarrativeGenerator, NarrativeInput, SourceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{ReportError, build_briefing_markdown};

/// Renders the briefing from the fixed Markdown template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrativeGenerator for TemplateNarrator {
    async fn generate(&self, input: &NarrativeInput) -> Result<String, SourceError> {
        Ok(build_briefing_markdown(input))
    }
}

/// Settings of the chat-completions narrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Headlines passed to the model.
    pub max_headlines: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_headlines: 8,
            timeout_secs: 60,
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: String,
    /// Message text.
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

const SYSTEM_PROMPT: &str = "You are an FX analyst writing a two-minute USD/COP morning briefing \
in Markdown. Use only the data provided. Explain the move through the factor contributions, \
mention the most relevant headlines, and do not give trading advice or forecasts.";

/// Messages sent to the model for `input`.
#[must_use]
pub fn build_prompt(input: &NarrativeInput, max_headlines: usize) -> Vec<ChatMessage> {
    let headlines: Vec<String> = input
        .articles
        .iter()
        .take(max_headlines)
        .map(|a| match &a.description {
            Some(d) if !d.is_empty() => format!("- {}: {d} ({})", a.headline(), a.url),
            _ => format!("- {} ({})", a.headline(), a.url),
        })
        .collect();
    let headlines = if headlines.is_empty() { "- none".to_string() } else { headlines.join("\n") };

    let user = format!(
        "Date: {}\n\nMarket closes:\n{}\n\nSummary: {}\n\nFactor relations (standardized units):\n{}\n\n\
         Headlines:\n{headlines}\n\nWrite the briefing with a title, a short market paragraph, \
         a drivers section and a headlines section.",
        input.date, input.market_table, input.summary, input.relations_table,
    );
    vec![
        ChatMessage { role: "system".to_string(), content: SYSTEM_PROMPT.to_string() },
        ChatMessage { role: "user".to_string(), content: user },
    ]
}

/// Writes the briefing through an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct LlmNarrator {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl std::fmt::Debug for LlmNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmNarrator").field("config", &self.config).finish_non_exhaustive()
    }
}

impl LlmNarrator {
    /// Create a narrator.
    ///
    /// # Errors
    /// Returns [`ReportError::NotConfigured`] for an empty key and
    /// [`ReportError::Network`] if the HTTP client cannot be built.
    pub fn try_new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self, ReportError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ReportError::NotConfigured("LLM_API_KEY".to_string()));
        }
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, config, api_key })
    }

    /// Create a narrator with the key from `LLM_API_KEY`.
    ///
    /// # Errors
    /// Returns [`ReportError::NotConfigured`] when the variable is unset.
    pub fn from_env(config: LlmConfig) -> Result<Self, ReportError> {
        let key = std::env::var("LLM_API_KEY").map_err(|_| ReportError::NotConfigured("LLM_API_KEY".to_string()))?;
        Self::try_new(config, key)
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Request the briefing text.
    ///
    /// # Errors
    /// Returns [`ReportError::Api`] for non-success answers and
    /// [`ReportError::InvalidResponse`] when no text comes back.
    pub async fn complete(&self, input: &NarrativeInput) -> Result<String, ReportError> {
        let messages = build_prompt(input, self.config.max_headlines);
        let request = ChatRequest { model: &self.config.model, temperature: self.config.temperature, messages: &messages };
        debug!(model = %self.config.model, headlines = input.articles.len(), "requesting briefing");

        let response = self.client.post(self.endpoint()).bearer_auth(&self.api_key).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Api { status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ReportError::InvalidResponse("empty completion".to_string()))?;
        info!(chars = text.len(), "briefing generated");
        Ok(text)
    }
}

impl NarrativeGenerator for LlmNarrator {
    async fn generate(&self, input: &NarrativeInput) -> Result<String, SourceError> {
        Ok(self.complete(input).await?)
    }
}

#[cfg(test)]
mod tests {
    use copbrief_primitives::{Article, Date};

    use super::*;

    fn input(articles: usize) -> NarrativeInput {
        NarrativeInput {
            date: Date::from_ymd_opt(2024, 7, 1).unwrap(),
            market_table: "- USD/COP: 4100.00 (Δ 0.25%)".to_string(),
            relations_table: "### 5d".to_string(),
            summary: "USD/COP moved 0.900% (5d, standardized).".to_string(),
            articles: (0..articles)
                .map(|i| Article {
                    url: format!("https://example.com/{i}"),
                    title: Some(format!("Nota {i}")),
                    description: (i == 0).then(|| "La TRM sube".to_string()),
                    published: None,
                    text: String::new(),
                    source: None,
                    relevance_score: 5,
                })
                .collect(),
        }
    }

    #[test]
    fn prompt_contains_tables_and_limited_headlines() {
        let messages = build_prompt(&input(10), 8);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        let user = &messages[1].content;
        assert!(user.contains("Date: 2024-07-01"));
        assert!(user.contains("Summary: USD/COP moved 0.900% (5d, standardized)."));
        assert!(user.contains("- Nota 0: La TRM sube (https://example.com/0)"));
        assert!(user.contains("- Nota 7 (https://example.com/7)"));
        assert!(!user.contains("Nota 8"));
    }

    #[test]
    fn prompt_without_headlines() {
        let messages = build_prompt(&input(0), 8);
        assert!(messages[1].content.contains("Headlines:\n- none"));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = LlmNarrator::try_new(LlmConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, ReportError::NotConfigured(_)));
    }

    #[test]
    fn endpoint_joins_base() {
        let config = LlmConfig { base_url: "https://llm.example.com/v1/".to_string(), ..LlmConfig::default() };
        let narrator = LlmNarrator::try_new(config, "key").unwrap();
        assert_eq!(narrator.endpoint(), "https://llm.example.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn template_narrator_renders_markdown() {
        let text = TemplateNarrator.generate(&input(1)).await.unwrap();
        assert!(text.starts_with("# USD/COP Briefing - 2024-07-01"));
        assert!(text.contains("- [Nota 0](https://example.com/0)"));
    }
}
