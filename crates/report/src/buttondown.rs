//! Buttondown newsletter delivery.

use std::time::Duration;

use chrono::Utc;
use copbrief_primitives::Date;
use copbrief_traits::{Newsletter, Publisher, SourceError};
use reqwest::{Method, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::ReportError;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.buttondown.email";

/// Subject prefix of the daily issue.
pub const DEFAULT_SUBJECT: &str = "USD/COP - 2-minute briefing";

/// Tags attached to every issue.
pub const DEFAULT_TAGS: [&str; 2] = ["usd-cop", "briefing"];

/// First non-empty, non-heading line of a Markdown body.
#[must_use]
pub fn discover_preheader(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or_default()
        .to_string()
}

/// Unique email slug for `date`.
///
/// Uses the CI run identifier when given, otherwise the current UTC time.
#[must_use]
pub fn newsletter_slug(date: Date, run_id: Option<&str>) -> String {
    match run_id.map(str::trim).filter(|r| !r.is_empty()) {
        Some(run) => format!("usd-cop-briefing-{date}-{run}"),
        None => format!("usd-cop-briefing-{date}-{}", Utc::now().format("%H%M%S")),
    }
}

/// Subject line for `date`.
#[must_use]
pub fn default_subject(date: Date) -> String {
    format!("{DEFAULT_SUBJECT} | {date}")
}

/// A draft email to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    /// Subject line.
    pub subject: String,
    /// Markdown body.
    pub body: String,
    /// Inbox preview text.
    pub preheader: Option<String>,
    /// Newsletter identifier.
    pub newsletter: Option<String>,
    /// Public slug.
    pub slug: Option<String>,
    /// ISO-8601 delivery time.
    pub publish_at: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

impl EmailDraft {
    /// JSON payload for `POST /v1/emails`; empty optional fields are omitted.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut payload = json!({
            "subject": self.subject,
            "body": self.body,
            "content_type": "markdown",
            "status": "draft",
        });
        let optional = [
            ("preheader", &self.preheader),
            ("newsletter", &self.newsletter),
            ("slug", &self.slug),
            ("publish_at", &self.publish_at),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                payload[key] = json!(value);
            }
        }
        if !self.tags.is_empty() {
            payload["tags"] = json!(self.tags);
        }
        payload
    }
}

/// An email as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Email {
    /// Identifier.
    pub id: String,
    /// Delivery status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for the Buttondown emails API.
#[derive(Clone)]
pub struct ButtondownClient {
    client: reqwest::Client,
    base_url: String,
    newsletter: Option<String>,
    tags: Vec<String>,
    run_id: Option<String>,
}

impl std::fmt::Debug for ButtondownClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ButtondownClient")
            .field("base_url", &self.base_url)
            .field("newsletter", &self.newsletter)
            .finish_non_exhaustive()
    }
}

impl ButtondownClient {
    /// Create a client authenticating with `api_key`.
    ///
    /// # Errors
    /// Returns [`ReportError::NotConfigured`] for an empty or malformed key.
    pub fn try_new(api_key: &str, base_url: Option<&str>) -> Result<Self, ReportError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ReportError::NotConfigured("BUTTONDOWN_API_KEY".to_string()));
        }
        let mut token = header::HeaderValue::from_str(&format!("Token {api_key}"))
            .map_err(|_| ReportError::NotConfigured("BUTTONDOWN_API_KEY is not a valid header".to_string()))?;
        token.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, token);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            newsletter: None,
            tags: DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect(),
            run_id: None,
        })
    }

    /// Newsletter used by [`Publisher::publish`].
    #[must_use]
    pub fn with_newsletter(mut self, newsletter: impl Into<String>) -> Self {
        self.newsletter = Some(newsletter.into());
        self
    }

    /// CI run identifier used in slugs.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Option<String>) -> Self {
        self.run_id = run_id;
        self
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ReportError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ReportError::Api { status: status.as_u16(), body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ReportError::InvalidResponse(format!("{method} {path}: {e}")))
    }

    fn email(value: Value) -> Result<Email, ReportError> {
        let id = match value.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(ReportError::InvalidResponse("email without identifier".to_string())),
        };
        let status = value.get("status").and_then(Value::as_str).map(str::to_string);
        Ok(Email { id, status })
    }

    /// Create a draft.
    ///
    /// # Errors
    /// Returns [`ReportError::Api`] for non-2xx answers and
    /// [`ReportError::InvalidResponse`] when no identifier is returned.
    pub async fn create_email(&self, draft: &EmailDraft) -> Result<Email, ReportError> {
        Self::email(self.request(Method::POST, "/v1/emails", Some(&draft.payload())).await?)
    }

    /// Send a draft to subscribers now.
    ///
    /// # Errors
    /// Returns [`ReportError::Api`] for non-2xx answers.
    pub async fn queue_email(&self, id: &str) -> Result<Value, ReportError> {
        self.request(Method::PATCH, &format!("/v1/emails/{id}"), Some(&json!({"status": "about_to_send"})))
            .await
    }

    /// Schedule a draft for `publish_at` (ISO-8601).
    ///
    /// # Errors
    /// Returns [`ReportError::Api`] for non-2xx answers.
    pub async fn schedule_email(&self, id: &str, publish_at: &str) -> Result<Value, ReportError> {
        let body = json!({"status": "scheduled", "publish_at": publish_at});
        self.request(Method::PATCH, &format!("/v1/emails/{id}"), Some(&body)).await
    }

    /// Delete an email.
    ///
    /// # Errors
    /// Returns [`ReportError::Api`] for non-2xx answers.
    pub async fn delete_email(&self, id: &str) -> Result<(), ReportError> {
        self.request(Method::DELETE, &format!("/v1/emails/{id}"), None).await?;
        Ok(())
    }

    /// Draft for `issue` with preheader, slug, newsletter and tags filled in.
    #[must_use]
    pub fn draft_for(&self, issue: &Newsletter, date: Date) -> EmailDraft {
        EmailDraft {
            subject: issue.subject.clone(),
            body: issue.body.clone(),
            preheader: Some(discover_preheader(&issue.body)).filter(|p| !p.is_empty()),
            newsletter: self.newsletter.clone(),
            slug: Some(newsletter_slug(date, self.run_id.as_deref())),
            publish_at: None,
            tags: self.tags.clone(),
        }
    }
}

impl Publisher for ButtondownClient {
    async fn publish(&self, issue: &Newsletter) -> Result<String, SourceError> {
        let draft = self.draft_for(issue, Utc::now().date_naive());
        let email = self.create_email(&draft).await?;
        info!(id = %email.id, "draft created");
        if !issue.draft_only {
            let queued = self.queue_email(&email.id).await?;
            let status = queued.get("status").and_then(Value::as_str).unwrap_or("unknown");
            info!(id = %email.id, status, "newsletter queued");
        }
        Ok(email.id)
    }
}
