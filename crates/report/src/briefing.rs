//! Markdown and HTML rendering of the daily briefing.

use copbrief_model::ResultTable;
use copbrief_primitives::{Article, Date};
use copbrief_traits::NarrativeInput;
use polars::prelude::*;

use crate::ReportError;

/// Written when the briefing step is skipped on request.
pub const PLACEHOLDER_SKIPPED: &str = "# Briefing not generated\n";

/// Written when relations or narration are unavailable.
pub const PLACEHOLDER_UNAVAILABLE: &str = "# Briefing unavailable\n";

/// Headlines listed in the briefing.
pub const MAX_HEADLINES: usize = 6;

/// Latest close of one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    /// Ticker symbol.
    pub ticker: String,
    /// Closing price.
    pub close: f64,
    /// Daily change as a fraction.
    pub pct_change: Option<f64>,
}

/// Read `(ticker, close, pct_change)` rows from a daily snapshot.
///
/// Rows with a null ticker or close are skipped; a missing `pct_change`
/// column yields `None` changes.
///
/// # Errors
/// Returns a Polars error when `ticker` or `close` is absent or mistyped.
pub fn market_rows(day: &DataFrame) -> Result<Vec<MarketRow>, ReportError> {
    let tickers = day.column("ticker")?.str()?;
    let closes = day.column("close")?.f64()?;
    let changes = day.column("pct_change").ok().map(|c| c.f64()).transpose()?;

    let mut rows = Vec::with_capacity(day.height());
    for i in 0..day.height() {
        let (Some(ticker), Some(close)) = (tickers.get(i), closes.get(i)) else {
            continue;
        };
        rows.push(MarketRow {
            ticker: ticker.to_string(),
            close,
            pct_change: changes.and_then(|c| c.get(i)),
        });
    }
    Ok(rows)
}

/// Percentage with two decimals, `n/a` when missing.
#[must_use]
pub fn fmt_pct(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.filter(|v| v.is_finite()).map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Bullet list of the headline market closes.
#[must_use]
pub fn market_table(rows: &[MarketRow]) -> String {
    let find = |tickers: &[&str]| {
        tickers.iter().find_map(|t| rows.iter().find(|r| r.ticker == *t))
    };
    let mut lines = Vec::new();
    lines.push(match find(&["COP=X"]) {
        Some(r) => format!("- USD/COP: {:.2} (Δ {})", r.close, fmt_pct(r.pct_change)),
        None => "- USD/COP: no data".to_string(),
    });
    if let Some(r) = find(&["BZ=F"]) {
        lines.push(format!("- Brent (BZ=F): {:.2} USD/bbl (Δ {})", r.close, fmt_pct(r.pct_change)));
    }
    if let Some(r) = find(&["DX-Y.NYB", "^DXY", "DX=F"]) {
        lines.push(format!("- DXY ({}): {:.2} (Δ {})", r.ticker, r.close, fmt_pct(r.pct_change)));
    }
    if let Some(r) = find(&["^VIX"]) {
        lines.push(format!("- VIX (^VIX): {:.2} (Δ {})", r.close, fmt_pct(r.pct_change)));
    }
    lines.join("\n")
}

/// Markdown tables of the latest relations, one per horizon.
#[must_use]
pub fn relations_table(tables: &[&ResultTable]) -> String {
    let mut out = Vec::new();
    for table in tables {
        let date = table.date.map_or_else(|| "n/a".to_string(), |d| d.to_string());
        out.push(format!("### {} ({date}, R² {})", table.horizon, fmt_opt(table.r_squared)));
        if table.is_empty() {
            out.push("_No relations available._".to_string());
            out.push(String::new());
            continue;
        }
        out.push("| factor | value | coef | contribution | corr_5d | score | capped |".to_string());
        out.push("|---|---:|---:|---:|---:|---:|:---:|".to_string());
        for row in &table.rows {
            out.push(format!(
                "| {} | {} | {} | {:+.3} | {} | {} | {} |",
                row.factor,
                fmt_opt(row.value),
                fmt_opt(row.coefficient),
                row.contribution,
                fmt_opt(row.corr_5d),
                fmt_opt(row.score),
                if row.capped { "yes" } else { "" },
            ));
        }
        out.push(String::new());
    }
    out.join("\n").trim_end().to_string()
}

/// Assemble the narrative input, ordering articles by relevance.
#[must_use]
pub fn briefing_input(
    date: Date,
    market: &[MarketRow],
    tables: &[&ResultTable],
    summary: &str,
    articles: &[Article],
) -> NarrativeInput {
    let mut articles = articles.to_vec();
    articles.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    NarrativeInput {
        date,
        market_table: market_table(market),
        relations_table: relations_table(tables),
        summary: summary.to_string(),
        articles,
    }
}

/// Bullet list of the top headlines.
#[must_use]
pub fn headlines(articles: &[Article], limit: usize) -> String {
    if articles.is_empty() {
        return "- No relevant headlines today.".to_string();
    }
    articles
        .iter()
        .take(limit)
        .map(|a| match a.source.as_deref().filter(|s| !s.is_empty()) {
            Some(source) => format!("- [{}]({}) ({source})", a.headline(), a.url),
            None => format!("- [{}]({})", a.headline(), a.url),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full Markdown briefing.
#[must_use]
pub fn build_briefing_markdown(input: &NarrativeInput) -> String {
    let mut lines = vec![
        format!("# USD/COP Briefing - {}", input.date),
        String::new(),
        "## Market summary".to_string(),
        input.market_table.clone(),
        String::new(),
        "## Drivers".to_string(),
        input.summary.clone(),
    ];
    if !input.relations_table.is_empty() {
        lines.push(String::new());
        lines.push(input.relations_table.clone());
    }
    lines.extend([
        String::new(),
        "## Headlines".to_string(),
        headlines(&input.articles, MAX_HEADLINES),
        String::new(),
        "## Commentary (draft)".to_string(),
        "- USD/COP reflects the combined pull of the global dollar, regional currencies and Brent; \
         the VIX signals global risk appetite."
            .to_string(),
        "- Headlines point to local drivers (politics, inflation, rates) and external ones \
         (commodities, global dollar)."
            .to_string(),
        "- Check one-off events (government announcements, macro data, Fed/BanRep) that may explain \
         the day's direction."
            .to_string(),
        String::new(),
        "_Note: generated automatically as a starting point; review before publishing._".to_string(),
    ]);
    lines.join("\n")
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap the Markdown briefing in a minimal HTML page.
#[must_use]
pub fn build_briefing_html(input: &NarrativeInput) -> String {
    let markdown = escape_html(&build_briefing_markdown(input));
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>USD/COP Briefing - {date}</title>
    <style>
      body {{ font-family: -apple-system, Segoe UI, Roboto, Arial, sans-serif; line-height: 1.45; padding: 24px; }}
      pre {{ white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <pre>{markdown}</pre>
  </body>
</html>
"#,
        date = input.date,
    )
}
