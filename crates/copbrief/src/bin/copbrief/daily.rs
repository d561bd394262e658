//! The `daily` pipeline: prices, relations, news and briefing.
//!
//! Every stage after storage preparation degrades instead of aborting: a
//! failed stage is logged and later stages fall back to placeholders.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use copbrief::{
    data::{
        MARKET_DAILY, YahooPriceSource, add_pct_change, clean_directory, daily_context, date_folder,
        ensure_dir, save_closes_per_symbol, write_parquet,
    },
    model::RelationsEngine,
    news::{NewsScraper, load_sources_csv},
    primitives::{Article, Date},
    report::{
        LlmNarrator, MarketRow, PLACEHOLDER_SKIPPED, PLACEHOLDER_UNAVAILABLE, RelationsSnapshot,
        TemplateNarrator, briefing_input, build_briefing_html, export_relations_csv,
        export_relations_json, market_rows,
    },
    traits::{NarrativeGenerator, NarrativeInput, NewsSource, PriceSource},
};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::{DailyArgs, resolve_date, settings::Settings};

/// Printed to stdout when the pipeline finishes.
#[derive(Debug, Serialize)]
struct RunSummary {
    date: Date,
    prices_rows: usize,
    relations_rows: usize,
    news_count: usize,
    briefing_path: PathBuf,
    relations_path: PathBuf,
    market_data_path: PathBuf,
}

pub(crate) async fn run(args: DailyArgs) -> Result<()> {
    let settings = Settings::load_or_default(&args.config)?;
    let date = resolve_date(&args.date)?;
    prepare_storage(&settings)?;
    info!(%date, "starting daily pipeline");

    let market_data_path = settings.storage.base_dir.join(MARKET_DAILY);
    let prices = match download_prices(&settings, date, &market_data_path).await {
        Ok(prices) => Some(prices),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "price stage failed");
            None
        }
    };
    let prices_rows = prices.as_ref().map_or(0, DataFrame::height);
    info!(rows = prices_rows, "price rows stored");

    let market = match prices.as_ref().map(market_day).transpose() {
        Ok(rows) => rows.unwrap_or_default(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "daily market context failed");
            Vec::new()
        }
    };

    let relations_path = settings.reports.relations_dir.join(format!("relations_{date}.json"));
    let snapshot = match prices.as_ref() {
        Some(prices) => match relations(&settings, date, prices, &relations_path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "relations stage failed");
                None
            }
        },
        None => {
            warn!("no prices, skipping relations");
            None
        }
    };
    let relations_rows = snapshot.as_ref().map_or(0, RelationsSnapshot::n_rows);

    let articles = if settings.news.enabled {
        match scrape_news(&settings, date).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "news stage failed");
                Vec::new()
            }
        }
    } else {
        info!("news scraping disabled");
        Vec::new()
    };
    info!(count = articles.len(), "headlines retrieved");

    let briefing_path = settings.reports.dir.join(format!("briefing_{date}.md"));
    let input = snapshot.as_ref().filter(|s| s.n_rows() > 0).map(|s| {
        let tables: Vec<_> = s.tables.iter().collect();
        briefing_input(date, &market, &tables, &s.summary, &articles)
    });
    let body = match &input {
        _ if args.skip_llm => {
            info!("briefing skipped by request");
            PLACEHOLDER_SKIPPED.to_string()
        }
        None => {
            warn!("no relations data, writing placeholder briefing");
            PLACEHOLDER_UNAVAILABLE.to_string()
        }
        Some(input) => narrate(&settings, input).await,
    };
    write_briefing(&briefing_path, &body)?;
    if settings.reports.html
        && !args.skip_llm
        && let Some(input) = &input
    {
        let html_path = briefing_path.with_extension("html");
        fs::write(&html_path, build_briefing_html(input))
            .with_context(|| format!("failed to write {}", html_path.display()))?;
    }
    info!(path = %briefing_path.display(), "briefing saved");

    let summary = RunSummary {
        date,
        prices_rows,
        relations_rows,
        news_count: articles.len(),
        briefing_path,
        relations_path,
        market_data_path,
    };
    info!(%date, "pipeline finished");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Create the working folders and clear previous outputs.
fn prepare_storage(settings: &Settings) -> Result<()> {
    for dir in [
        settings.raw_dir(),
        settings.processed_dir(),
        settings.reports.dir.clone(),
        settings.reports.relations_dir.clone(),
    ] {
        ensure_dir(&dir)?;
        clean_directory(&dir).with_context(|| format!("failed to clean {}", dir.display()))?;
    }
    Ok(())
}

/// Download closes, persist them and return the long frame with `pct_change`.
async fn download_prices(settings: &Settings, date: Date, market_data_path: &Path) -> Result<DataFrame> {
    let tickers = settings.price_tickers();
    info!(tickers = tickers.len(), years = settings.prices.period_years, "downloading prices");
    let source = YahooPriceSource::with_rate_limit(Duration::from_millis(settings.prices.rate_limit_ms))?;
    let closes = source.fetch_closes(&tickers, settings.prices.period_years).await?;

    let folder = date_folder(&settings.storage.base_dir, "prices", date)?;
    let written = save_closes_per_symbol(&closes, &folder)?;
    info!(files = written.len(), dir = %folder.display(), "raw closes saved");

    let prices = add_pct_change(&closes)?;
    write_parquet(&prices, market_data_path)?;
    Ok(prices)
}

fn market_day(prices: &DataFrame) -> Result<Vec<MarketRow>> {
    Ok(market_rows(&daily_context(prices)?)?)
}

/// Run the relations engine and export its tables as CSV and JSON.
fn relations(
    settings: &Settings,
    date: Date,
    prices: &DataFrame,
    json_path: &Path,
) -> Result<RelationsSnapshot> {
    info!("building factor relations");
    let report = RelationsEngine::with_config(settings.relations.clone()).run(prices)?;
    let rows = export_relations_csv(json_path.with_extension("csv"), &report.tables(), report.summary())?;
    let snapshot = RelationsSnapshot::from_report(date, &report);
    export_relations_json(json_path, &snapshot)?;
    info!(rows, local = %snapshot.local_risk, risk_on = snapshot.risk_on, "relations exported");
    Ok(snapshot)
}

async fn scrape_news(settings: &Settings, date: Date) -> Result<Vec<Article>> {
    let news = &settings.news;
    let sources = load_sources_csv(&news.sources_csv)
        .with_context(|| format!("failed to load {}", news.sources_csv.display()))?;
    let out_dir = date_folder(&settings.storage.base_dir, "news", date)?;
    let scraper = NewsScraper::with_timeout(sources, news.keywords.clone(), Duration::from_secs(news.timeout_secs))?
        .with_max_per_source(news.max_per_source)
        .with_delay(Duration::from_millis(news.delay_ms))
        .with_output_dir(out_dir);
    Ok(scraper.fetch_articles().await?)
}

/// Generate the briefing text, preferring the LLM narrator.
///
/// Without `LLM_API_KEY` the template narrator is used; a failed generation
/// yields the unavailable placeholder.
async fn narrate(settings: &Settings, input: &NarrativeInput) -> String {
    match LlmNarrator::from_env(settings.llm.clone()) {
        Ok(narrator) => {
            info!(model = %narrator.config().model, "generating briefing with LLM");
            generate(&narrator, input).await
        }
        Err(e) => {
            warn!(error = %e, "LLM not configured, using template briefing");
            generate(&TemplateNarrator, input).await
        }
    }
}

async fn generate<G: NarrativeGenerator>(generator: &G, input: &NarrativeInput) -> String {
    match generator.generate(input).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "briefing generation failed");
            PLACEHOLDER_UNAVAILABLE.to_string()
        }
    }
}

fn write_briefing(path: &Path, body: &str) -> Result<()> {
    let mut text = body.trim_end().to_string();
    text.push('\n');
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use copbrief::traits::SourceError;

    use super::*;

    struct Failing;

    impl NarrativeGenerator for Failing {
        async fn generate(&self, _input: &NarrativeInput) -> Result<String, SourceError> {
            Err(SourceError::Unavailable("offline".to_string()))
        }
    }

    fn input() -> NarrativeInput {
        NarrativeInput {
            date: Date::from_ymd_opt(2024, 7, 1).unwrap(),
            market_table: String::new(),
            relations_table: String::new(),
            summary: "USD/COP moved 0.500% (5d, standardized).".to_string(),
            articles: Vec::new(),
        }
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("copbrief-daily-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn failed_generation_writes_placeholder() {
        assert_eq!(generate(&Failing, &input()).await, PLACEHOLDER_UNAVAILABLE);
    }

    #[tokio::test]
    async fn template_generation_carries_summary() {
        let text = generate(&TemplateNarrator, &input()).await;
        assert!(text.contains("USD/COP moved 0.500% (5d, standardized)."));
    }

    #[test]
    fn briefing_ends_with_single_newline() {
        let dir = scratch("briefing");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("briefing.md");
        write_briefing(&path, "# Title\n\nbody\n\n\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title\n\nbody\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn storage_is_cleared_but_keeps_gitkeep() {
        let base = scratch("storage");
        let mut settings = Settings::default();
        settings.storage.base_dir = base.join("data");
        settings.reports.dir = base.join("reports/briefings");
        settings.reports.relations_dir = base.join("reports/relations");

        fs::create_dir_all(settings.raw_dir().join("prices/2024-06-30")).unwrap();
        fs::write(settings.raw_dir().join("prices/2024-06-30/COP_X.csv"), "date,close\n").unwrap();
        fs::write(settings.raw_dir().join(".gitkeep"), "").unwrap();

        prepare_storage(&settings).unwrap();
        let left: Vec<String> = fs::read_dir(settings.raw_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec![".gitkeep"]);
        assert!(settings.processed_dir().is_dir());
        assert!(settings.reports.relations_dir.is_dir());
        fs::remove_dir_all(&base).unwrap();
    }
}
