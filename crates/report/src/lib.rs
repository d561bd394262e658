#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ReportError;

mod export;
pub use export::{
    RelationsRecord, RelationsSnapshot, export_relations_csv, export_relations_json,
    relations_records,
};

mod briefing;
pub use briefing::{
    MAX_HEADLINES, MarketRow, PLACEHOLDER_SKIPPED, PLACEHOLDER_UNAVAILABLE, briefing_input,
    build_briefing_html, build_briefing_markdown, escape_html, fmt_pct, headlines, market_rows,
    market_table, relations_table,
};

mod narrator;
pub use narrator::{ChatMessage, LlmConfig, LlmNarrator, TemplateNarrator, build_prompt};

mod buttondown;
pub use buttondown::{
    ButtondownClient, DEFAULT_BASE_URL, DEFAULT_SUBJECT, DEFAULT_TAGS, Email, EmailDraft,
    default_subject, discover_preheader, newsletter_slug,
};
