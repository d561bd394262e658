#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::NewsError;

mod text;
pub use text::{clean_text, normalize, strip_accents};

mod keywords;
pub use keywords::{KeywordConfig, count_terms, keyword_match, score_article};

mod html;
pub use html::{Link, extract_article, find_candidate_links};

mod sources;
pub use sources::{SourceEntry, load_sources_csv};

mod client;
pub use client::{ARTICLES_FILE, NewsScraper, is_html_content_type, read_jsonl, write_jsonl};
