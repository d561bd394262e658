//! # copbrief
//!
//! USD/COP daily briefing pipeline.
//!
//! This crate provides a unified interface to the copbrief workspace.
//! Individual components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all library components
//! - `primitives`: Core type definitions
//! - `traits`: Trait abstractions and collaborator seams
//! - `math`: Numerical routines
//! - `utils`: Panel building
//! - `factors`: Horizon returns, standardization and factor construction
//! - `model`: Rolling regression, contributions and the relations engine
//! - `data`: Yahoo Finance ingestion and market-data storage
//! - `news`: News scraping and relevance scoring
//! - `report`: Relations export, briefing rendering, narrators and newsletter delivery
//! - `cli`: The `copbrief` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use copbrief::model::RelationsEngine;
//!
//! let report = RelationsEngine::new().run(&long_prices)?;
//! println!("{}", report.summary());
//! ```

#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use copbrief_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use copbrief_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use copbrief_math as math;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use copbrief_utils as utils;
#[cfg(feature = "factors")]
#[doc(inline)]
pub use copbrief_factors as factors;
#[cfg(feature = "model")]
#[doc(inline)]
pub use copbrief_model as model;
#[cfg(feature = "data")]
#[doc(inline)]
pub use copbrief_data as data;
#[cfg(feature = "news")]
#[doc(inline)]
pub use copbrief_news as news;
#[cfg(feature = "report")]
#[doc(inline)]
pub use copbrief_report as report;
