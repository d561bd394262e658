#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod fill;
pub use fill::ForwardFill;

mod panel;
pub use panel::{
    DATE_COL, PCT_CHANGE_COL, PanelBuilder, TICKER_COL, build_return_panel, column_dates,
    ensure_unique_keys,
};

mod error;
pub use error::UtilsError;
