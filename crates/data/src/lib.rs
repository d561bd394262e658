#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/copbrief/copbrief/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::DataError;

mod yahoo;
pub use yahoo::{YahooPriceSource, closes_frame, history_days};

mod features;
pub use features::{add_pct_change, daily_context};

mod storage;
pub use storage::{
    MARKET_DAILY, clean_directory, date_folder, ensure_dir, read_parquet, save_closes_per_symbol,
    write_parquet,
};
