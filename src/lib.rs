// blockfix - idempotent block replacement for a single source file

pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod preset;
pub mod replace;
pub mod utils;

pub use config::{DecodePolicy, JobConfig, ReplaceOptions, WriteMode};
pub use error::{BlockfixError, BlockfixResult};
pub use replace::{
    replace_block, replace_in_content, Outcome, ReplaceReport, SearchMode, SearchSpec,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
