// Configuration module for blockfix
// Handles per-run options and job files

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{DecodePolicy, JobConfig, ReplaceOptions, WriteMode};
