use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BlockfixError, BlockfixResult};
use crate::replace::SearchSpec;

/// How bytes that are not valid UTF-8 are handled when the file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Fail with an encoding error
    #[default]
    Strict,
    /// Substitute U+FFFD for each invalid sequence
    Replace,
    /// Remove invalid sequences
    Drop,
}

impl DecodePolicy {
    pub fn is_lossy(&self) -> bool {
        !matches!(self, DecodePolicy::Strict)
    }
}

/// How the corrected content reaches the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Write a sibling temporary file and rename it over the original
    #[default]
    Atomic,
    /// Truncate the original and write into it
    InPlace,
}

/// Options shared by every replacement run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceOptions {
    pub decode: DecodePolicy,
    pub write: WriteMode,
    /// Copy the original bytes to `<file>.bak` before writing
    pub backup: bool,
    /// Compute the result and a diff without writing
    pub dry_run: bool,
    /// Refuse to write if the file changed on disk since it was read
    pub verify_unchanged: bool,
}

/// A complete replacement job as stored in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// File to repair; relative paths resolve against the job file's directory
    pub file: PathBuf,
    #[serde(default)]
    pub replacement: String,
    pub search: SearchSpec,
    #[serde(default)]
    pub options: ReplaceOptions,
}

impl JobConfig {
    /// Load a job from a `.toml`, `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> BlockfixResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = std::fs::read_to_string(path)
            .map_err(|e| BlockfixError::io_error(e, Some(path)))?;

        let mut job: JobConfig = Self::parse(&content, ext)?;
        if job.file.is_relative() {
            if let Some(base) = path.parent() {
                job.file = base.join(&job.file);
            }
        }

        debug!("Loaded job for {} from {}", job.file.display(), path.display());
        Ok(job)
    }

    /// Parse a job from text in the format named by `ext`
    pub fn parse(content: &str, ext: &str) -> BlockfixResult<Self> {
        match ext {
            "json" => Ok(serde_json::from_str(content)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
            "toml" => Ok(toml::from_str(content)?),
            _ => Err(BlockfixError::UnsupportedFormat {
                extension: ext.to_string(),
            }),
        }
    }

    pub fn save(&self, path: &Path) -> BlockfixResult<()> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let content = match ext {
            "json" => serde_json::to_string_pretty(self)?,
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "toml" => toml::to_string(self)?,
            _ => {
                return Err(BlockfixError::UnsupportedFormat {
                    extension: ext.to_string(),
                })
            }
        };

        std::fs::write(path, content).map_err(|e| BlockfixError::io_error(e, Some(path)))?;
        Ok(())
    }
}
