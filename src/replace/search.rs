use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BlockfixError, BlockfixResult};

/// What to look for in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SearchSpec {
    /// Exact substring
    Literal { text: String },
    /// A block starting at a line that begins with `start_token` and ending at
    /// the first later line consisting solely of `end_delimiter`
    Pattern {
        start_token: String,
        end_delimiter: String,
    },
}

/// Which search strategy a spec uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Literal,
    Pattern,
}

impl SearchSpec {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal { text: text.into() }
    }

    pub fn pattern(start_token: impl Into<String>, end_delimiter: impl Into<String>) -> Self {
        Self::Pattern {
            start_token: start_token.into(),
            end_delimiter: end_delimiter.into(),
        }
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            SearchSpec::Literal { .. } => SearchMode::Literal,
            SearchSpec::Pattern { .. } => SearchMode::Pattern,
        }
    }

    /// Reject specs that would match everywhere
    pub fn validate(&self) -> BlockfixResult<()> {
        match self {
            SearchSpec::Literal { text } if text.is_empty() => Err(
                BlockfixError::invalid_argument("literal search text must not be empty"),
            ),
            SearchSpec::Pattern { start_token, .. } if start_token.is_empty() => Err(
                BlockfixError::invalid_argument("pattern start token must not be empty"),
            ),
            SearchSpec::Pattern { end_delimiter, .. } if end_delimiter.is_empty() => Err(
                BlockfixError::invalid_argument("pattern end delimiter must not be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Build the line-spanning regex for pattern mode.
    ///
    /// Both tokens are matched literally. `(?m)` anchors `^`/`$` at line
    /// boundaries, `R` treats `\r\n` as a line terminator and the lazy
    /// `[\s\S]*?` stops at the first closing line.
    pub fn compile(&self) -> BlockfixResult<Option<Regex>> {
        self.validate()?;
        match self {
            SearchSpec::Literal { .. } => Ok(None),
            SearchSpec::Pattern {
                start_token,
                end_delimiter,
            } => {
                let source = format!(
                    r"(?mR)^{}[\s\S]*?^{}$",
                    regex::escape(start_token),
                    regex::escape(end_delimiter)
                );
                Ok(Some(Regex::new(&source)?))
            }
        }
    }
}

impl fmt::Display for SearchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchSpec::Literal { text } => {
                let first = text.lines().next().unwrap_or("");
                write!(f, "literal `{}` ({} lines)", first, text.lines().count())
            }
            SearchSpec::Pattern {
                start_token,
                end_delimiter,
            } => write!(f, "pattern `{}` .. `{}`", start_token, end_delimiter),
        }
    }
}
