use std::path::PathBuf;
use thiserror::Error;

/// Main error type for blockfix
#[derive(Error, Debug)]
pub enum BlockfixError {
    #[error("IO error: {source}{}", display_path(.path))]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    #[error("Invalid UTF-8 in {path} at byte {offset}")]
    Encoding { path: PathBuf, offset: usize },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid pattern: {message}")]
    InvalidPattern { message: String },

    #[error("File {path} was modified after it was read")]
    ConcurrentModification { path: PathBuf },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" (path: {})", path.display()),
        None => String::new(),
    }
}

impl BlockfixError {
    /// Create a new IO error with path context
    pub fn io_error(err: std::io::Error, path: Option<impl Into<PathBuf>>) -> Self {
        Self::Io {
            source: err,
            path: path.map(|p| p.into()),
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, offset: usize) -> Self {
        Self::Encoding {
            path: path.into(),
            offset,
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }

    pub fn concurrent_modification(path: impl Into<PathBuf>) -> Self {
        Self::ConcurrentModification { path: path.into() }
    }

    pub fn unknown_preset(name: impl Into<String>) -> Self {
        Self::UnknownPreset { name: name.into() }
    }

    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Whether the error came from the file system rather than from the input
    pub fn is_io(&self) -> bool {
        matches!(self, BlockfixError::Io { .. })
    }
}

impl From<std::io::Error> for BlockfixError {
    fn from(error: std::io::Error) -> Self {
        BlockfixError::io_error(error, None::<PathBuf>)
    }
}

impl From<regex::Error> for BlockfixError {
    fn from(error: regex::Error) -> Self {
        BlockfixError::invalid_pattern(error.to_string())
    }
}

impl From<serde_json::Error> for BlockfixError {
    fn from(error: serde_json::Error) -> Self {
        BlockfixError::parse_error(error.to_string())
    }
}

impl From<serde_yaml::Error> for BlockfixError {
    fn from(error: serde_yaml::Error) -> Self {
        BlockfixError::parse_error(error.to_string())
    }
}

impl From<toml::de::Error> for BlockfixError {
    fn from(error: toml::de::Error) -> Self {
        BlockfixError::parse_error(error.to_string())
    }
}

impl From<toml::ser::Error> for BlockfixError {
    fn from(error: toml::ser::Error) -> Self {
        BlockfixError::parse_error(error.to_string())
    }
}

/// Result type alias using BlockfixError
pub type BlockfixResult<T> = Result<T, BlockfixError>;

/// Contextual error mapping function
pub fn map_io_err<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> BlockfixError {
    let path = path.into();
    move |err| BlockfixError::io_error(err, Some(path))
}

/// Handle file operations with proper context
pub fn with_file_context<T>(
    operation: impl FnOnce() -> Result<T, std::io::Error>,
    path: impl AsRef<std::path::Path>,
) -> BlockfixResult<T> {
    operation().map_err(|e| BlockfixError::io_error(e, Some(path.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = BlockfixError::io_error(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            Some("js/modules/WireManager.js"),
        );
        let message = err.to_string();
        assert!(message.contains("missing"));
        assert!(message.contains("WireManager.js"));
        assert!(err.is_io());
    }

    #[test]
    fn test_regex_error_becomes_invalid_pattern() {
        let err: BlockfixError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, BlockfixError::InvalidPattern { .. }));
        assert!(!err.is_io());
    }
}
