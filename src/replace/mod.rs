//! Block replacement over a single file.
//!
//! A block is located either by exact text or by a line-spanning pattern and
//! swapped for a corrected version. Once the replacement no longer matches the
//! search spec, running the same job again is a no-op.
//!
//! There is no file locking: two runs against the same path at the same time
//! race on the read-modify-write. `ReplaceOptions::verify_unchanged` detects a
//! change made between our read and our write but cannot prevent one.
//!
//! Search and replacement text follow the line ending of the file's first
//! line, so LF snippets still match and splice cleanly into CRLF files.

pub mod search;

pub use search::{SearchMode, SearchSpec};

use regex::NoExpand;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ReplaceOptions;
use crate::diff::{change_counts, unified_diff};
use crate::error::{BlockfixError, BlockfixResult};
use crate::utils::fs::{file_hash, read_file, write_backup, write_file};

/// Whether the block was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Replaced { replacements: usize },
    NotFound,
}

impl Outcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Outcome::Replaced { .. })
    }
}

/// Result of a file-level replacement
#[derive(Debug, Clone)]
pub struct ReplaceReport {
    pub path: PathBuf,
    pub mode: SearchMode,
    pub outcome: Outcome,
    /// Invalid UTF-8 sequences repaired on read
    pub repaired: usize,
    pub dry_run: bool,
    pub backup: Option<PathBuf>,
    /// Unified diff, only for dry runs that found the block
    pub diff: Option<String>,
}

impl ReplaceReport {
    /// The single line printed for this run
    pub fn status_line(&self) -> &'static str {
        match (self.outcome, self.mode) {
            (Outcome::Replaced { .. }, _) if self.dry_run => {
                "Dry run: indentation would be corrected."
            }
            (Outcome::Replaced { .. }, SearchMode::Literal) => "Successfully corrected indentation.",
            (Outcome::Replaced { .. }, SearchMode::Pattern) => {
                "Successfully corrected indentation with regex."
            }
            (Outcome::NotFound, SearchMode::Literal) => "Target string not found in content.",
            (Outcome::NotFound, SearchMode::Pattern) => "Pattern not found.",
        }
    }
}

/// Apply `search` -> `replacement` to in-memory content.
///
/// Literal mode replaces the first occurrence, pattern mode every match.
/// The replacement is inserted verbatim apart from its line endings, which
/// follow the content's; `$` is never expanded.
pub fn replace_in_content(
    content: &str,
    search: &SearchSpec,
    replacement: &str,
) -> BlockfixResult<(String, Outcome)> {
    search.validate()?;

    let crlf = uses_crlf(content);
    let search = match search {
        SearchSpec::Literal { text } if crlf => {
            Cow::Owned(SearchSpec::literal(to_line_ending(text, crlf)))
        }
        _ => Cow::Borrowed(search),
    };
    let replacement = to_line_ending(replacement, crlf);
    let replacement: &str = &replacement;
    let search: &SearchSpec = &search;
    let regex = search.compile()?;

    match (search, regex) {
        (_, Some(re)) => {
            let replacements = re.find_iter(content).count();
            if replacements == 0 {
                return Ok((content.to_string(), Outcome::NotFound));
            }

            debug!("Pattern {} matched {} block(s)", search, replacements);
            let new_content = re.replace_all(content, NoExpand(replacement)).into_owned();
            Ok((new_content, Outcome::Replaced { replacements }))
        }
        (SearchSpec::Literal { text }, None) => {
            let occurrences = content.matches(text.as_str()).count();
            if occurrences == 0 {
                return Ok((content.to_string(), Outcome::NotFound));
            }
            if occurrences > 1 {
                warn!(
                    "Target occurs {} times; only the first occurrence is replaced",
                    occurrences
                );
            }

            let new_content = content.replacen(text.as_str(), replacement, 1);
            Ok((new_content, Outcome::Replaced { replacements: 1 }))
        }
        (SearchSpec::Pattern { .. }, None) => Err(BlockfixError::invalid_pattern(
            "pattern spec compiled to no regex",
        )),
    }
}

/// Whether the first line of `content` ends in `\r\n`
fn uses_crlf(content: &str) -> bool {
    content
        .find('\n')
        .map_or(false, |i| content[..i].ends_with('\r'))
}

/// Rewrite every line terminator in `text` as `\r\n` or `\n`
fn to_line_ending(text: &str, crlf: bool) -> Cow<'_, str> {
    let normalized = if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    };

    if crlf && normalized.contains('\n') {
        Cow::Owned(normalized.replace('\n', "\r\n"))
    } else {
        normalized
    }
}

/// Replace a block inside the file at `path`.
///
/// I/O and encoding failures propagate; a missing block is
/// `Outcome::NotFound` and leaves the file untouched.
pub fn replace_block(
    path: impl AsRef<Path>,
    search: &SearchSpec,
    replacement: &str,
    options: &ReplaceOptions,
) -> BlockfixResult<ReplaceReport> {
    let path = path.as_ref();
    search.validate()?;
    debug!("Searching {} for {}", path.display(), search);

    let loaded = read_file(path, options.decode)?;
    let (new_content, outcome) = replace_in_content(&loaded.content, search, replacement)?;

    let mut report = ReplaceReport {
        path: path.to_path_buf(),
        mode: search.mode(),
        outcome,
        repaired: loaded.repaired,
        dry_run: options.dry_run,
        backup: None,
        diff: None,
    };

    if !outcome.is_replaced() {
        info!("No match for {} in {}", search, path.display());
        return Ok(report);
    }

    if options.dry_run {
        report.diff = Some(unified_diff(&loaded.content, &new_content, path));
        return Ok(report);
    }

    if options.verify_unchanged && file_hash(path)? != loaded.hash {
        warn!("File changed on disk since it was read: {}", path.display());
        return Err(BlockfixError::concurrent_modification(path));
    }

    if options.backup {
        report.backup = Some(write_backup(path, &loaded.raw)?);
    }

    write_file(path, &new_content, options.write)?;

    let (inserted, deleted) = change_counts(&loaded.content, &new_content);
    info!(
        "Rewrote {} (+{} -{} lines, {:?})",
        path.display(),
        inserted,
        deleted,
        outcome
    );

    Ok(report)
}
