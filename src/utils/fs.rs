use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::{DecodePolicy, WriteMode};
use crate::error::{map_io_err, with_file_context, BlockfixError, BlockfixResult};

/// Text loaded from disk together with what is needed to write it back safely
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// Decoded content
    pub content: String,
    /// Bytes exactly as read
    pub raw: Vec<u8>,
    /// SHA-256 of `raw`
    pub hash: String,
    /// Number of invalid UTF-8 sequences replaced or dropped while decoding
    pub repaired: usize,
}

/// Decode bytes as UTF-8 under the given policy.
///
/// Returns the text and the number of invalid sequences that were repaired.
/// Under `Strict` any invalid sequence is an error carrying its byte offset.
pub fn decode_bytes(
    bytes: &[u8],
    policy: DecodePolicy,
    path: &Path,
) -> BlockfixResult<(String, usize)> {
    if policy == DecodePolicy::Strict {
        return match std::str::from_utf8(bytes) {
            Ok(text) => Ok((text.to_owned(), 0)),
            Err(e) => Err(BlockfixError::encoding_error(path, e.valid_up_to())),
        };
    }

    let mut text = String::with_capacity(bytes.len());
    let mut repaired = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            repaired += 1;
            if policy == DecodePolicy::Replace {
                text.push(char::REPLACEMENT_CHARACTER);
            }
        }
    }

    Ok((text, repaired))
}

/// Read a file's contents, decoding with `policy`
pub fn read_file(path: impl AsRef<Path>, policy: DecodePolicy) -> BlockfixResult<LoadedFile> {
    let path = path.as_ref();
    debug!("Reading file: {}", path.display());

    // Handle is released at the end of this block on every path
    let raw = with_file_context(
        || {
            let mut file = File::open(path)?;
            let mut raw = Vec::new();
            file.read_to_end(&mut raw)?;
            Ok(raw)
        },
        path,
    )?;

    let (content, repaired) = decode_bytes(&raw, policy, path)?;
    if policy.is_lossy() && repaired > 0 {
        warn!(
            "Repaired {} invalid UTF-8 sequence(s) in {} ({:?}); a rewrite will persist the change",
            repaired,
            path.display(),
            policy
        );
    }

    Ok(LoadedFile {
        content,
        hash: calculate_hash(&raw),
        raw,
        repaired,
    })
}

/// Write string content to a file as UTF-8
pub fn write_file(path: impl AsRef<Path>, content: &str, mode: WriteMode) -> BlockfixResult<()> {
    let path = path.as_ref();
    debug!("Writing file ({:?}): {}", mode, path.display());

    match mode {
        WriteMode::InPlace => {
            let mut file = File::create(path).map_err(map_io_err(path))?;
            file.write_all(content.as_bytes()).map_err(map_io_err(path))?;
            file.sync_all().map_err(map_io_err(path))?;
        }
        WriteMode::Atomic => write_atomic(path, content.as_bytes())?,
    }

    Ok(())
}

/// Write through a sibling temporary file renamed over `path`
fn write_atomic(path: &Path, data: &[u8]) -> BlockfixResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut tmp = NamedTempFile::new_in(dir).map_err(map_io_err(dir))?;
    tmp.write_all(data).map_err(map_io_err(tmp.path()))?;
    tmp.as_file().sync_all().map_err(map_io_err(tmp.path()))?;

    if let Some(permissions) = permissions {
        fs::set_permissions(tmp.path(), permissions).map_err(map_io_err(tmp.path()))?;
    }

    // A failed persist drops the temporary file and leaves the original intact
    tmp.persist(path).map_err(|e| map_io_err(path)(e.error))?;
    Ok(())
}

/// Copy `raw` to `<path>.bak` and return the backup path
pub fn write_backup(path: impl AsRef<Path>, raw: &[u8]) -> BlockfixResult<PathBuf> {
    let backup = backup_path(path.as_ref());
    fs::write(&backup, raw).map_err(map_io_err(&backup))?;
    debug!("Backup written: {}", backup.display());
    Ok(backup)
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Calculate a SHA-256 hash for raw bytes
pub fn calculate_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Hash the current on-disk bytes of a file
pub fn file_hash(path: impl AsRef<Path>) -> BlockfixResult<String> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(map_io_err(path))?;
    Ok(calculate_hash(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BROKEN: &[u8] = b"let a = 1;\xff\xfe\nlet b = '\xe2\x82';\n";

    #[test]
    fn test_strict_decode_reports_offset() {
        let err = decode_bytes(BROKEN, DecodePolicy::Strict, Path::new("a.js")).unwrap_err();
        match err {
            BlockfixError::Encoding { offset, .. } => assert_eq!(offset, 10),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lossy_decode_policies() {
        // \xff and \xfe are separate invalid bytes; \xe2\x82 is one truncated sequence
        let (replaced, count) =
            decode_bytes(BROKEN, DecodePolicy::Replace, Path::new("a.js")).unwrap();
        assert_eq!(replaced, "let a = 1;\u{FFFD}\u{FFFD}\nlet b = '\u{FFFD}';\n");
        assert_eq!(count, 3);

        let (dropped, count) = decode_bytes(BROKEN, DecodePolicy::Drop, Path::new("a.js")).unwrap();
        assert_eq!(dropped, "let a = 1;\nlet b = '';\n");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_valid_utf8_is_untouched() {
        let text = "// 경로 단순화\nconst x = 1;\n";
        for policy in [DecodePolicy::Strict, DecodePolicy::Replace, DecodePolicy::Drop] {
            let (decoded, count) = decode_bytes(text.as_bytes(), policy, Path::new("a.js")).unwrap();
            assert_eq!(decoded, text);
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_file(dir.path().join("missing.js"), DecodePolicy::Strict).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_write_modes_produce_identical_bytes() {
        let dir = tempdir().unwrap();
        let content = "    toPathString(path) {\n        return '';\n    }\r\n// 끝\n";

        let atomic = dir.path().join("atomic.js");
        let in_place = dir.path().join("in_place.js");
        fs::write(&atomic, "old").unwrap();
        fs::write(&in_place, "old content that is longer than the new one......").unwrap();

        write_file(&atomic, content, WriteMode::Atomic).unwrap();
        write_file(&in_place, content, WriteMode::InPlace).unwrap();

        assert_eq!(fs::read(&atomic).unwrap(), content.as_bytes());
        assert_eq!(fs::read(&in_place).unwrap(), content.as_bytes());

        let reread = read_file(&atomic, DecodePolicy::Strict).unwrap();
        assert_eq!(reread.content, content);
        assert_eq!(reread.hash, calculate_hash(content.as_bytes()));

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("script.sh");
        fs::write(&path, "echo old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o751)).unwrap();

        write_file(&path, "echo new", WriteMode::Atomic).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o751);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_keeps_os_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner.js"), "x").unwrap();

        let err = write_file(&target, "new", WriteMode::Atomic).unwrap_err();
        match err {
            BlockfixError::Io { source, path } => {
                assert!(source.raw_os_error().is_some());
                assert_ne!(source.kind(), std::io::ErrorKind::Other);
                assert_eq!(path, Some(target.clone()));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(target.join("inner.js").exists());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_backup_holds_original_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("WireManager.js");
        fs::write(&path, BROKEN).unwrap();

        let backup = write_backup(&path, BROKEN).unwrap();
        assert_eq!(backup, dir.path().join("WireManager.js.bak"));
        assert_eq!(fs::read(&backup).unwrap(), BROKEN);
        assert_eq!(file_hash(&backup).unwrap(), calculate_hash(BROKEN));
    }
}
