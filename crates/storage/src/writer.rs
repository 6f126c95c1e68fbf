//! Durable writer (spec §4.B): atomic full-file writes and fsync'd appends.

use kgraph_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Atomically writes `bytes` to `path`.
///
/// Writes to `<path>.tmp.<pid>`, fsyncs, then renames over `path`. If the
/// rename fails (some platforms refuse to replace a locked target), falls
/// back to opening `path` directly for write + fsync, then unlinking the
/// temp file. A failure before the rename/fallback-write completes leaves
/// the prior file untouched.
pub fn full_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let pid = std::process::id();
    let tmp_path = path.with_extension(format!(
        "tmp.{pid}.{}",
        path.extension().and_then(|e| e.to_str()).unwrap_or("jsonl")
    ));

    let write_result = (|| -> std::io::Result<()> {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        drop(tmp);
        std::fs::rename(&tmp_path, path)
    })();

    match write_result {
        Ok(()) => Ok(()),
        Err(_rename_err) => {
            // Fall back: write the target directly.
            let fallback = (|| -> std::io::Result<()> {
                let mut f = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                f.write_all(bytes)?;
                f.sync_all()?;
                let _ = std::fs::remove_file(&tmp_path);
                Ok(())
            })();
            fallback.map_err(|e| Error::storage_write(format!("full write failed: {e}")))
        }
    }
}

/// Appends `bytes` to `path`, prefixing with a newline if the file is
/// already non-empty, then fsyncs. On success the log grows by exactly one
/// well-formed line; on I/O failure the caller should surface the error
/// without touching cache/indexes (spec §4.C failure semantics).
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let existing_len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let mut f = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| Error::storage_write(format!("open for append failed: {e}")))?;

    let mut buf = String::new();
    if existing_len > 0 {
        buf.push('\n');
    }
    buf.push_str(line);

    f.write_all(buf.as_bytes())
        .map_err(|e| Error::storage_write(format!("append write failed: {e}")))?;
    f.sync_all()
        .map_err(|e| Error::storage_write(format!("append fsync failed: {e}")))?;
    Ok(())
}

/// Reads the whole file into a string. Missing file yields an empty string
/// (spec §4.C "missing file => empty view").
pub fn read_to_string_tolerant(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    let mut f = File::open(path).map_err(|e| Error::storage_read(format!("open failed: {e}")))?;
    let mut s = String::new();
    f.read_to_string(&mut s)
        .map_err(|e| Error::storage_read(format!("read failed: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn full_write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        full_write(&path, b"hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn full_write_replaces_prior_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        full_write(&path, b"first\n").unwrap();
        full_write(&path, b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn append_line_prefixes_newline_when_nonempty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        append_line(&path, "one").unwrap();
        append_line(&path, "two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo");
    }

    #[test]
    fn append_line_on_missing_file_creates_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.jsonl");
        append_line(&path, "first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn read_missing_file_is_empty_not_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.jsonl");
        assert_eq!(read_to_string_tolerant(&path).unwrap(), "");
    }
}
