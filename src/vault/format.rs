//! JSON document I/O for the secrets file.
//!
//! Documents are written **atomically**:
//!
//! 1. Serialize to pretty-printed JSON.
//! 2. Write to a hidden temp file in the same directory, created
//!    owner-only (0600 on Unix).
//! 3. Rename the temp file over the target path.
//!
//! The rename ensures readers never see a half-written file.  A failure
//! at any step leaves the previous document untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::{LockboxError, Result};

/// Read and parse a JSON document.
///
/// Read failures are `IoAt`; malformed content is `Parse`.  Never
/// returns a partially parsed value.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).map_err(|e| LockboxError::io_at(path, e))?;
    parse_document(path, &data)
}

/// Parse bytes that were read from `path` (used in error messages).
pub fn parse_document<T: DeserializeOwned>(path: &Path, data: &[u8]) -> Result<T> {
    serde_json::from_slice(data)
        .map_err(|e| LockboxError::Parse(format!("{}: {e}", path.display())))
}

/// Serialize `doc` and replace the file at `path` atomically.
///
/// The parent directory must already exist.
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let buf = serde_json::to_vec_pretty(doc)
        .map_err(|e| LockboxError::Serialization(format!("{}: {e}", path.display())))?;

    let tmp_path = temp_path_for(path);

    if let Err(e) = write_private(&tmp_path, &buf) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(LockboxError::io_at(path, e));
    }

    debug!(path = %path.display(), bytes = buf.len(), "document written");
    Ok(())
}

/// `<dir>/.<file_name>.tmp`, next to the target so the rename stays on
/// one filesystem.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Create `path` owner-only from the start and write `buf` into it.
///
/// A leftover temp file from an interrupted write is removed first;
/// anything else in the way (a directory, say) is an error.
fn write_private(path: &Path, buf: &[u8]) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path).map_err(|e| LockboxError::io_at(path, e))?;
    }

    #[cfg(unix)]
    let mut file = {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| LockboxError::io_at(path, e))?
    };

    #[cfg(not(unix))]
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| LockboxError::io_at(path, e))?;

    file.write_all(buf)
        .and_then(|()| file.sync_all())
        .map_err(|e| LockboxError::io_at(path, e))
}
