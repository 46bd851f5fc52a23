//! Crash-safe file replacement.
//!
//! Content goes to a temp file in the target's directory, is synced, then
//! renamed over the target. Readers see either the old or the new file,
//! never a partial one.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Replace `path` with `content`.
///
/// With `mode: Some(m)` the file gets exactly `m`; with `None` an existing
/// file keeps its permissions and a new one gets `0o644`. Modes are ignored
/// off unix.
///
/// # Errors
///
/// Returns the underlying I/O error so callers can classify it (e.g.
/// `PermissionDenied`).
pub fn write_atomic(path: &Path, content: &[u8], mode: Option<u32>) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    #[cfg(unix)]
    let permissions = {
        use std::os::unix::fs::PermissionsExt;
        let mode = match (mode, std::fs::metadata(path)) {
            (Some(m), _) => m,
            (None, Ok(meta)) => meta.permissions().mode(),
            (None, Err(_)) => 0o644,
        };
        std::fs::Permissions::from_mode(mode)
    };
    #[cfg(not(unix))]
    let _ = mode;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a file, treating "does not exist" as empty.
///
/// # Errors
///
/// Any I/O error other than `NotFound`.
pub fn read_or_empty(path: &Path) -> io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}
