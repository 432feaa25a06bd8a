//! Crash-safe file replacement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Replace the contents of `path` with `bytes`.
///
/// The data is written to a sibling `<name>.tmp` file, flushed to disk, and
/// then renamed over the target, so a crash leaves either the old document or
/// the new one, never a half-written file. Missing parent directories are
/// created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    replace(path, bytes, false)
}

/// Like [`write_atomic`], but the file is readable by its owner only.
///
/// On Unix the temporary file is created with mode 0600, so the data is
/// never visible to other users, not even between write and rename. A stale
/// temporary file from an earlier run is removed first rather than reused
/// with its old permissions.
pub fn write_atomic_private(path: &Path, bytes: &[u8]) -> Result<()> {
    replace(path, bytes, true)
}

fn replace(path: &Path, bytes: &[u8], private: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_sibling(path);

    if private {
        match fs::remove_file(&tmp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    let written = (|| -> std::io::Result<()> {
        let mut file = open_temp(&tmp_path, private)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = written.and_then(|()| fs::rename(&tmp_path, path)) {
        // Only clean up a file this call may have created.
        if fs::metadata(&tmp_path).is_ok_and(|m| m.is_file()) {
            let _ = fs::remove_file(&tmp_path);
        }
        return Err(e.into());
    }

    tracing::trace!(path = %path.display(), len = bytes.len(), private, "replaced file");
    Ok(())
}

fn open_temp(tmp_path: &Path, private: bool) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600).create_new(true);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    options.open(tmp_path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
