//! Atomic file operations
//!
//! Whole-file writes go through a sibling `.tmp` file that is fsync'd before
//! it is moved into place, so a reader only ever sees the old contents or the
//! new contents.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Atomically replace `path` with `content`
///
/// # Example
///
/// ```ignore
/// atomic_write("data/sequence", "42")?;
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    write_synced(&temp_path, content.as_bytes())?;
    fs::rename(&temp_path, path)
}

/// Atomically create `path` with `content`, refusing to replace an existing file
///
/// Fails with [`io::ErrorKind::AlreadyExists`] when the destination is present.
/// The file is linked into place, so the check and the publish are one step.
pub fn atomic_create<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    write_synced(&temp_path, content.as_bytes())?;
    let linked = fs::hard_link(&temp_path, path);
    // The temp file is garbage either way
    let _ = fs::remove_file(&temp_path);
    linked
}

/// Remove `.tmp` leftovers from interrupted writes in `dir`
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
