//! Filesystem helpers shared by the assembler, the article renderer and the
//! feed generators.

use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::Path,
    time::SystemTime,
};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Recursively copy `src` into `dst`, creating `dst` and any missing parents.
///
/// Returns the number of files copied.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        // strip_prefix cannot fail: every entry lives under `src`
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    create_parent(dst)?;
    fs::copy(src, dst)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    create_parent(path)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `contents` to `path` so readers never observe a partial file: the
/// bytes go to a temporary file in the same directory which is then renamed
/// over the target.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let parent = create_parent(path)?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents.as_ref())?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Remove `dir` if it exists and create it again, empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to clear directory {}", dir.display()));
        }
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))
}

/// Last modification time of `path`.
pub fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))
}

fn create_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    Ok(parent)
}
