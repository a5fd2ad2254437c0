use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use path_abs::PathAbs;

/// Normalizes `path` to an absolute path. The path does not have to exist
/// yet; relative components are resolved against the current directory.
#[inline]
pub fn to_absolute_path(path: &Path) -> io::Result<PathBuf> {
    let abs_path = PathAbs::new(path)?.as_path().to_path_buf();

    Ok(abs_path)
}

/// Creates `dir` and any missing parent directories.
#[inline]
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}
