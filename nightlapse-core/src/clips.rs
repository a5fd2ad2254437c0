use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::debug;

use crate::util::to_absolute_path;

/// Ordered set of snapshot clips for one camera directory and one
/// processing date.
///
/// Clips are sorted lexicographically by file name, so partitioning the
/// set into chunks is reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipSet {
    clips: Vec<PathBuf>,
}

impl ClipSet {
    /// Enumerates the clips with the given extension directly under
    /// `source_dir`, as absolute paths in file-name order.
    ///
    /// A missing source directory yields an empty set rather than an
    /// error; cameras that were offline for a day simply have no
    /// directory for it.
    #[inline]
    pub fn from_dir(source_dir: &Path, extension: &str) -> Result<Self> {
        if !source_dir.is_dir() {
            debug!("Clip directory {} does not exist", source_dir.display());
            return Ok(Self::default());
        }

        let entries = fs::read_dir(source_dir)
            .with_context(|| format!("Failed to read clip directory {}", source_dir.display()))?;

        let mut clips = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                clips.push(to_absolute_path(&path)?);
            }
        }

        debug!(
            "Found {} .{} clips in {}",
            clips.len(),
            extension,
            source_dir.display()
        );

        Ok(Self::from_paths(clips))
    }

    /// Builds a set from already-known paths, restoring file-name order.
    #[inline]
    pub fn from_paths(clips: Vec<PathBuf>) -> Self {
        let clips = clips
            .into_iter()
            .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
            .collect();

        Self { clips }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.clips
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).expect("created file");
    }

    #[test]
    fn enumeration_is_sorted_and_filtered() {
        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "0300.mp4");
        touch(temp.path(), "0100.mp4");
        touch(temp.path(), "0200.mp4");
        touch(temp.path(), "notes.txt");

        let set = ClipSet::from_dir(temp.path(), "mp4").expect("enumerated");
        let names: Vec<_> = set
            .as_slice()
            .iter()
            .map(|p| p.file_name().expect("file name").to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["0100.mp4", "0200.mp4", "0300.mp4"]);
        assert!(set.as_slice().iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "a.MP4");
        touch(temp.path(), "b.mp4");

        let set = ClipSet::from_dir(temp.path(), "mp4").expect("enumerated");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn missing_directory_is_empty_not_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let gone = temp.path().join("20260101");

        let set = ClipSet::from_dir(&gone, "mp4").expect("enumerated");
        assert!(set.is_empty());
    }

    #[test]
    fn subdirectories_are_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("nested.mp4")).expect("subdir");
        touch(temp.path(), "a.mp4");

        let set = ClipSet::from_dir(temp.path(), "mp4").expect("enumerated");
        assert_eq!(set.len(), 1);
    }
}
