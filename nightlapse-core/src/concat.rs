use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    ffmpeg::{self, FFmpegError},
    transcode::ChunkArtifact,
};

/// Ephemeral input list for the ffmpeg concat demuxer.
///
/// One `file '<absolute-path>'` line per input, in the order they are to
/// be concatenated. The file is written on construction and removed when
/// the value is dropped, so a manifest cannot outlive the invocation it
/// was built for, even when that invocation errors out.
#[derive(Debug)]
pub struct ConcatManifest {
    path: PathBuf,
}

impl ConcatManifest {
    /// Writes the manifest for `inputs` to `path`.
    #[inline]
    pub fn create(path: &Path, inputs: &[PathBuf]) -> io::Result<Self> {
        let mut contents = String::with_capacity(inputs.len() * 32);
        for input in inputs {
            // The concat demuxer reads single-quoted paths; embedded
            // quotes close the string, escape, and reopen it.
            let escaped = input.display().to_string().replace('\'', r"'\''");
            contents.push_str("file '");
            contents.push_str(&escaped);
            contents.push_str("'\n");
        }
        fs::write(path, contents)?;
        debug!("Wrote concat manifest {} ({} inputs)", path.display(), inputs.len());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConcatManifest {
    #[inline]
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove concat manifest {}: {e}", self.path.display());
        }
    }
}

#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("failed to write merge manifest: {0}")]
    Manifest(#[from] io::Error),
    #[error(transparent)]
    Tool(#[from] FFmpegError),
}

/// Losslessly concatenates the chunk artifacts, in chunk-index order,
/// into `output`.
///
/// The caller guarantees the artifact list is complete; this stage is
/// never reached when a chunk failed. The merge manifest is removed
/// after the attempt whether it succeeded or not.
#[inline]
pub fn merge_artifacts(
    artifacts: &[ChunkArtifact],
    manifest_path: &Path,
    output: &Path,
) -> Result<(), ConcatError> {
    debug_assert!(artifacts.iter().enumerate().all(|(i, artifact)| artifact.index == i));

    let inputs: Vec<PathBuf> = artifacts.iter().map(|artifact| artifact.path.clone()).collect();
    let manifest = ConcatManifest::create(manifest_path, &inputs)?;

    ffmpeg::run(ffmpeg::compose_merge_command(manifest.path(), output))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_inputs_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("00000.txt");
        let inputs = vec![
            PathBuf::from("/clips/0200.mp4"),
            PathBuf::from("/clips/0100.mp4"),
        ];

        let manifest = ConcatManifest::create(&path, &inputs).expect("written");
        let contents = fs::read_to_string(manifest.path()).expect("read back");

        assert_eq!(contents, "file '/clips/0200.mp4'\nfile '/clips/0100.mp4'\n");
    }

    #[test]
    fn manifest_is_a_pure_function_of_its_inputs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let inputs = vec![PathBuf::from("/clips/a.mp4"), PathBuf::from("/clips/b.mp4")];

        let first = {
            let manifest =
                ConcatManifest::create(&temp.path().join("m1.txt"), &inputs).expect("written");
            fs::read_to_string(manifest.path()).expect("read back")
        };
        let second = {
            let manifest =
                ConcatManifest::create(&temp.path().join("m2.txt"), &inputs).expect("written");
            fs::read_to_string(manifest.path()).expect("read back")
        };

        assert_eq!(first, second);
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("m.txt");
        let inputs = vec![PathBuf::from("/clips/it's here.mp4")];

        let manifest = ConcatManifest::create(&path, &inputs).expect("written");
        let contents = fs::read_to_string(manifest.path()).expect("read back");

        assert_eq!(contents, "file '/clips/it'\\''s here.mp4'\n");
    }

    #[test]
    fn manifest_is_removed_on_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("m.txt");

        {
            let _manifest =
                ConcatManifest::create(&path, &[PathBuf::from("/clips/a.mp4")]).expect("written");
            assert!(path.exists());
        }

        assert!(!path.exists());
    }
}
