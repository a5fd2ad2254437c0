use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    chunk::Chunk,
    concat::ConcatManifest,
    ffmpeg::{self, EncodeProfile, FFmpegError},
};

/// Container extension for chunk artifacts and the final output.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// One chunk bound to its manifest path, output path, and speed factor.
///
/// A job is owned by exactly one worker for its duration; its file names
/// embed the chunk index, so concurrent jobs never collide on disk.
#[derive(Debug, Clone)]
pub struct ChunkJob {
    pub chunk:         Chunk,
    pub manifest_path: PathBuf,
    pub output_path:   PathBuf,
    pub speed_factor:  f64,
    pub profile:       EncodeProfile,
}

/// A transcoded chunk plus its originating index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkArtifact {
    pub index: usize,
    pub path:  PathBuf,
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to write chunk manifest: {0}")]
    Manifest(#[from] io::Error),
    #[error(transparent)]
    Tool(#[from] FFmpegError),
}

impl ChunkJob {
    /// Lays out a job for `chunk` inside `scratch_dir`.
    #[inline]
    pub fn new(
        chunk: Chunk,
        scratch_dir: &Path,
        speed_factor: f64,
        profile: EncodeProfile,
    ) -> Self {
        let manifest_path = scratch_dir.join(format!("{:05}.txt", chunk.index));
        let output_path = scratch_dir.join(format!("{:05}.{OUTPUT_EXTENSION}", chunk.index));

        Self {
            chunk,
            manifest_path,
            output_path,
            speed_factor,
            profile,
        }
    }

    /// Concatenates and accelerates this chunk into one sub-clip.
    ///
    /// The manifest is removed before returning, on success and failure
    /// alike. A non-zero ffmpeg exit fails only this chunk; the caller
    /// decides what that means for the run.
    #[inline]
    pub fn transcode(&self) -> Result<ChunkArtifact, TranscodeError> {
        let manifest = ConcatManifest::create(&self.manifest_path, &self.chunk.clips)?;
        debug!(
            "Transcoding chunk {} ({} clips) at {}x",
            self.chunk.index,
            self.chunk.clips.len(),
            self.speed_factor
        );

        ffmpeg::run(ffmpeg::compose_chunk_command(
            manifest.path(),
            &self.output_path,
            self.speed_factor,
            &self.profile,
        ))?;

        Ok(ChunkArtifact {
            index: self.chunk.index,
            path:  self.output_path.clone(),
        })
    }
}
