use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::{
    broker::Broker,
    chunk::{self, Chunk},
    cleanup,
    clips::ClipSet,
    concat::{self, ConcatError},
    ffmpeg,
    settings::{self, CameraMap, IoSettings, SpeedupSettings},
    transcode::{ChunkArtifact, ChunkJob, TranscodeError, OUTPUT_EXTENSION},
    util,
};

/// Orchestrates the per-camera pipeline: enumerate, partition, transcode
/// chunks in parallel, merge, clean up.
#[derive(Debug)]
pub struct TimelapseContext {
    pub io:      IoSettings,
    pub speedup: SpeedupSettings,
    pub cameras: CameraMap,
    pub date:    NaiveDate,
}

/// Result of one camera's run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimelapseOutcome {
    /// No clips were found for the camera and date; informational, not
    /// an error.
    NoClips,
    Created {
        artifact: PathBuf,
        clips:    usize,
        chunks:   usize,
    },
}

impl TimelapseContext {
    #[inline]
    pub fn new(
        io: IoSettings,
        speedup: SpeedupSettings,
        cameras: CameraMap,
        date: NaiveDate,
    ) -> Result<Self> {
        let this = Self {
            io,
            speedup,
            cameras,
            date,
        };
        this.validate()?;

        Ok(this)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.speedup.speed_factor > 0.0,
            "speed factor must be positive, got {}",
            self.speedup.speed_factor
        );
        ensure!(!self.cameras.directories.is_empty(), "no camera directories configured");
        ffmpeg::validate_installed()?;

        Ok(())
    }

    /// Full pipeline for one camera directory.
    ///
    /// Intermediates are removed on every exit path; a partial output
    /// left behind by a failed merge is removed as well, since it is
    /// not a valid artifact.
    #[inline]
    pub fn create_timelapse(&self, camera: &str) -> Result<TimelapseOutcome> {
        self.create_timelapse_with(camera, ChunkJob::transcode, concat::merge_artifacts)
    }

    pub(crate) fn create_timelapse_with<R, M>(
        &self,
        camera: &str,
        run_job: R,
        merge: M,
    ) -> Result<TimelapseOutcome>
    where
        R: Fn(&ChunkJob) -> Result<ChunkArtifact, TranscodeError> + Sync,
        M: FnOnce(&[ChunkArtifact], &Path, &Path) -> Result<(), ConcatError>,
    {
        let date_key = settings::date_key(self.date);
        let label = self.cameras.label_for(camera);
        let source_dir = self.io.source_root.join(camera).join(&date_key);

        let clips = ClipSet::from_dir(&source_dir, &self.io.clip_extension)?;
        if clips.is_empty() {
            info!(
                "No .{} clips in {}; nothing to process",
                self.io.clip_extension,
                source_dir.display()
            );
            return Ok(TimelapseOutcome::NoClips);
        }

        let workers = match self.speedup.workers {
            0 => chunk::available_workers(),
            workers => workers,
        };
        let chunks = chunk::partition(&clips, workers);
        let chunk_count = chunks.len();

        // Manifests must list absolute paths for the concat demuxer, so
        // anchor the scratch and output locations up front.
        let scratch_dir =
            util::to_absolute_path(&self.io.scratch_dir.join(format!("{label}_{date_key}")))?;
        util::ensure_dir(&scratch_dir)?;
        util::ensure_dir(&self.io.output_dir)?;
        let output = util::to_absolute_path(
            &self.io.output_dir.join(format!("timelapse_{label}_{date_key}.{OUTPUT_EXTENSION}")),
        )?;

        info!(
            "{label}: {} clips -> {} chunks at {}x with {} workers",
            clips.len(),
            chunk_count,
            self.speedup.speed_factor,
            workers
        );

        let result = self.run_pipeline(chunks, &scratch_dir, &output, workers, run_job, merge);

        cleanup::remove_run_scratch(&scratch_dir);
        if result.is_err() {
            cleanup::remove_file_quietly(&output);
        }

        result.map(|()| TimelapseOutcome::Created {
            artifact: output,
            clips:    clips.len(),
            chunks:   chunk_count,
        })
    }

    fn run_pipeline<R, M>(
        &self,
        chunks: Vec<Chunk>,
        scratch_dir: &Path,
        output: &Path,
        workers: usize,
        run_job: R,
        merge: M,
    ) -> Result<()>
    where
        R: Fn(&ChunkJob) -> Result<ChunkArtifact, TranscodeError> + Sync,
        M: FnOnce(&[ChunkArtifact], &Path, &Path) -> Result<(), ConcatError>,
    {
        let jobs = chunks
            .into_iter()
            .map(|chunk| {
                ChunkJob::new(
                    chunk,
                    scratch_dir,
                    self.speedup.speed_factor,
                    self.speedup.profile.clone(),
                )
            })
            .collect();

        let broker = Broker {
            jobs,
            workers,
        };
        // The merge stage is only reached with the full artifact set;
        // any chunk failure surfaces here first.
        let artifacts = broker.run_with(run_job)?;

        merge(&artifacts, &scratch_dir.join("merge.txt"), output)?;
        info!("Time-lapse saved as {}", output.display());

        Ok(())
    }
}
