use std::{collections::BTreeMap, thread};

use thiserror::Error;
use tracing::{debug, error};

use crate::transcode::{ChunkArtifact, ChunkJob, TranscodeError};

/// Dispatches chunk jobs across a bounded worker pool and collects the
/// results in chunk-index order.
///
/// Dispatch is fire-and-collect: every job is queued up front, workers
/// drain the queue, and the coordinator blocks until all jobs have
/// settled. A failing chunk does not cancel its in-flight siblings;
/// letting them finish keeps the on-disk state consistent for cleanup.
pub struct Broker {
    pub jobs:    Vec<ChunkJob>,
    pub workers: usize,
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to transcode chunk {index}: {source}")]
    ChunkFailed {
        index:  usize,
        source: TranscodeError,
    },
}

impl Broker {
    /// Runs every job through the external transcoder.
    #[inline]
    pub fn run(self) -> Result<Vec<ChunkArtifact>, BrokerError> {
        self.run_with(ChunkJob::transcode)
    }

    /// Runs every job with `run_job`, returning the artifacts in
    /// chunk-index order, or the failure with the lowest chunk index
    /// once all jobs have settled.
    pub(crate) fn run_with<F>(self, run_job: F) -> Result<Vec<ChunkArtifact>, BrokerError>
    where
        F: Fn(&ChunkJob) -> Result<ChunkArtifact, TranscodeError> + Sync,
    {
        if self.jobs.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.workers.clamp(1, self.jobs.len());
        let total = self.jobs.len();
        debug!("Dispatching {total} chunk jobs across {workers} workers");

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<ChunkJob>();
        for job in self.jobs {
            job_tx.send(job).expect("job queue accepts all jobs");
        }
        drop(job_tx);

        let (result_tx, result_rx) =
            crossbeam_channel::unbounded::<(usize, Result<ChunkArtifact, TranscodeError>)>();

        thread::scope(|s| {
            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let run_job = &run_job;

                s.spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let index = job.chunk.index;
                        debug!("Worker {worker_id} picked up chunk {index}");
                        let result = run_job(&job);
                        if let Err(e) = &result {
                            error!("Chunk {index} failed: {e}");
                        }
                        result_tx.send((index, result)).expect("result channel outlives workers");
                    }
                });
            }
        });
        drop(result_tx);

        // All workers have exited; drain whatever settled.
        let mut settled = BTreeMap::new();
        while let Ok((index, result)) = result_rx.recv() {
            settled.insert(index, result);
        }
        debug_assert_eq!(settled.len(), total);

        let mut artifacts = Vec::with_capacity(settled.len());
        for (index, result) in settled {
            match result {
                Ok(artifact) => artifacts.push(artifact),
                Err(source) => {
                    return Err(BrokerError::ChunkFailed {
                        index,
                        source,
                    })
                },
            }
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        io,
        path::{Path, PathBuf},
        time::Duration,
    };

    use super::*;
    use crate::{chunk::Chunk, ffmpeg::EncodeProfile};

    fn jobs(count: usize, scratch: &Path) -> Vec<ChunkJob> {
        (0..count)
            .map(|index| {
                ChunkJob::new(
                    Chunk {
                        index,
                        clips: vec![PathBuf::from(format!("/clips/{index:04}.mp4"))],
                    },
                    scratch,
                    60.0,
                    EncodeProfile::default(),
                )
            })
            .collect()
    }

    fn fake_artifact(job: &ChunkJob) -> ChunkArtifact {
        ChunkArtifact {
            index: job.chunk.index,
            path:  job.output_path.clone(),
        }
    }

    #[test]
    fn artifacts_come_back_in_chunk_order() {
        let broker = Broker {
            jobs:    jobs(6, Path::new("/scratch")),
            workers: 3,
        };

        // Early chunks sleep longest, so completion order inverts
        // submission order.
        let artifacts = broker
            .run_with(|job| {
                std::thread::sleep(Duration::from_millis(30 - 4 * job.chunk.index as u64));
                Ok(fake_artifact(job))
            })
            .expect("all chunks succeed");

        let indices: Vec<_> = artifacts.iter().map(|artifact| artifact.index).collect();
        assert_eq!(indices, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn one_failure_does_not_cancel_siblings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let broker = Broker {
            jobs:    jobs(3, temp.path()),
            workers: 3,
        };

        let err = broker
            .run_with(|job| {
                if job.chunk.index == 1 {
                    return Err(TranscodeError::Manifest(io::Error::other("boom")));
                }
                File::create(&job.output_path).expect("artifact written");
                Ok(fake_artifact(job))
            })
            .expect_err("chunk 1 fails the run");

        let BrokerError::ChunkFailed {
            index, ..
        } = err;
        assert_eq!(index, 1);
        // The siblings ran to completion and left their artifacts behind
        // for cleanup.
        assert!(temp.path().join("00000.mp4").exists());
        assert!(temp.path().join("00002.mp4").exists());
        assert!(!temp.path().join("00001.mp4").exists());
    }

    #[test]
    fn lowest_failing_index_wins() {
        let broker = Broker {
            jobs:    jobs(4, Path::new("/scratch")),
            workers: 2,
        };

        let err = broker
            .run_with(|job| {
                if job.chunk.index % 2 == 1 {
                    return Err(TranscodeError::Manifest(io::Error::other("boom")));
                }
                Ok(fake_artifact(job))
            })
            .expect_err("odd chunks fail");

        let BrokerError::ChunkFailed {
            index, ..
        } = err;
        assert_eq!(index, 1);
    }

    #[test]
    fn empty_job_list_is_a_no_op() {
        let broker = Broker {
            jobs:    Vec::new(),
            workers: 4,
        };

        let artifacts = broker.run_with(|job| Ok(fake_artifact(job))).expect("nothing to do");
        assert!(artifacts.is_empty());
    }

    #[test]
    fn single_worker_still_settles_everything() {
        let broker = Broker {
            jobs:    jobs(5, Path::new("/scratch")),
            workers: 1,
        };

        let artifacts = broker.run_with(|job| Ok(fake_artifact(job))).expect("succeeds");
        assert_eq!(artifacts.len(), 5);
    }
}
