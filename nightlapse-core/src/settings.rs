use std::{collections::BTreeMap, path::PathBuf};

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ffmpeg::EncodeProfile;

/// Divisor applied to presentation timestamps by default: a day of
/// footage compresses to 1/60th of its realtime length.
pub const DEFAULT_SPEED_FACTOR: f64 = 60.0;

/// Days back from today to process when no explicit date is given.
/// Cameras finish writing a day's clips well after local midnight, so
/// the most recent complete day is yesterday.
pub const DEFAULT_DATE_OFFSET: u64 = 1;

pub const DEFAULT_CLIP_EXTENSION: &str = "mp4";

/// Where clips are read from and where results land.
#[derive(Debug, Clone)]
pub struct IoSettings {
    /// Directory containing one subdirectory per camera, each holding
    /// one `YYYYMMDD` subdirectory per day.
    pub source_root:    PathBuf,
    /// Destination for final time-lapse artifacts.
    pub output_dir:     PathBuf,
    /// Holds per-run scratch directories for manifests and chunk
    /// artifacts; emptied again by cleanup.
    pub scratch_dir:    PathBuf,
    pub clip_extension: String,
}

/// Parameters of the chunked speed-up stage.
#[derive(Debug, Clone)]
pub struct SpeedupSettings {
    pub speed_factor: f64,
    pub profile:      EncodeProfile,
    /// Worker pool size; 0 derives it from host parallelism.
    pub workers:      usize,
}

impl Default for SpeedupSettings {
    #[inline]
    fn default() -> Self {
        Self {
            speed_factor: DEFAULT_SPEED_FACTOR,
            profile:      EncodeProfile::default(),
            workers:      0,
        }
    }
}

/// Camera directories to process and their display names.
///
/// The label map is immutable for the lifetime of a run; directories
/// without an entry fall back to the raw directory name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraMap {
    pub directories: Vec<String>,
    #[serde(default)]
    pub labels:      BTreeMap<String, String>,
}

impl CameraMap {
    #[inline]
    pub fn new(directories: Vec<String>, labels: BTreeMap<String, String>) -> Self {
        Self {
            directories,
            labels,
        }
    }

    /// Friendly name used in output file names.
    #[inline]
    pub fn label_for<'a>(&'a self, directory: &'a str) -> &'a str {
        self.labels.get(directory).map_or(directory, String::as_str)
    }
}

/// The date to process, `offset_days` back from today.
#[inline]
pub fn target_date(offset_days: u64) -> NaiveDate {
    Local::now().date_naive() - Days::new(offset_days)
}

/// Compact `YYYYMMDD` form used for day directories and file names.
#[inline]
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
