use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::context::TimelapseOutcome;

/// Summary of a whole run, one entry per camera, written as JSON for
/// whatever scheduled the run to inspect.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub date:    NaiveDate,
    pub cameras: Vec<CameraReport>,
}

#[derive(Debug, Serialize)]
pub struct CameraReport {
    pub camera: String,
    pub label:  String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Created,
    NoClips,
    Failed,
}

impl CameraReport {
    #[inline]
    pub fn from_outcome(camera: &str, label: &str, outcome: &TimelapseOutcome) -> Self {
        let (status, artifact) = match outcome {
            TimelapseOutcome::NoClips => (RunStatus::NoClips, None),
            TimelapseOutcome::Created {
                artifact, ..
            } => (RunStatus::Created, Some(artifact.clone())),
        };

        Self {
            camera: camera.to_owned(),
            label: label.to_owned(),
            status,
            artifact,
            uploaded_to: None,
            error: None,
        }
    }

    #[inline]
    pub fn failed(camera: &str, label: &str, error: &anyhow::Error) -> Self {
        Self {
            camera:      camera.to_owned(),
            label:       label.to_owned(),
            status:      RunStatus::Failed,
            artifact:    None,
            uploaded_to: None,
            error:       Some(format!("{error:#}")),
        }
    }
}

impl RunReport {
    #[inline]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cameras: Vec::new(),
        }
    }

    /// True if any camera failed, including upload failures recorded on
    /// otherwise successful entries.
    #[inline]
    pub fn has_failures(&self) -> bool {
        self.cameras
            .iter()
            .any(|camera| camera.status == RunStatus::Failed || camera.error.is_some())
    }

    /// Writes the report as pretty JSON, going through a temp file so a
    /// crashed writer never leaves a truncated report behind.
    #[inline]
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buffer = vec![];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;

        let temp = path.with_extension("tmp");
        fs::write(&temp, buffer)?;
        fs::rename(&temp, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        Ok(())
    }
}
