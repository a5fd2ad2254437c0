use std::{collections::BTreeMap, env, path::PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use nightlapse_core::{
    settings::{DEFAULT_CLIP_EXTENSION, DEFAULT_SPEED_FACTOR},
    CameraMap,
    CodecProfile,
    EncodeProfile,
    IoSettings,
    ShareMount,
    SpeedupSettings,
};

use crate::Cli;

/// Everything a run needs, resolved from the environment with CLI flags
/// taking precedence.
///
/// Required variables: `NIGHTLAPSE_HOST`, `NIGHTLAPSE_SHARE`,
/// `NIGHTLAPSE_MOUNT_POINT`, `NIGHTLAPSE_USERNAME`,
/// `NIGHTLAPSE_PASSWORD`, `NIGHTLAPSE_SOURCE_BASE`,
/// `NIGHTLAPSE_CAMERAS`, `NIGHTLAPSE_OUTPUT_DIR`,
/// `NIGHTLAPSE_UPLOAD_DIR`. Optional: `NIGHTLAPSE_LABELS` (JSON object),
/// `NIGHTLAPSE_SPEED`, `NIGHTLAPSE_CODEC`, `NIGHTLAPSE_CLIP_EXTENSION`.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub share:      ShareMount,
    pub io:         IoSettings,
    pub speedup:    SpeedupSettings,
    pub cameras:    CameraMap,
    /// Upload destination under the mount point.
    pub upload_dir: PathBuf,
}

impl Configuration {
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let host = required_var("NIGHTLAPSE_HOST")?;
        let share = required_var("NIGHTLAPSE_SHARE")?;
        let mount_point = PathBuf::from(required_var("NIGHTLAPSE_MOUNT_POINT")?);
        let username = required_var("NIGHTLAPSE_USERNAME")?;
        let password = required_var("NIGHTLAPSE_PASSWORD")?;

        let source_base = required_var("NIGHTLAPSE_SOURCE_BASE")?;
        let directories = parse_cameras(&required_var("NIGHTLAPSE_CAMERAS")?);
        ensure!(!directories.is_empty(), "NIGHTLAPSE_CAMERAS lists no camera directories");
        let labels = match optional_var("NIGHTLAPSE_LABELS") {
            Some(raw) => parse_labels(&raw)?,
            None => BTreeMap::new(),
        };

        let output_dir = PathBuf::from(required_var("NIGHTLAPSE_OUTPUT_DIR")?);
        let upload_dir =
            mount_point.join(required_var("NIGHTLAPSE_UPLOAD_DIR")?.trim_start_matches('/'));

        let speed_factor = match cli.speed {
            Some(speed) => speed,
            None => match optional_var("NIGHTLAPSE_SPEED") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("NIGHTLAPSE_SPEED is not a number: {raw}"))?,
                None => DEFAULT_SPEED_FACTOR,
            },
        };
        let codec = match cli.codec {
            Some(codec) => codec,
            None => match optional_var("NIGHTLAPSE_CODEC") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow!("NIGHTLAPSE_CODEC must be h264 or hevc, got {raw}"))?,
                None => CodecProfile::default(),
            },
        };

        let scratch_dir = cli.temp.clone().unwrap_or_else(|| output_dir.join("temp"));

        Ok(Self {
            share: ShareMount {
                host,
                share,
                mount_point: mount_point.clone(),
                username,
                password,
            },
            io: IoSettings {
                // The base is a share-relative path; joining it verbatim
                // would discard the mount point if it starts with '/'.
                source_root: mount_point.join(source_base.trim_start_matches('/')),
                output_dir,
                scratch_dir,
                clip_extension: optional_var("NIGHTLAPSE_CLIP_EXTENSION")
                    .unwrap_or_else(|| DEFAULT_CLIP_EXTENSION.to_owned()),
            },
            speedup: SpeedupSettings {
                speed_factor,
                profile: EncodeProfile::with_codec(codec),
                workers: cli.workers.unwrap_or(0),
            },
            cameras: CameraMap::new(directories, labels),
            upload_dir,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("environment variable {name} is not set"))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_cameras(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_labels(raw: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(raw)
        .context("NIGHTLAPSE_LABELS is not a JSON object of directory -> label")
}
