use std::{
    path::Path,
    process::{Command, ExitStatus, Stdio},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::debug;

/// Hardware codec used for the chunk encode stage.
///
/// Both profiles target the VideoToolbox encoders; the merge stage is a
/// stream copy and is codec-agnostic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CodecProfile {
    #[default]
    H264,
    Hevc,
}

impl CodecProfile {
    /// Encoder name passed to `-c:v`.
    #[inline]
    pub const fn encoder(self) -> &'static str {
        match self {
            CodecProfile::H264 => "h264_videotoolbox",
            CodecProfile::Hevc => "hevc_videotoolbox",
        }
    }
}

/// Fixed encode profile shared by every chunk of a run.
///
/// Chunk outputs must share a codec profile so the merge stage can
/// concatenate them without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    pub codec:   CodecProfile,
    pub hwaccel: String,
    pub bitrate: String,
    pub preset:  String,
    pub pix_fmt: String,
}

impl Default for EncodeProfile {
    #[inline]
    fn default() -> Self {
        Self {
            codec:   CodecProfile::default(),
            hwaccel: "videotoolbox".to_owned(),
            bitrate: "2M".to_owned(),
            preset:  "fast".to_owned(),
            pix_fmt: "yuv420p".to_owned(),
        }
    }
}

impl EncodeProfile {
    #[inline]
    pub fn with_codec(codec: CodecProfile) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum FFmpegError {
    #[error("ffmpeg not found in PATH")]
    NotInstalled,
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Fails unless an ffmpeg executable is on the PATH.
#[inline]
pub fn validate_installed() -> Result<(), FFmpegError> {
    which::which("ffmpeg").map_err(|_| FFmpegError::NotInstalled)?;

    Ok(())
}

/// Builds the chunk-stage invocation: concat demuxer over `manifest`,
/// presentation timestamps divided by `speed_factor`, fixed encode
/// profile, audio dropped.
#[inline]
pub fn compose_chunk_command(
    manifest: &Path,
    output: &Path,
    speed_factor: f64,
    profile: &EncodeProfile,
) -> Command {
    let mut cmd = Command::new("ffmpeg");

    cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
    cmd.args(["-hwaccel", &profile.hwaccel]);
    cmd.args(["-f", "concat", "-safe", "0", "-i"]);
    cmd.arg(manifest);
    cmd.args(["-filter:v", &format!("setpts=PTS/{speed_factor}")]);
    cmd.args(["-c:v", profile.codec.encoder()]);
    cmd.args(["-b:v", &profile.bitrate]);
    cmd.args(["-preset", &profile.preset]);
    cmd.args(["-pix_fmt", &profile.pix_fmt]);
    cmd.arg("-an");
    cmd.arg(output);

    cmd
}

/// Builds the merge-stage invocation: concat demuxer over `manifest`
/// with stream copy, no re-encode.
#[inline]
pub fn compose_merge_command(manifest: &Path, output: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");

    cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
    cmd.args(["-f", "concat", "-safe", "0", "-i"]);
    cmd.arg(manifest);
    cmd.args(["-c", "copy", "-an"]);
    cmd.arg(output);

    cmd
}

/// Runs a composed invocation to completion, capturing stderr for the
/// failure diagnostic.
#[inline]
pub fn run(mut cmd: Command) -> Result<(), FFmpegError> {
    debug!("Running {cmd:?}");

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let out = cmd.output()?;
    if !out.status.success() {
        return Err(FFmpegError::Failed {
            status: out.status,
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
        });
    }

    Ok(())
}
