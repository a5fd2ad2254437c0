use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("artifact path {0} has no file name")]
    MissingFileName(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Copies `artifact` into `destination_dir`, keeping the file name.
///
/// An upload failure never invalidates the artifact itself; the caller
/// reports it and moves on to the next camera.
#[inline]
pub fn upload_artifact(artifact: &Path, destination_dir: &Path) -> Result<PathBuf, UploadError> {
    let file_name = artifact
        .file_name()
        .ok_or_else(|| UploadError::MissingFileName(artifact.to_path_buf()))?;

    fs::create_dir_all(destination_dir)?;
    let destination = destination_dir.join(file_name);
    fs::copy(artifact, &destination)?;
    info!("Uploaded {} to {}", artifact.display(), destination.display());

    Ok(destination)
}
