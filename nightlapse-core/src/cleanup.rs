use std::{fs, io, path::Path};

use tracing::{debug, warn};

/// Removes a run's scratch directory and every intermediate inside it:
/// chunk manifests, chunk artifacts, and the merge manifest.
///
/// Deletion failures are logged and never escalate, so they cannot mask
/// the verdict of the run that produced the intermediates.
#[inline]
pub fn remove_run_scratch(scratch_dir: &Path) {
    if !scratch_dir.exists() {
        return;
    }

    match fs::remove_dir_all(scratch_dir) {
        Ok(()) => debug!("Removed scratch directory {}", scratch_dir.display()),
        Err(e) => warn!("Failed to remove scratch directory {}: {e}", scratch_dir.display()),
    }
}

/// Removes a single file, treating "already gone" as success.
#[inline]
pub fn remove_file_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}
