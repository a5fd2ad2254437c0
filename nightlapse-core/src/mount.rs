use std::{
    fmt, fs, io,
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

use thiserror::Error;
use tracing::{debug, info};

/// SMB share endpoint and the local mount point it is attached to.
///
/// Mounting is idempotent: the current mount table is consulted before
/// `mount_smbfs` is attempted. Everything downstream reads through the
/// mount point, so a mount failure is fatal to the whole run.
#[derive(Clone)]
pub struct ShareMount {
    pub host:        String,
    pub share:       String,
    pub mount_point: PathBuf,
    pub username:    String,
    pub password:    String,
}

// Hand-written so the password can never end up in a log line.
impl fmt::Debug for ShareMount {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareMount")
            .field("host", &self.host)
            .field("share", &self.share)
            .field("mount_point", &self.mount_point)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("failed to inspect mount table: {0}")]
    Io(#[from] io::Error),
    #[error("mount_smbfs exited with {status}: {stderr}")]
    MountFailed { status: ExitStatus, stderr: String },
}

impl ShareMount {
    /// True if the mount table already lists the mount point.
    #[inline]
    pub fn is_mounted(&self) -> Result<bool, MountError> {
        let out = Command::new("mount").stdout(Stdio::piped()).stderr(Stdio::null()).output()?;
        let table = String::from_utf8_lossy(&out.stdout);

        Ok(table.contains(&self.mount_point.display().to_string()))
    }

    /// Mounts the share at the mount point, creating it first. A second
    /// call while mounted is a no-op.
    #[inline]
    pub fn mount(&self) -> Result<(), MountError> {
        fs::create_dir_all(&self.mount_point)?;

        if self.is_mounted()? {
            debug!("{} is already mounted", self.mount_point.display());
            return Ok(());
        }

        info!(
            "Mounting //{}@{}/{} at {}",
            self.username,
            self.host,
            self.share,
            self.mount_point.display()
        );

        // The remote location carries the credentials, so this command
        // line must stay out of the logs.
        let mut cmd = Command::new("mount_smbfs");
        cmd.arg(self.remote_location());
        cmd.arg(&self.mount_point);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let out = cmd.output()?;
        if !out.status.success() {
            return Err(MountError::MountFailed {
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
            });
        }

        Ok(())
    }

    fn remote_location(&self) -> String {
        format!("//{}:{}@{}/{}", self.username, self.password, self.host, self.share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share() -> ShareMount {
        ShareMount {
            host:        "100.64.0.9".to_owned(),
            share:       "camera".to_owned(),
            mount_point: PathBuf::from("/tmp/nightlapse-share"),
            username:    "lapse".to_owned(),
            password:    "hunter2".to_owned(),
        }
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let debugged = format!("{:?}", share());
        assert!(!debugged.contains("hunter2"));
        assert!(debugged.contains("<redacted>"));
        assert!(debugged.contains("100.64.0.9"));
    }

    #[test]
    fn remote_location_follows_the_smbfs_convention() {
        assert_eq!(share().remote_location(), "//lapse:hunter2@100.64.0.9/camera");
    }
}
