use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Console output at `console_level` (overridable via `RUST_LOG`) plus a
/// plain-text file log at `file_level`.
///
/// The returned guard flushes the file writer; keep it alive for the
/// duration of the run.
pub fn init_logging(
    console_level: LevelFilter,
    log_file: &Path,
    file_level: LevelFilter,
) -> Result<WorkerGuard> {
    let directory = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("log path {} has no file name", log_file.display()))?;
    fs::create_dir_all(directory)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    let console_filter =
        EnvFilter::builder().with_default_directive(console_level.into()).from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(console_filter))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).with_filter(file_level))
        .init();

    Ok(guard)
}
