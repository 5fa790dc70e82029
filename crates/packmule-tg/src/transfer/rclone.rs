use crate::prelude::*;
use crate::util::process;
use crate::Result;
use std::path::Path;

/// Copies one local file to a remote path. rclone owns retries, checksums
/// and backend specifics; we only pick the config file and the remote.
pub(crate) async fn copy_to_remote(config: &Path, file: &Path, remote: &str) -> Result<()> {
    let config = config.to_string_lossy();
    let file = file.to_string_lossy();

    info!(%file, remote, "Uploading via rclone");

    process::run("rclone", &["copy", "--config", &config, &file, remote])
        .await
        .map(drop)
}

/// Downloads a remote file or directory into the task's work dir.
pub(crate) async fn copy_from_remote(config: &Path, remote: &str, dest_dir: &Path) -> Result<()> {
    let config = config.to_string_lossy();
    let dest_dir = dest_dir.to_string_lossy();

    info!(remote, dest = %dest_dir, "Downloading via rclone");

    process::run("rclone", &["copy", "--config", &config, remote, &dest_dir])
        .await
        .map(drop)
}
