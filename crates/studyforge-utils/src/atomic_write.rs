//! Atomic file replacement for small state files.
//!
//! Content goes to a temporary file in the target directory, is fsynced, and
//! is then renamed over the target so readers never observe a partial write.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `content`, creating parent directories.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {parent}"))?;
    }

    let temp_dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {temp_dir}"))?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    persist(temp_file, path.as_std_path())
        .with_context(|| format!("Failed to atomically write file: {path}"))
}

#[cfg(not(target_os = "windows"))]
fn persist(temp_file: NamedTempFile, target: &Path) -> Result<()> {
    temp_file
        .persist(target)
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(e.error))
}

/// Windows can refuse the rename while another handle is briefly open, so a
/// few short retries are allowed.
#[cfg(target_os = "windows")]
fn persist(mut temp_file: NamedTempFile, target: &Path) -> Result<()> {
    use std::io::ErrorKind;
    use std::{thread, time::Duration};

    const MAX_RETRIES: u32 = 5;
    let mut retry = 0;
    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(()),
            Err(e)
                if retry < MAX_RETRIES
                    && matches!(e.error.kind(), ErrorKind::PermissionDenied | ErrorKind::Other) =>
            {
                thread::sleep(Duration::from_millis(10 * 2_u64.pow(retry)));
                retry += 1;
                temp_file = e.file;
            }
            Err(e) => return Err(anyhow::anyhow!(e.error)),
        }
    }
}
