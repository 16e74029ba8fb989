// # Config File
//
// The generated proxy config on disk.
//
// ## Write Semantics
//
// - Truncate-and-rewrite, no temp file and no rename
// - Buffered write, flushed before the handle is dropped
// - The proxy only reads the file when the reload runs, which is strictly
//   after `write()` returns
//
// The file is shared with the proxy, so a concurrent reader could observe a
// partial write. Nothing reads it concurrently in practice.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{Error, Result};

/// Handle on the generated config file
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Make sure the config file exists and can be opened
    ///
    /// Creates an empty file when it is absent and leaves existing content
    /// untouched. An existing file only has to be readable; a file that
    /// cannot be written surfaces later as a per-cycle write error. Any
    /// failure here is fatal.
    pub async fn ensure<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let exists = fs::try_exists(&path)
            .await
            .map_err(|e| Error::startup(&path, e))?;
        if exists {
            fs::File::open(&path)
                .await
                .map_err(|e| Error::startup(&path, e))?;
        } else {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match created {
                Ok(_) => {}
                // Lost a race with another creator; fall back to the read check.
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    fs::File::open(&path)
                        .await
                        .map_err(|e| Error::startup(&path, e))?;
                }
                Err(e) => return Err(Error::startup(&path, e)),
            }
        }

        debug!("Config file {} is accessible", path.display());
        Ok(Self { path })
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file content with `content`
    pub async fn write(&self, content: &str) -> Result<()> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::config_write(&self.path, e))?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .await
            .map_err(|e| Error::config_write(&self.path, e))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::config_write(&self.path, e))?;

        debug!("Wrote {} bytes to {}", content.len(), self.path.display());
        Ok(())
    }

    /// Read the current file content
    pub async fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::config_write(&self.path, e))
    }
}
