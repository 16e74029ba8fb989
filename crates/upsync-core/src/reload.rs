// # Command Reloader
//
// Reloader that runs an external command (by default `nginx -s reload`) and
// waits for it to exit. Exit status zero means the proxy accepted the new
// config.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::config::ReloadCommand;
use crate::error::{Error, Result};
use crate::traits::Reloader;

/// Reloader that spawns a child process
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: ReloadCommand,
}

impl CommandReloader {
    /// Create a reloader for `command`
    pub fn new(command: ReloadCommand) -> Self {
        Self { command }
    }
}

impl Default for CommandReloader {
    fn default() -> Self {
        Self::new(ReloadCommand::default())
    }
}

#[async_trait]
impl Reloader for CommandReloader {
    async fn reload(&self) -> Result<()> {
        let output = Command::new(self.command.program())
            .args(self.command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::reload(self.command.to_string(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            };
            return Err(Error::reload(self.command.to_string(), message));
        }

        info!("Proxy config reloaded via `{}`", self.command);
        Ok(())
    }

    fn describe(&self) -> String {
        self.command.to_string()
    }
}
