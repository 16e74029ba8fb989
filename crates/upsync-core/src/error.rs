//! Error types for upsync
//!
//! Every runtime failure the polling loop can hit maps to one variant here.
//! Only [`Error::Startup`] is fatal; the loop logs the rest and retries on the
//! next tick.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for upsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for upsync
#[derive(Error, Debug)]
pub enum Error {
    /// Hostname lookup failed (NXDOMAIN, timeout, network error, empty answer)
    #[error("failed to resolve {host}: {message}")]
    Resolution {
        /// Hostname that was looked up
        host: String,
        /// Underlying cause
        message: String,
    },

    /// Writing the generated config file failed
    #[error("failed to write config file {}: {source}", path.display())]
    ConfigWrite {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The external reload command could not be launched or exited nonzero
    #[error("reload command `{command}` failed: {message}")]
    Reload {
        /// Command line that was run
        command: String,
        /// Underlying cause
        message: String,
    },

    /// The config file could not be created or opened at startup
    #[error("failed to create/open config file {}: {source}", path.display())]
    Startup {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a resolution error
    pub fn resolution(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a config write error
    pub fn config_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a reload error
    pub fn reload(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reload {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a startup error
    pub fn startup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Startup {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_subject() {
        let err = Error::resolution("backend.example.com", "no addresses returned");
        assert_eq!(
            err.to_string(),
            "failed to resolve backend.example.com: no addresses returned"
        );

        let err = Error::reload("nginx -s reload", "exit status: 1");
        assert_eq!(
            err.to_string(),
            "reload command `nginx -s reload` failed: exit status: 1"
        );
    }
}
