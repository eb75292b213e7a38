//! Core error types for the Taskdesk bootstrap.

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the four resources the bootstrap provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    AssetsDirectory,
    Database,
    Config,
    LogFile,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::AssetsDirectory => "assets directory",
            Resource::Database => "database",
            Resource::Config => "config file",
            Resource::LogFile => "log file",
        };
        f.write_str(name)
    }
}

/// Core error type for all Taskdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to create {resource} at {}: {source}", .path.display())]
    ResourceCreation {
        resource: Resource,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Config payload error: {0}")]
    ConfigShape(String),

    #[error("Database error: {0}")]
    Database(#[from] td_local_db::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Create a new resource-creation error.
    pub fn creation<P, E>(resource: Resource, path: P, source: E) -> Self
    where
        P: AsRef<Path>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::ResourceCreation {
            resource,
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Create a new config payload error.
    pub fn config_shape<S: Into<String>>(message: S) -> Self {
        Self::ConfigShape(message.into())
    }

    /// Whether startup must halt on this error.
    ///
    /// Missing or oddly shaped config data is recovered from locally;
    /// failures of the disk or the database are not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ConfigNotFound(_) | Self::ConfigShape(_))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
