use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single host request. None of them are retried.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {}: {source}", path.display())]
    DirectoryList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("search in {} failed: {reason}", folder.display())]
    Search { folder: PathBuf, reason: String },

    #[error("failed to run `{command}`: {source}")]
    CommandExecution {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    /// Short description without the operation prefix, for status-bar
    /// notices that already name the operation.
    pub fn detail(&self) -> String {
        match self {
            Self::FileRead { path, source }
            | Self::FileWrite { path, source }
            | Self::DirectoryList { path, source } => {
                format!("{}: {source}", path.display())
            }
            Self::Search { folder, reason } => format!("{}: {reason}", folder.display()),
            Self::CommandExecution { command, source } => format!("{command}: {source}"),
        }
    }
}
