use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update check already in progress")]
    CheckInProgress,

    #[error("failed to initialize updater: {0}")]
    Unavailable(String),

    #[error("failed to check for updates: {0}")]
    CheckFailed(String),

    #[error("failed to download update {version}: {message}")]
    DownloadFailed { version: String, message: String },

    #[error("no downloaded update is ready to install")]
    NotDownloaded,

    #[error("update installation already in progress")]
    InstallInProgress,

    #[error("failed to install update {version}: {message}")]
    InstallFailed { version: String, message: String },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("game executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("failed to spawn game process {}: {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("game is already running")]
    AlreadyLaunched,
}

/// Failures that keep a login from starting at all. Outcomes of a started
/// login are reported through `LoginResult` instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("a login is already pending")]
    AlreadyPending,

    #[error("failed to open the system browser: {0}")]
    BrowserUnavailable(String),

    #[error("invalid authorize endpoint: {0}")]
    InvalidAuthorizeUrl(String),
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("provider rejected the exchange: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize launcher state: {0}")]
    Serialize(#[from] serde_json::Error),
}
