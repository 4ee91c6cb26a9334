use thiserror::Error;

/// Errors raised while retrieving a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, timeout or body decoding failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The server answered 2xx with a bot-challenge page
    #[error("{url} answered with a bot challenge page")]
    Blocked { url: String },

    /// Every attempt failed
    #[error("failed to fetch {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// Archive lookup or snapshot request failed
    #[error("archive error: {0}")]
    Archive(String),

    /// The rendering service failed
    #[error("render error: {0}")]
    Render(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Http(_) | FetchError::Status { .. } | FetchError::Blocked { .. }
        )
    }
}

/// Errors raised while writing images, dumps or the recipe store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("image download from {url} returned status {status}")]
    DownloadStatus { url: String, status: u16 },
}

/// Errors that stop a harvester from being built or a batch from being persisted
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Recipe store could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),
}
