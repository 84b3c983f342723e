use thiserror::Error;

/// Failure of one backend request.
///
/// Every variant is recoverable: the coordinator turns it into a
/// source-tagged banner record and keeps polling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request never completed (connect, DNS, timeout).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}")]
    Backend { status: u16 },

    /// A 2xx answer whose body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Backend { .. } => "backend",
            FetchError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return FetchError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => FetchError::Backend { status: status.as_u16() },
            None => FetchError::Transport(err.to_string()),
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
