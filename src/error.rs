use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Failures that leave a fetch attempt. "No price found" is not one of them:
/// it is `Ok(None)` from the fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The automation engine could not start a session.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Any other failure while driving the page.
    #[error("automation error: {0}")]
    Transient(String),

    /// Only raised when confirmed selection is required before submitting.
    #[error("form control {field} could not be confirmed (observed {observed:?})")]
    SelectionUnconfirmed { field: String, observed: String },
}

impl FetchError {
    pub fn transient(msg: impl Into<String>) -> Self {
        FetchError::Transient(msg.into())
    }
}

impl From<CdpError> for FetchError {
    fn from(err: CdpError) -> Self {
        FetchError::Transient(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Transient(format!("unexpected script result: {}", err))
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Transient(err.to_string())
    }
}
