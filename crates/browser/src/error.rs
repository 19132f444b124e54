//! Browser error types.

use thiserror::Error;

/// Errors that can occur while driving the browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser not available: Chrome/Chromium not found. {0}")]
    BrowserNotAvailable(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("browser closed unexpectedly")]
    BrowserClosed,

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    /// Whether the failure is an elapsed wait budget rather than a fault.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}
