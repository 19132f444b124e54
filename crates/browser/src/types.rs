//! Launch settings and transfer types.

use std::time::Duration;

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Timeout for a single CDP request.
    pub request_timeout: Duration,
    /// User agent string (uses default if not set).
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub ignore_certificate_errors: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from(&ticketscope_config::BrowserConfig::default())
    }
}

impl From<&ticketscope_config::BrowserConfig> for BrowserConfig {
    fn from(cfg: &ticketscope_config::BrowserConfig) -> Self {
        Self {
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            viewport_width: cfg.viewport_width,
            viewport_height: cfg.viewport_height,
            request_timeout: Duration::from_millis(cfg.request_timeout_ms),
            user_agent: cfg.user_agent.clone(),
            chrome_args: cfg.chrome_args.clone(),
            ignore_certificate_errors: cfg.ignore_certificate_errors,
        }
    }
}

/// A file captured from a click-triggered download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name proposed by the server, if any.
    pub suggested_filename: Option<String>,
    pub bytes: Vec<u8>,
}
