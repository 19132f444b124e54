use {chrono::NaiveDate, thiserror::Error};

use {ticketscope_browser::BrowserError, ticketscope_records::DecodeError};

use crate::export::ExportStep;

/// Terminal failure of one scrape. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser session could not be started: {0}")]
    SessionUnavailable(#[source] BrowserError),

    #[error("authentication failed: the portal never showed the job selection prompt")]
    AuthenticationFailed,

    #[error("timed out during {phase}: {detail}")]
    NavigationTimeout { phase: &'static str, detail: String },

    #[error("option {option:?} not found for {label:?}")]
    OptionNotFound { label: String, option: String },

    #[error("date {date} cannot be selected")]
    DateNotSelectable { date: NaiveDate },

    #[error("export failed at {step}: {reason}")]
    ExportFailed { step: ExportStep, reason: String },

    #[error("browser error during {phase}: {source}")]
    Browser {
        phase: &'static str,
        #[source]
        source: BrowserError,
    },

    #[error("export could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

impl ScrapeError {
    /// Map a driver failure: elapsed waits become [`Self::NavigationTimeout`],
    /// anything else stays a [`Self::Browser`] fault.
    pub fn from_browser(phase: &'static str, err: BrowserError) -> Self {
        if err.is_timeout() {
            Self::NavigationTimeout {
                phase,
                detail: err.to_string(),
            }
        } else {
            Self::Browser { phase, source: err }
        }
    }

    /// Stable discriminator for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionUnavailable(_) => "session_unavailable",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NavigationTimeout { .. } => "navigation_timeout",
            Self::OptionNotFound { .. } => "option_not_found",
            Self::DateNotSelectable { .. } => "date_not_selectable",
            Self::ExportFailed { .. } => "export_failed",
            Self::Browser { .. } => "browser",
            Self::Decode(_) => "decode",
        }
    }
}
