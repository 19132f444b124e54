//! The trouble-ticket portal workflow.
//!
//! A [`TicketScraper`] launches one browser session per request, logs in,
//! walks to the query filter panel, applies the request's filters, exports
//! the result grid as CSV and decodes it into [`TicketRecord`]s. The session
//! is always released, whatever happens along the way.
//!
//! [`TicketRecord`]: ticketscope_records::TicketRecord

pub mod calendar;
pub mod error;
pub mod export;
pub mod markup;
pub mod request;
pub mod selector;
pub mod service;
pub mod session;
pub mod settings;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod fake;

pub use {
    calendar::{CalendarCursor, CalendarNavigator},
    error::ScrapeError,
    export::{ExportArtifact, ExportOrchestrator, ExportStep},
    markup::PortalMarkup,
    request::{RequestError, ScrapeRequest, StatusFilter, parse_date},
    selector::FilterSelector,
    service::{TicketScraper, TicketSource},
    session::{SessionController, SessionState},
    settings::{PortalSettings, SettingsError, Timeouts},
};
