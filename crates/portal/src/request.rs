//! Validated scrape parameters.

use std::fmt;

use {chrono::NaiveDate, thiserror::Error};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),

    #[error("invalid date for `{field}`: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Label of the status radio to select (`Current`, `History`, ...).
///
/// Matched case-insensitively against the whole rendered label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter(String);

impl StatusFilter {
    pub fn new(label: impl AsRef<str>) -> Result<Self, RequestError> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return Err(RequestError::Missing("radio"));
        }
        Ok(Self(label.to_string()))
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invocation's worth of query parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    ticket_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: StatusFilter,
}

impl ScrapeRequest {
    pub fn new(
        ticket_type: impl AsRef<str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: impl AsRef<str>,
    ) -> Result<Self, RequestError> {
        let ticket_type = ticket_type.as_ref().trim();
        if ticket_type.is_empty() {
            return Err(RequestError::Missing("ticketType"));
        }
        let status = StatusFilter::new(status)?;
        if start_date > end_date {
            return Err(RequestError::InvertedRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            ticket_type: ticket_type.to_string(),
            start_date,
            end_date,
            status,
        })
    }

    /// Build from raw boundary strings.
    pub fn parse(
        ticket_type: &str,
        start_date: &str,
        end_date: &str,
        status: &str,
    ) -> Result<Self, RequestError> {
        if ticket_type.trim().is_empty() {
            return Err(RequestError::Missing("ticketType"));
        }
        let start_date = parse_date("startDate", start_date)?;
        let end_date = parse_date("endDate", end_date)?;
        Self::new(ticket_type, start_date, end_date, status)
    }

    pub fn ticket_type(&self) -> &str {
        &self.ticket_type
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn status(&self) -> &StatusFilter {
        &self.status
    }
}

/// Parse `YYYY-MM-DD`. A full timestamp (`2024-01-15T08:00:00Z`) is cut
/// down to its date part.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RequestError::Missing(field));
    }
    let date_part = trimmed
        .split_once(['T', ' '])
        .map_or(trimmed, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|_| RequestError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
