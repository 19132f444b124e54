//! Filling the query form, running it and capturing the CSV export.

use std::fmt;

use tracing::{debug, info};

use ticketscope_browser::{BrowserError, Locator, PageDriver};

use crate::{
    calendar::CalendarNavigator, error::ScrapeError, markup::PortalMarkup,
    request::ScrapeRequest, selector::FilterSelector, settings::PortalSettings,
};

/// Steps of the export sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStep {
    TicketType,
    StartDate,
    EndDate,
    Status,
    Query,
    Results,
    ExportMenu,
    Download,
}

impl fmt::Display for ExportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TicketType => "ticket type",
            Self::StartDate => "start date",
            Self::EndDate => "end date",
            Self::Status => "status",
            Self::Query => "query",
            Self::Results => "results",
            Self::ExportMenu => "export menu",
            Self::Download => "download",
        };
        f.write_str(name)
    }
}

/// The downloaded CSV, complete and in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct ExportOrchestrator<'a> {
    driver: &'a dyn PageDriver,
    markup: &'a PortalMarkup,
    settings: &'a PortalSettings,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        markup: &'a PortalMarkup,
        settings: &'a PortalSettings,
    ) -> Self {
        Self {
            driver,
            markup,
            settings,
        }
    }

    /// Run the export against an open filter panel.
    ///
    /// Selection failures (`OptionNotFound`, `DateNotSelectable`,
    /// `NavigationTimeout`) are returned as-is; every other failure becomes
    /// [`ScrapeError::ExportFailed`] naming its step.
    pub async fn run(&self, request: &ScrapeRequest) -> Result<ExportArtifact, ScrapeError> {
        let selector = FilterSelector::new(self.driver, self.markup, self.settings);
        let calendar = CalendarNavigator::new(self.driver, self.markup, self.settings);
        let timeouts = &self.settings.timeouts;

        selector
            .select_option(&self.markup.ticket_type_label, request.ticket_type())
            .await
            .map_err(|e| escalate(ExportStep::TicketType, e))?;
        calendar
            .select_date(&self.date_widget(&self.markup.start_date_input), request.start_date())
            .await
            .map_err(|e| escalate(ExportStep::StartDate, e))?;
        calendar
            .select_date(&self.date_widget(&self.markup.end_date_input), request.end_date())
            .await
            .map_err(|e| escalate(ExportStep::EndDate, e))?;
        selector
            .select_radio(request.status())
            .await
            .map_err(|e| escalate(ExportStep::Status, e))?;

        self.driver
            .click(
                &Locator::css(&self.markup.query_button)
                    .with_exact_text(&self.markup.query_button_text),
            )
            .await
            .map_err(failed(ExportStep::Query))?;
        debug!(ticket_type = request.ticket_type(), "query submitted");

        let results = Locator::css(&self.markup.results_marker);
        self.driver
            .wait_for(&results, timeouts.navigation)
            .await
            .map_err(failed(ExportStep::Results))?;
        self.driver
            .click(&results)
            .await
            .map_err(failed(ExportStep::Results))?;

        let export = Locator::css(&self.markup.export_icon);
        self.driver
            .wait_for(&export, timeouts.navigation)
            .await
            .map_err(failed(ExportStep::ExportMenu))?;
        self.driver
            .click(&export)
            .await
            .map_err(failed(ExportStep::ExportMenu))?;
        let csv_entry = Locator::css(&self.markup.export_menu_item)
            .containing_text(&self.markup.csv_entry_text);
        self.driver
            .wait_for(&csv_entry, timeouts.navigation)
            .await
            .map_err(failed(ExportStep::ExportMenu))?;

        let download = self
            .driver
            .click_and_download(&csv_entry, timeouts.download)
            .await
            .map_err(failed(ExportStep::Download))?;

        info!(
            file = download.suggested_filename.as_deref().unwrap_or_default(),
            bytes = download.bytes.len(),
            "export downloaded"
        );
        Ok(ExportArtifact {
            file_name: download.suggested_filename,
            bytes: download.bytes,
        })
    }

    fn date_widget(&self, selector: &str) -> Locator {
        Locator::css(selector).nth(self.markup.date_input_index)
    }
}

fn escalate(step: ExportStep, err: ScrapeError) -> ScrapeError {
    match err {
        ScrapeError::OptionNotFound { .. }
        | ScrapeError::DateNotSelectable { .. }
        | ScrapeError::NavigationTimeout { .. } => err,
        other => ScrapeError::ExportFailed {
            step,
            reason: other.to_string(),
        },
    }
}

fn failed(step: ExportStep) -> impl Fn(BrowserError) -> ScrapeError {
    move |e| ScrapeError::ExportFailed {
        step,
        reason: e.to_string(),
    }
}
