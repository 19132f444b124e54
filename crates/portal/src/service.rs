//! One complete scrape: launch, navigate, export, release, decode.

use std::time::Instant;

use {
    async_trait::async_trait,
    tracing::{info, warn},
};

use {
    ticketscope_browser::{PageDriver, SessionLauncher},
    ticketscope_records::TicketRecord,
};

use crate::{
    error::ScrapeError,
    export::{ExportArtifact, ExportOrchestrator},
    markup::PortalMarkup,
    request::ScrapeRequest,
    session::SessionController,
    settings::PortalSettings,
};

/// Anything that can answer a ticket query.
#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<Vec<TicketRecord>, ScrapeError>;
}

/// Scrapes the portal with a fresh browser session per request.
pub struct TicketScraper<L> {
    launcher: L,
    settings: PortalSettings,
    markup: PortalMarkup,
}

impl<L: SessionLauncher> TicketScraper<L> {
    pub fn new(launcher: L, settings: PortalSettings) -> Self {
        Self {
            launcher,
            settings,
            markup: PortalMarkup::default(),
        }
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<TicketRecord>, ScrapeError> {
        let driver = self
            .launcher
            .launch()
            .await
            .map_err(ScrapeError::SessionUnavailable)?;

        let outcome = self.export(driver.as_ref(), request).await;

        // Released on every path; a close failure never replaces the outcome.
        if let Err(e) = driver.close().await {
            warn!(error = %e, "failed to close browser session");
        }

        let artifact = outcome?;
        Ok(ticketscope_records::decode(&artifact.bytes)?)
    }

    async fn export(
        &self,
        driver: &dyn PageDriver,
        request: &ScrapeRequest,
    ) -> Result<ExportArtifact, ScrapeError> {
        let mut session = SessionController::new(driver, &self.markup, &self.settings);
        if let Err(e) = session.open_filter_panel().await {
            warn!(state = %session.state(), "navigation stopped");
            return Err(e);
        }
        ExportOrchestrator::new(driver, &self.markup, &self.settings)
            .run(request)
            .await
    }
}

#[async_trait]
impl<L: SessionLauncher> TicketSource for TicketScraper<L> {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<Vec<TicketRecord>, ScrapeError> {
        let started = Instant::now();
        let result = self.scrape(request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(records) => info!(
                ticket_type = request.ticket_type(),
                start_date = %request.start_date(),
                end_date = %request.end_date(),
                records = records.len(),
                elapsed_ms,
                "scrape completed"
            ),
            Err(e) => warn!(
                kind = e.kind(),
                error = %e,
                ticket_type = request.ticket_type(),
                elapsed_ms,
                "scrape failed"
            ),
        }
        result
    }
}
