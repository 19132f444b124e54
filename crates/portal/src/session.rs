//! Login and navigation up to the query filter panel.

use std::fmt;

use {
    secrecy::ExposeSecret,
    tracing::{debug, info},
};

use ticketscope_browser::{Locator, PageDriver};

use crate::{error::ScrapeError, markup::PortalMarkup, settings::PortalSettings};

/// Where the session is in the portal. States are only ever entered in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    ContextSelected,
    MonitoringViewOpen,
    FilterPanelOpen,
}

impl SessionState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unauthenticated => Some(Self::Authenticated),
            Self::Authenticated => Some(Self::ContextSelected),
            Self::ContextSelected => Some(Self::MonitoringViewOpen),
            Self::MonitoringViewOpen => Some(Self::FilterPanelOpen),
            Self::FilterPanelOpen => None,
        }
    }

    /// Name of the transition that enters this state. The initial state has
    /// none.
    pub fn phase(self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => None,
            Self::Authenticated => Some("login"),
            Self::ContextSelected => Some("job context selection"),
            Self::MonitoringViewOpen => Some("monitoring view navigation"),
            Self::FilterPanelOpen => Some("filter panel"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::ContextSelected => "context_selected",
            Self::MonitoringViewOpen => "monitoring_view_open",
            Self::FilterPanelOpen => "filter_panel_open",
        };
        f.write_str(name)
    }
}

pub struct SessionController<'a> {
    driver: &'a dyn PageDriver,
    markup: &'a PortalMarkup,
    settings: &'a PortalSettings,
    state: SessionState,
}

impl<'a> SessionController<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        markup: &'a PortalMarkup,
        settings: &'a PortalSettings,
    ) -> Self {
        Self {
            driver,
            markup,
            settings,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive every remaining transition up to [`SessionState::FilterPanelOpen`].
    /// On failure the state stays at the last one reached.
    pub async fn open_filter_panel(&mut self) -> Result<(), ScrapeError> {
        while let Some(next) = self.state.next() {
            self.enter(next).await?;
            debug!(from = %self.state, to = %next, "session transition");
            self.state = next;
        }
        Ok(())
    }

    async fn enter(&self, state: SessionState) -> Result<(), ScrapeError> {
        let Some(phase) = state.phase() else {
            return Ok(());
        };
        match state {
            SessionState::Unauthenticated => Ok(()),
            SessionState::Authenticated => self.login(phase).await,
            SessionState::ContextSelected => self.select_context(phase).await,
            SessionState::MonitoringViewOpen => self.open_monitoring_view(phase).await,
            SessionState::FilterPanelOpen => self.open_more_filters(phase).await,
        }
    }

    async fn login(&self, phase: &'static str) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(phase, e);
        let timeouts = &self.settings.timeouts;

        self.driver.goto(&self.settings.url).await.map_err(browser)?;
        self.driver
            .wait_for_quiescence(timeouts.quiescence)
            .await
            .map_err(browser)?;

        let username = Locator::css(&self.markup.username_input);
        self.driver
            .wait_for(&username, timeouts.navigation)
            .await
            .map_err(browser)?;
        self.driver
            .fill(&username, &self.settings.username)
            .await
            .map_err(browser)?;
        self.driver
            .fill(
                &Locator::css(&self.markup.password_input),
                self.settings.password.expose_secret(),
            )
            .await
            .map_err(browser)?;
        self.driver
            .click(
                &Locator::css(&self.markup.login_button)
                    .with_exact_text(&self.markup.login_button_text),
            )
            .await
            .map_err(browser)?;

        let prompt = self.by_text(&self.markup.login_prompt, false);
        match self.driver.wait_for(&prompt, timeouts.login).await {
            Ok(()) => {
                info!(url = %self.settings.url, "logged in to portal");
                Ok(())
            },
            Err(e) if e.is_timeout() => Err(ScrapeError::AuthenticationFailed),
            Err(e) => Err(browser(e)),
        }
    }

    async fn select_context(&self, phase: &'static str) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(phase, e);
        let timeouts = &self.settings.timeouts;

        let context = self.by_text(&self.settings.job_context, true);
        self.driver
            .wait_for(&context, timeouts.navigation)
            .await
            .map_err(browser)?;
        self.driver.double_click(&context).await.map_err(browser)?;
        self.driver
            .wait_for_quiescence(timeouts.quiescence)
            .await
            .map_err(browser)?;

        debug!(job_context = %self.settings.job_context, "job context selected");
        Ok(())
    }

    async fn open_monitoring_view(&self, phase: &'static str) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(phase, e);
        let timeouts = &self.settings.timeouts;

        self.driver
            .click(&Locator::css(&self.markup.menu_toggle))
            .await
            .map_err(browser)?;
        self.driver
            .wait_for(&Locator::css(&self.markup.menu_ready), timeouts.navigation)
            .await
            .map_err(browser)?;

        let entry = self.by_text(&self.markup.monitoring_entry_text, true);
        self.driver
            .wait_for(&entry, timeouts.navigation)
            .await
            .map_err(browser)?;
        self.driver.click(&entry).await.map_err(browser)?;
        self.driver
            .wait_for_quiescence(timeouts.quiescence)
            .await
            .map_err(browser)
    }

    async fn open_more_filters(&self, phase: &'static str) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(phase, e);

        let more = Locator::css(&self.markup.more_button);
        self.driver
            .wait_for(&more, self.settings.timeouts.navigation)
            .await
            .map_err(browser)?;
        self.driver.click(&more).await.map_err(browser)
    }

    fn by_text(&self, text: &str, exact: bool) -> Locator {
        let locator = Locator::css(&self.markup.any_element);
        if exact {
            locator.with_exact_text(text)
        } else {
            locator.containing_text(text)
        }
    }
}
