//! Dropdown and radio selection.

use std::time::Duration;

use tracing::debug;

use ticketscope_browser::{Locator, PageDriver};

use crate::{
    error::ScrapeError, markup::PortalMarkup, request::StatusFilter, settings::PortalSettings,
};

const PHASE: &str = "option list";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct FilterSelector<'a> {
    driver: &'a dyn PageDriver,
    markup: &'a PortalMarkup,
    settings: &'a PortalSettings,
}

impl<'a> FilterSelector<'a> {
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

    /// Pick `option_text` in the dropdown labelled `label_text`.
    ///
    /// Both texts must match the rendered text exactly (whitespace
    /// normalized, case-sensitive).
    pub async fn select_option(&self, label_text: &str, option_text: &str) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(PHASE, e);
        let not_found = || ScrapeError::OptionNotFound {
            label: label_text.to_string(),
            option: option_text.to_string(),
        };

        let label = Locator::css(&self.markup.field_label).with_exact_text(label_text);
        if self.driver.count(&label).await.map_err(browser)? == 0 {
            return Err(not_found());
        }
        let Some(control_id) = self
            .driver
            .attribute(&label, "for")
            .await
            .map_err(browser)?
            .filter(|id| !id.trim().is_empty())
        else {
            return Err(not_found());
        };

        let trigger = Locator::css(id_selector(&control_id))
            .climb(&self.markup.select_container, &self.markup.select_trigger);
        self.driver.activate(&trigger).await.map_err(browser)?;

        let options = Locator::css(&self.markup.select_option).visible();
        self.driver
            .wait_for(&options, self.settings.timeouts.option)
            .await
            .map_err(browser)?;

        let wanted = options.with_exact_text(option_text);
        let deadline = tokio::time::Instant::now() + self.settings.timeouts.option;
        loop {
            if self.driver.count(&wanted).await.map_err(browser)? > 0 {
                self.driver.click(&wanted).await.map_err(browser)?;
                debug!(label = label_text, option = option_text, "option selected");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(not_found());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Click the status radio whose label equals `status`, ignoring case.
    pub async fn select_radio(&self, status: &StatusFilter) -> Result<(), ScrapeError> {
        let radio = Locator::css(&self.markup.status_radio).with_text_ignore_case(status.label());
        let browser = |e| ScrapeError::from_browser("status radio", e);

        if self.driver.count(&radio).await.map_err(browser)? == 0 {
            return Err(ScrapeError::OptionNotFound {
                label: self.markup.status_label.clone(),
                option: status.label().to_string(),
            });
        }
        self.driver.click(&radio).await.map_err(browser)?;

        debug!(%status, "status radio selected");
        Ok(())
    }
}

/// Attribute selector for an element id; ids from the page are not always
/// valid CSS identifiers.
fn id_selector(id: &str) -> String {
    format!(
        r#"[id="{}"]"#,
        id.replace('\\', r"\\").replace('"', r#"\""#)
    )
}
