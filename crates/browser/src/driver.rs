//! The page-level contract the portal workflow is written against.

use std::time::Duration;

use async_trait::async_trait;

use crate::{error::BrowserError, locator::Locator, types::Download};

/// One page in one isolated browser session.
///
/// Element operations resolve their [`Locator`] at call time and fail with
/// [`BrowserError::ElementNotFound`] when nothing matches. Waits fail with
/// [`BrowserError::Timeout`] once their budget is spent.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Replace the value of an input by typing into it.
    async fn fill(&self, target: &Locator, value: &str) -> Result<(), BrowserError>;

    /// Real pointer click at the element's center.
    async fn click(&self, target: &Locator) -> Result<(), BrowserError>;

    async fn double_click(&self, target: &Locator) -> Result<(), BrowserError>;

    /// Synthetic `mousedown` followed by `click` dispatched on the element.
    /// Opens widgets that ignore plain clicks.
    async fn activate(&self, target: &Locator) -> Result<(), BrowserError>;

    /// Number of filtered matches, ignoring the locator's index.
    async fn count(&self, target: &Locator) -> Result<usize, BrowserError>;

    /// Normalized rendered text of the element.
    async fn text(&self, target: &Locator) -> Result<String, BrowserError>;

    /// Attribute value, `None` when the element lacks it.
    async fn attribute(&self, target: &Locator, name: &str)
    -> Result<Option<String>, BrowserError>;

    async fn wait_for(&self, target: &Locator, budget: Duration) -> Result<(), BrowserError>;

    /// Wait until the document is loaded and network activity has settled.
    async fn wait_for_quiescence(&self, budget: Duration) -> Result<(), BrowserError>;

    /// Click `target` and capture the download it triggers.
    async fn click_and_download(
        &self,
        target: &Locator,
        budget: Duration,
    ) -> Result<Download, BrowserError>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Starts a fresh, isolated session per call.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, BrowserError>;
}
