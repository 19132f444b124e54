//! Headless Chrome/Chromium driver for the ticket portal, over CDP.
//!
//! The portal workflow only ever talks to [`PageDriver`]; [`CdpDriver`] is the
//! production implementation and one driver equals one browser process, one
//! page and one private download directory.
//!
//! # Features
//!
//! - **locators**: CSS selectors refined by scope, visibility, rendered text,
//!   index and ancestor climbing, evaluated in the page
//! - **input**: real mouse/keyboard events via `Input.dispatch*`
//! - **waits**: polling readiness checks with explicit budgets
//! - **downloads**: click-triggered downloads captured into memory
//!
//! # Example
//!
//! ```ignore
//! use ticketscope_browser::{BrowserConfig, CdpLauncher, Locator, SessionLauncher};
//!
//! let launcher = CdpLauncher::new(BrowserConfig::default());
//! let driver = launcher.launch().await?;
//! driver.goto("https://oss.example.net").await?;
//! driver.click(&Locator::css("button").with_exact_text("OSS Login")).await?;
//! driver.close().await?;
//! ```

pub mod cdp;
pub mod detect;
pub mod driver;
pub mod error;
pub mod launch;
pub mod locator;
pub mod types;

pub use {
    cdp::CdpDriver,
    driver::{PageDriver, SessionLauncher},
    error::BrowserError,
    launch::CdpLauncher,
    locator::{Locator, TextFilter, TextMatch, normalize_text},
    types::{BrowserConfig, Download},
};
