//! Launching isolated host browser sessions.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig,
        cdp::browser_protocol::browser::{SetDownloadBehaviorBehavior, SetDownloadBehaviorParams},
        handler::viewport::Viewport,
    },
    futures::StreamExt,
    tracing::{debug, info},
};

use crate::{
    cdp::CdpDriver,
    detect,
    driver::{PageDriver, SessionLauncher},
    error::BrowserError,
    types::BrowserConfig,
};

/// Launches one fresh headless browser per session on the host.
#[derive(Debug, Clone)]
pub struct CdpLauncher {
    config: BrowserConfig,
}

impl CdpLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// The binary to launch: the configured path if it exists, otherwise the
    /// first detected install.
    fn resolve_executable(&self) -> Result<PathBuf, BrowserError> {
        let detection = detect::detect_browser(self.config.chrome_path.as_deref());
        detection
            .path
            .ok_or(BrowserError::BrowserNotAvailable(detection.install_hint))
    }

    fn browser_config(
        &self,
        session_id: &str,
        executable: &Path,
    ) -> Result<CdpBrowserConfig, BrowserError> {
        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless unless asked otherwise
        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .viewport(Viewport {
                width: self.config.viewport_width,
                height: self.config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(self.config.request_timeout);

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        builder = builder.chrome_executable(executable);

        if self.config.ignore_certificate_errors {
            builder = builder.arg("--ignore-certificate-errors");
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        debug!(
            session_id,
            executable = %executable.display(),
            headless = self.config.headless,
            viewport_width = self.config.viewport_width,
            viewport_height = self.config.viewport_height,
            "configured browser"
        );

        builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })
    }
}

#[async_trait]
impl SessionLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, BrowserError> {
        let executable = self.resolve_executable()?;
        let session_id = generate_session_id();
        let config = self.browser_config(&session_id, &executable)?;

        let (mut browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            let install_hint = detect::install_instructions();
            BrowserError::LaunchFailed(format!("browser launch failed: {e}\n\n{install_hint}"))
        })?;

        let handler_session = session_id.clone();
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!(session_id = %handler_session, ?event, "browser event");
            }
        });

        match open_page(&browser).await {
            Ok((page, downloads)) => {
                info!(
                    session_id = %session_id,
                    downloads = %downloads.path().display(),
                    "launched browser session"
                );
                Ok(Box::new(CdpDriver::new(
                    session_id, browser, handler, page, downloads,
                )))
            },
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                Err(e)
            },
        }
    }
}

/// Open the working page and route its downloads into a private directory.
async fn open_page(
    browser: &Browser,
) -> Result<(chromiumoxide::Page, tempfile::TempDir), BrowserError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    let downloads = tempfile::Builder::new()
        .prefix("ticketscope-downloads-")
        .tempdir()?;

    let cmd = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(downloads.path().to_string_lossy().into_owned())
        .build()
        .map_err(BrowserError::Cdp)?;
    page.execute(cmd).await?;

    Ok((page, downloads))
}

/// Generate a random session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let id: u64 = rng.random();
    format!("browser-{:016x}", id)
}
