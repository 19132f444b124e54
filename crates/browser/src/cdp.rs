//! [`PageDriver`] over the Chrome DevTools Protocol.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, Page,
        cdp::browser_protocol::input::{
            DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
            DispatchMouseEventType, MouseButton,
        },
    },
    serde::{Deserialize, de::DeserializeOwned},
    tempfile::TempDir,
    tokio::{
        sync::Mutex,
        task::JoinHandle,
        time::{Duration, Instant, sleep},
    },
    tracing::{debug, info, warn},
};

use crate::{
    driver::PageDriver,
    error::BrowserError,
    locator::{Locator, normalize_text},
    types::Download,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resource count must hold still this long to count as quiescent.
const QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Suffix Chrome gives a download that is still being written.
const PARTIAL_SUFFIX: &str = ".crdownload";

#[derive(Debug, Deserialize)]
struct Probe<T> {
    found: bool,
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoadState {
    ready: String,
    resources: u64,
}

/// Tracks how long the page has held a completed, unchanging resource count.
#[derive(Debug, Default)]
struct QuietTracker {
    stable_since: Option<(u64, Instant)>,
}

impl QuietTracker {
    /// Feed one poll result; `None` means the page could not be read (for
    /// example mid-navigation). Returns true once the page has been quiet for
    /// [`QUIET_WINDOW`].
    fn observe(&mut self, state: Option<&LoadState>, now: Instant) -> bool {
        match state {
            Some(state) if state.ready == "complete" => match self.stable_since {
                Some((resources, since)) if resources == state.resources => {
                    now.duration_since(since) >= QUIET_WINDOW
                },
                _ => {
                    self.stable_since = Some((state.resources, now));
                    false
                },
            },
            _ => {
                self.stable_since = None;
                false
            },
        }
    }
}

/// A launched browser process with a single page.
pub struct CdpDriver {
    session_id: String,
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    page: Page,
    downloads: TempDir,
    closed: AtomicBool,
}

impl CdpDriver {
    pub(crate) fn new(
        session_id: String,
        browser: Browser,
        handler: JoinHandle<()>,
        page: Page,
        downloads: TempDir,
    ) -> Self {
        Self {
            session_id,
            browser: Mutex::new(browser),
            handler,
            page,
            downloads,
            closed: AtomicBool::new(false),
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, BrowserError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))
    }

    /// Evaluate `body` against the resolved element and unwrap its probe.
    async fn probe<T: DeserializeOwned>(
        &self,
        target: &Locator,
        body: &str,
    ) -> Result<Option<T>, BrowserError> {
        let script = target.element_script(&format!(
            "if (!el) return {{ found: false }}; {body}"
        ));
        let probe: Probe<T> = self.eval(&script).await?;
        if !probe.found {
            return Err(BrowserError::ElementNotFound(target.to_string()));
        }
        Ok(probe.value)
    }

    /// Scroll the element into view and return its center point.
    async fn element_center(&self, target: &Locator) -> Result<(f64, f64), BrowserError> {
        self.probe::<bool>(
            target,
            "el.scrollIntoView({ block: 'center', inline: 'center' }); return { found: true };",
        )
        .await?;

        // Small delay for scroll to complete
        sleep(POLL_INTERVAL).await;

        let center: Option<[f64; 2]> = self
            .probe(
                target,
                "const r = el.getBoundingClientRect(); \
                 return { found: true, value: [r.x + r.width / 2, r.y + r.height / 2] };",
            )
            .await?;
        center
            .map(|[x, y]| (x, y))
            .ok_or_else(|| BrowserError::ElementNotFound(target.to_string()))
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        (x, y): (f64, f64),
        click_count: i64,
    ) -> Result<(), BrowserError> {
        let cmd = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(click_count)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.page.execute(cmd).await?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, c: char) -> Result<(), BrowserError> {
        let cmd = DispatchKeyEventParams::builder()
            .r#type(kind)
            .text(c.to_string())
            .build()
            .map_err(BrowserError::Cdp)?;
        self.page.execute(cmd).await?;
        Ok(())
    }

    async fn download_dir_entries(&self) -> Result<HashSet<PathBuf>, BrowserError> {
        let mut entries = HashSet::new();
        let mut dir = tokio::fs::read_dir(self.downloads.path()).await?;
        while let Some(entry) = dir.next_entry().await? {
            entries.insert(entry.path());
        }
        Ok(entries)
    }

    /// Poll the download directory until a new file appears, is no longer
    /// partial and keeps a stable size across two polls.
    async fn await_download(
        &self,
        existing: &HashSet<PathBuf>,
        budget: Duration,
    ) -> Result<PathBuf, BrowserError> {
        let deadline = Instant::now() + budget;
        let mut last_seen: Option<(PathBuf, u64)> = None;

        while Instant::now() < deadline {
            let finished = self
                .download_dir_entries()
                .await?
                .into_iter()
                .filter(|path| !existing.contains(path))
                .find(|path| !is_partial(path));

            if let Some(path) = finished {
                let size = tokio::fs::metadata(&path).await?.len();
                match &last_seen {
                    Some((seen, seen_size)) if *seen == path && *seen_size == size => {
                        return Ok(path);
                    },
                    _ => last_seen = Some((path, size)),
                }
            }

            sleep(POLL_INTERVAL).await;
        }

        Err(BrowserError::Timeout(format!(
            "download did not complete after {}ms",
            budget.as_millis()
        )))
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PARTIAL_SUFFIX))
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        validate_url(url)?;

        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;

        let current_url = self.page.url().await.ok().flatten().unwrap_or_default();
        info!(session_id = %self.session_id, url = %current_url, "navigated to URL");
        Ok(())
    }

    async fn fill(&self, target: &Locator, value: &str) -> Result<(), BrowserError> {
        self.probe::<bool>(
            target,
            "el.focus(); if (typeof el.select === 'function') el.select(); return { found: true };",
        )
        .await?;

        for c in value.chars() {
            self.dispatch_key(DispatchKeyEventType::KeyDown, c).await?;
            self.dispatch_key(DispatchKeyEventType::KeyUp, c).await?;
        }

        debug!(session_id = %self.session_id, target = %target, chars = value.len(), "filled input");
        Ok(())
    }

    async fn click(&self, target: &Locator) -> Result<(), BrowserError> {
        let point = self.element_center(target).await?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, point, 1)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, point, 1)
            .await?;

        debug!(session_id = %self.session_id, target = %target, x = point.0, y = point.1, "clicked element");
        Ok(())
    }

    async fn double_click(&self, target: &Locator) -> Result<(), BrowserError> {
        let point = self.element_center(target).await?;
        for click_count in 1..=2 {
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, point, click_count)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, point, click_count)
                .await?;
        }

        debug!(session_id = %self.session_id, target = %target, "double-clicked element");
        Ok(())
    }

    async fn activate(&self, target: &Locator) -> Result<(), BrowserError> {
        self.probe::<bool>(
            target,
            "el.dispatchEvent(new MouseEvent('mousedown', { bubbles: true, cancelable: true, view: window })); \
             el.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window })); \
             return { found: true };",
        )
        .await?;

        debug!(session_id = %self.session_id, target = %target, "activated element");
        Ok(())
    }

    async fn count(&self, target: &Locator) -> Result<usize, BrowserError> {
        self.eval(&target.elements_script("return els.length;"))
            .await
    }

    async fn text(&self, target: &Locator) -> Result<String, BrowserError> {
        let text: Option<String> = self
            .probe(target, "return { found: true, value: el.textContent || '' };")
            .await?;
        Ok(normalize_text(&text.unwrap_or_default()))
    }

    async fn attribute(
        &self,
        target: &Locator,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let body = format!(
            "return {{ found: true, value: el.getAttribute({}) }};",
            serde_json::Value::from(name)
        );
        self.probe(target, &body).await
    }

    async fn wait_for(&self, target: &Locator, budget: Duration) -> Result<(), BrowserError> {
        let check_js = target.element_script("return el !== null;");
        let deadline = Instant::now() + budget;

        while Instant::now() < deadline {
            let found: bool = self.eval(&check_js).await.unwrap_or(false);
            if found {
                debug!(session_id = %self.session_id, target = %target, "element found");
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }

        Err(BrowserError::Timeout(format!(
            "{target} not found after {}ms",
            budget.as_millis()
        )))
    }

    async fn wait_for_quiescence(&self, budget: Duration) -> Result<(), BrowserError> {
        const CHECK_JS: &str = "({ ready: document.readyState, \
                                resources: performance.getEntriesByType('resource').length })";
        let deadline = Instant::now() + budget;
        let mut tracker = QuietTracker::default();

        while Instant::now() < deadline {
            let state = match self.eval::<LoadState>(CHECK_JS).await {
                Ok(state) => Some(state),
                Err(e) => {
                    debug!(session_id = %self.session_id, error = %e, "page not readable yet");
                    None
                },
            };
            if tracker.observe(state.as_ref(), Instant::now()) {
                debug!(session_id = %self.session_id, "page quiescent");
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }

        Err(BrowserError::Timeout(format!(
            "page still busy after {}ms",
            budget.as_millis()
        )))
    }

    async fn click_and_download(
        &self,
        target: &Locator,
        budget: Duration,
    ) -> Result<Download, BrowserError> {
        let existing = self.download_dir_entries().await?;

        let (_, path) = tokio::try_join!(self.click(target), self.await_download(&existing, budget))?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| BrowserError::DownloadFailed(format!("{}: {e}", path.display())))?;
        let suggested_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        info!(
            session_id = %self.session_id,
            file = suggested_filename.as_deref().unwrap_or_default(),
            bytes = bytes.len(),
            "captured download"
        );
        Ok(Download {
            suggested_filename,
            bytes,
        })
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut browser = self.browser.lock().await;
        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!(session_id = %self.session_id, error = %e, "browser process did not exit cleanly");
        }
        self.handler.abort();

        info!(session_id = %self.session_id, "closed browser session");
        result.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Validate a URL before attempting navigation.
fn validate_url(url: &str) -> Result<(), BrowserError> {
    if url.is_empty() {
        return Err(BrowserError::InvalidAction(
            "URL cannot be empty".to_string(),
        ));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        BrowserError::InvalidAction(format!("invalid URL '{}': {}", truncate_url(url), e))
    })?;

    match parsed.scheme() {
        "http" | "https" => {},
        scheme => {
            return Err(BrowserError::InvalidAction(format!(
                "unsupported URL scheme '{}', only http/https allowed",
                scheme
            )));
        },
    }

    Ok(())
}

/// Truncate a URL for error messages.
fn truncate_url(url: &str) -> String {
    match url.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://oss.example.net").is_ok());
        assert!(validate_url("http://10.0.0.5:8080/portal/").is_ok());
    }

    #[test]
    fn validate_url_rejects_bad_input() {
        assert!(validate_url("").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn truncate_url_respects_char_boundaries() {
        let long = "é".repeat(150);
        let truncated = truncate_url(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 103);
        assert_eq!(truncate_url("short"), "short");
    }

    fn complete(resources: u64) -> LoadState {
        LoadState {
            ready: "complete".into(),
            resources,
        }
    }

    #[test]
    fn quiet_after_window_of_stable_resources() {
        let start = Instant::now();
        let mut tracker = QuietTracker::default();
        assert!(!tracker.observe(Some(&complete(4)), start));
        assert!(!tracker.observe(Some(&complete(4)), start + Duration::from_millis(200)));
        assert!(tracker.observe(Some(&complete(4)), start + QUIET_WINDOW));
    }

    #[test]
    fn unreadable_page_restarts_the_window() {
        let start = Instant::now();
        let mut tracker = QuietTracker::default();
        assert!(!tracker.observe(Some(&complete(4)), start));
        // Navigation tore down the context between polls.
        assert!(!tracker.observe(None, start + Duration::from_millis(300)));
        assert!(!tracker.observe(Some(&complete(4)), start + QUIET_WINDOW));
        assert!(tracker.observe(
            Some(&complete(4)),
            start + QUIET_WINDOW + QUIET_WINDOW
        ));
    }

    #[test]
    fn loading_or_changing_resources_is_not_quiet() {
        let start = Instant::now();
        let mut tracker = QuietTracker::default();
        let loading = LoadState {
            ready: "loading".into(),
            resources: 4,
        };
        assert!(!tracker.observe(Some(&loading), start));
        assert!(!tracker.observe(Some(&complete(4)), start + QUIET_WINDOW));
        assert!(!tracker.observe(Some(&complete(5)), start + QUIET_WINDOW * 2));
        assert!(tracker.observe(Some(&complete(5)), start + QUIET_WINDOW * 3));
    }

    #[test]
    fn probe_without_value_decodes_to_none() {
        let probe: Probe<[f64; 2]> = serde_json::from_str(r#"{"found": false}"#).unwrap();
        assert!(!probe.found);
        assert!(probe.value.is_none());

        let probe: Probe<String> =
            serde_json::from_str(r#"{"found": true, "value": "Jan"}"#).unwrap();
        assert_eq!(probe.value.as_deref(), Some("Jan"));

        let probe: Probe<String> = serde_json::from_str(r#"{"found":true,"value":null}"#).unwrap();
        assert!(probe.found);
        assert!(probe.value.is_none());
    }

    #[test]
    fn partial_downloads_are_recognized() {
        assert!(is_partial(Path::new("/tmp/x/tickets.csv.crdownload")));
        assert!(!is_partial(Path::new("/tmp/x/tickets.csv")));
    }
}
