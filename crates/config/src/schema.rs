//! Config schema types (server, browser, portal).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Operating context the portal asks for right after login.
pub const DEFAULT_JOB_CONTEXT: &str = "CSD-Dunning-Orders-Handlers-Team(oss)";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketscopeConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub portal: PortalConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Headless browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Per-command CDP timeout in milliseconds.
    pub request_timeout_ms: u64,
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// The portal is commonly served with an internal CA.
    pub ignore_certificate_errors: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            request_timeout_ms: 30_000,
            user_agent: None,
            chrome_args: Vec::new(),
            ignore_certificate_errors: true,
        }
    }
}

/// Portal location, credentials and wait budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Login page URL.
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
    /// Exact label of the job context to enter after login.
    pub job_context: String,
    pub timeouts: PortalTimeouts,
    /// Upper bound on calendar paging clicks per loop (year or month).
    pub max_paging_steps: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            job_context: DEFAULT_JOB_CONTEXT.into(),
            timeouts: PortalTimeouts::default(),
            max_paging_steps: 240,
        }
    }
}

impl PortalConfig {
    /// True when URL, username and password are all present.
    pub fn has_credentials(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
            && self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self
                .password
                .as_ref()
                .is_some_and(|p| !p.expose_secret().is_empty())
    }
}

/// Wait budgets, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalTimeouts {
    /// Readiness signals between navigation phases (element present).
    pub navigation_ms: u64,
    /// Post-login prompt.
    pub login_ms: u64,
    /// Network/render quiescence after a navigation action.
    pub quiescence_ms: u64,
    /// Dropdown option list rendering and matching.
    pub option_ms: u64,
    /// Export download start to completion.
    pub download_ms: u64,
}

impl Default for PortalTimeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            login_ms: 30_000,
            quiescence_ms: 30_000,
            option_ms: 10_000,
            download_ms: 60_000,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
