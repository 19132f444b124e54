use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    thiserror::Error,
};

use ticketscope_config::{PortalConfig, PortalTimeouts};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("portal {field} is not configured (set {env} or `[portal] {field}`)")]
    Missing {
        field: &'static str,
        env: &'static str,
    },
}

/// Wait budgets for each kind of readiness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub navigation: Duration,
    pub login: Duration,
    pub quiescence: Duration,
    pub option: Duration,
    pub download: Duration,
}

impl From<&PortalTimeouts> for Timeouts {
    fn from(cfg: &PortalTimeouts) -> Self {
        Self {
            navigation: Duration::from_millis(cfg.navigation_ms),
            login: Duration::from_millis(cfg.login_ms),
            quiescence: Duration::from_millis(cfg.quiescence_ms),
            option: Duration::from_millis(cfg.option_ms),
            download: Duration::from_millis(cfg.download_ms),
        }
    }
}

/// Resolved portal location, credentials and budgets.
#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub url: String,
    pub username: String,
    pub password: Secret<String>,
    pub job_context: String,
    pub timeouts: Timeouts,
    pub max_paging_steps: u32,
}

impl PortalSettings {
    pub fn from_config(cfg: &PortalConfig) -> Result<Self, SettingsError> {
        let url = non_empty(cfg.url.as_deref()).ok_or(SettingsError::Missing {
            field: "url",
            env: "OSS_URL",
        })?;
        let username = non_empty(cfg.username.as_deref()).ok_or(SettingsError::Missing {
            field: "username",
            env: "OSS_USERNAME",
        })?;
        let password = cfg
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())
            .cloned()
            .ok_or(SettingsError::Missing {
                field: "password",
                env: "OSS_PASSWORD",
            })?;

        Ok(Self {
            url: url.to_string(),
            username: username.to_string(),
            password,
            job_context: cfg.job_context.trim().to_string(),
            timeouts: Timeouts::from(&cfg.timeouts),
            max_paging_steps: cfg.max_paging_steps,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
