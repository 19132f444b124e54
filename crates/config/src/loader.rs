use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::TicketscopeConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "ticketscope.toml",
    "ticketscope.yaml",
    "ticketscope.yml",
    "ticketscope.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the user-global config directory (e.g. from `--config-dir`).
pub fn set_config_dir(path: PathBuf) {
    if let Ok(mut dir) = CONFIG_DIR_OVERRIDE.lock() {
        *dir = Some(path);
    }
}

/// Returns the user-global config directory (`~/.config/ticketscope/`), or
/// the override set with [`set_config_dir`].
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = CONFIG_DIR_OVERRIDE.lock()
        && let Some(ref path) = *dir
    {
        return Some(path.clone());
    }
    directories::ProjectDirs::from("", "", "ticketscope").map(|d| d.config_dir().to_path_buf())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<TicketscopeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply the
/// `OSS_*` environment overrides.
///
/// Search order:
/// 1. `./ticketscope.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/ticketscope/ticketscope.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `TicketscopeConfig::default()` if no file is found or the
/// file fails to parse.
pub fn discover_and_load() -> TicketscopeConfig {
    let config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                TicketscopeConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        TicketscopeConfig::default()
    };
    apply_env_overrides(config)
}

/// Overlay `OSS_URL`, `OSS_USERNAME`, `OSS_PASSWORD` and `OSS_JOB_CONTEXT`
/// from the process environment. Empty variables are ignored.
pub fn apply_env_overrides(config: TicketscopeConfig) -> TicketscopeConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: TicketscopeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> TicketscopeConfig {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("OSS_URL") {
        config.portal.url = Some(url);
    }
    if let Some(username) = get("OSS_USERNAME") {
        config.portal.username = Some(username);
    }
    if let Some(password) = get("OSS_PASSWORD") {
        config.portal.password = Some(Secret::new(password));
    }
    if let Some(context) = get("OSS_JOB_CONTEXT") {
        config.portal.job_context = context;
    }
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<TicketscopeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn loads_each_supported_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("ticketscope.toml");
        std::fs::write(&toml_path, "[server]\nport = 8088\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().server.port, 8088);

        let yaml_path = dir.path().join("ticketscope.yaml");
        std::fs::write(&yaml_path, "portal:\n  job_context: Night Shift\n").unwrap();
        assert_eq!(
            load_config(&yaml_path).unwrap().portal.job_context,
            "Night Shift"
        );

        let json_path = dir.path().join("ticketscope.json");
        std::fs::write(&json_path, r#"{"browser":{"headless":false}}"#).unwrap();
        assert!(!load_config(&json_path).unwrap().browser.headless);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticketscope.ini");
        std::fs::write(&path, "port=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut base = TicketscopeConfig::default();
        base.portal.url = Some("https://old.example.net".into());

        let config = apply_env_overrides_with(base, |name| match name {
            "OSS_URL" => Some("https://oss.example.net".into()),
            "OSS_USERNAME" => Some("ops".into()),
            "OSS_PASSWORD" => Some("hunter2".into()),
            "OSS_JOB_CONTEXT" => Some("   ".into()),
            _ => None,
        });

        assert_eq!(config.portal.url.as_deref(), Some("https://oss.example.net"));
        assert_eq!(config.portal.username.as_deref(), Some("ops"));
        assert_eq!(
            config.portal.password.as_ref().unwrap().expose_secret(),
            "hunter2"
        );
        // Blank values are ignored.
        assert_eq!(
            config.portal.job_context,
            crate::schema::DEFAULT_JOB_CONTEXT
        );
    }
}
