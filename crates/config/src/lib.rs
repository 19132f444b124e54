//! Configuration loading, validation and env substitution.
//!
//! Config files: `ticketscope.toml`, `ticketscope.yaml`, `ticketscope.yml` or
//! `ticketscope.json`, searched in `./` then `~/.config/ticketscope/`.
//!
//! String values support `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution.
//! The portal URL and credentials can also come straight from the
//! environment (`OSS_URL`, `OSS_USERNAME`, `OSS_PASSWORD`, `OSS_JOB_CONTEXT`).

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        set_config_dir,
    },
    schema::{
        BrowserConfig, PortalConfig, PortalTimeouts, ServerConfig, TicketscopeConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
