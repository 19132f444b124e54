use {anyhow::Result, clap::Subcommand};

use ticketscope_config::{
    Diagnostic,
    validate::{self, Severity},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the config file and the resolved portal settings.
    Check {
        /// Also print informational diagnostics.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(verbose),
    }
}

fn check(verbose: bool) -> Result<()> {
    let mut result = validate::validate(None);
    match result.config_path {
        Some(ref path) => eprintln!("Checking {}", path.display()),
        None => eprintln!("No config file found; checking defaults and OSS_* environment"),
    }

    // The file can be valid and still leave the portal unreachable.
    let config = ticketscope_config::discover_and_load();
    if !config.portal.has_credentials() {
        result.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "portal",
            path: "portal".into(),
            message: "after environment overrides, url, username or password is still \
                      missing; scrapes will fail"
                .into(),
        });
    }

    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .for_each(|d| eprintln!("  {}", render(d)));

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
        return Ok(());
    }
    eprintln!("{errors} error(s), {warnings} warning(s)");
    if errors > 0 {
        anyhow::bail!("configuration is invalid");
    }
    Ok(())
}

fn render(d: &Diagnostic) -> String {
    let (color, label) = match d.severity {
        Severity::Error => ("31", "error"),
        Severity::Warning => ("33", "warning"),
        Severity::Info => ("36", "info"),
    };
    let label = format!("\x1b[1;{color}m{label}\x1b[0m");
    if d.path.is_empty() {
        format!("{label} {}", d.message)
    } else {
        format!("{label} {}: {}", d.path, d.message)
    }
}
