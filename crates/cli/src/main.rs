mod browser_commands;
mod config_commands;
mod fetch_command;

use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    ticketscope_browser::CdpLauncher,
    ticketscope_config::TicketscopeConfig,
    ticketscope_gateway::AppState,
    ticketscope_portal::{PortalSettings, TicketScraper},
};

#[derive(Parser)]
#[command(name = "ticketscope", about = "ticketscope: trouble-ticket portal scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true, env = "PORT")]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/ticketscope/).
    #[arg(long, global = true, env = "TICKETSCOPE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default when no subcommand is provided).
    Serve,
    /// Run one scrape and print the records as JSON.
    Fetch(fetch_command::FetchArgs),
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Browser detection.
    Browser {
        #[command(subcommand)]
        action: browser_commands::BrowserAction,
    },
}

/// Logs go to stderr so `fetch` output on stdout stays machine-readable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Wire the production scraper: one headless Chromium per request.
pub(crate) fn build_scraper(
    config: &TicketscopeConfig,
) -> anyhow::Result<TicketScraper<CdpLauncher>> {
    let settings = PortalSettings::from_config(&config.portal)?;
    let launcher = CdpLauncher::new((&config.browser).into());
    Ok(TicketScraper::new(launcher, settings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(ref dir) = cli.config_dir {
        ticketscope_config::set_config_dir(dir.clone());
    }

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "ticketscope starting");
            let config = ticketscope_config::discover_and_load();

            // CLI args override config values
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);

            let scraper = build_scraper(&config)?;
            info!(
                portal = %scraper.settings().url,
                job_context = %scraper.settings().job_context,
                "portal configured"
            );
            ticketscope_gateway::start_server(&bind, port, AppState::new(Arc::new(scraper))).await
        },
        Some(Commands::Fetch(args)) => fetch_command::handle_fetch(args).await,
        Some(Commands::Config { action }) => config_commands::handle_config(action),
        Some(Commands::Browser { action }) => browser_commands::handle_browser(action),
    }
}
