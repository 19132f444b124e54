//! CLI subcommands for the headless browser.

use {anyhow::Result, clap::Subcommand};

use ticketscope_browser::detect;

#[derive(Subcommand)]
pub enum BrowserAction {
    /// Show browser configuration and whether a Chromium binary is found.
    Status,
}

pub fn handle_browser(action: BrowserAction) -> Result<()> {
    match action {
        BrowserAction::Status => status(),
    }
}

fn status() -> Result<()> {
    let config = ticketscope_config::discover_and_load();
    let browser = &config.browser;

    println!("Browser configuration:");
    println!("  headless:       {}", browser.headless);
    println!(
        "  viewport:       {}x{}",
        browser.viewport_width, browser.viewport_height
    );
    println!("  timeout:        {}ms", browser.request_timeout_ms);
    println!("  ignore_tls:     {}", browser.ignore_certificate_errors);

    if let Some(ref path) = browser.chrome_path {
        println!("  chrome_path:    {path}");
    } else {
        println!("  chrome_path:    (auto-detect)");
    }

    let detection = detect::detect_browser(browser.chrome_path.as_deref());
    match detection.path {
        Some(ref path) if detection.found => println!("\nDetected: {}", path.display()),
        _ => {
            println!("\nNo Chromium-based browser found.\n");
            println!("{}", detection.install_hint);
            std::process::exit(1);
        },
    }

    Ok(())
}
