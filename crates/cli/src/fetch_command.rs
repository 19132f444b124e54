//! One-shot scrape from the command line.

use {anyhow::Result, clap::Args};

use ticketscope_portal::{ScrapeRequest, TicketSource};

#[derive(Args)]
pub struct FetchArgs {
    /// Ticket type option, matched exactly (e.g. "Complaint").
    #[arg(long)]
    ticket_type: String,
    /// First accept date, YYYY-MM-DD.
    #[arg(long)]
    start_date: String,
    /// Last accept date, YYYY-MM-DD.
    #[arg(long)]
    end_date: String,
    /// Status radio label, matched ignoring case.
    #[arg(long, default_value = "Current")]
    status: String,
}

pub async fn handle_fetch(args: FetchArgs) -> Result<()> {
    let request =
        ScrapeRequest::parse(&args.ticket_type, &args.start_date, &args.end_date, &args.status)?;

    let config = ticketscope_config::discover_and_load();
    let scraper = crate::build_scraper(&config)?;

    let records = scraper.fetch(&request).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
