use std::sync::Arc;

use ticketscope_portal::TicketSource;

/// Shared, immutable handler state. Every request gets its own browser
/// session from `source`, so nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn TicketSource>,
    pub version: String,
}

impl AppState {
    pub fn new(source: Arc<dyn TicketSource>) -> Self {
        Self {
            source,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
