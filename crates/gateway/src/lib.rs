//! HTTP front door for ticket queries.
//!
//! Routes:
//!
//! - `GET /api/tickets?ticketType=&startDate=&endDate=&radio=`
//! - `GET /health`

pub mod server;
pub mod state;
pub mod tickets;

pub use {
    server::{build_app, start_server},
    state::AppState,
};
