//! Decoding of the portal's CSV export into ordered ticket records.
//!
//! The first row is the header; every following non-empty row becomes one
//! [`TicketRecord`] keyed by the header columns, in file order.

pub mod decode;
pub mod error;
pub mod record;

pub use {decode::decode, error::DecodeError, record::TicketRecord};
