//! Backend REST contract and per-view request bookkeeping.

mod client;
mod endpoint;
mod sequencer;

pub use client::ApiClient;
pub use endpoint::{Endpoint, Query};
pub use sequencer::{RequestSequencer, Ticket, ViewState};
