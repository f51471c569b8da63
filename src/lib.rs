#![doc(test(attr(deny(warnings))))]

//! Planner Core holds the scheduling and validation rules of a personal
//! budgeting client: recurrence of bills, interest accrual, variable
//! resolution against simulations, and the backend REST contract.

pub mod api;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod invalidation;
pub mod model;
pub mod resolve;
pub mod schedule;
pub mod transfer;
pub mod utils;
pub mod validation;

pub use errors::{FieldError, PlannerError, PlannerResult};

/// Initializes global tracing with the default filter.
pub fn init() {
    utils::init_tracing(None);
}

/// Initializes global tracing using the configured filter, if any.
pub fn init_with(config: &config::Config) {
    utils::init_tracing(config.log_filter.as_deref());
}
