//! Daily-price monitor for a rental-car booking form.
//!
//! [`fetcher::PriceFetcher`] drives a real browser through the booking
//! form and extracts the price of one vehicle; [`monitor::Monitor`] polls it,
//! logs every observation and mails the operator when the price moves.

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod form;
pub mod monitor;
pub mod services;

pub use config::{Config, FetchTarget};
pub use error::FetchError;
pub use fetcher::{get_current_price, PriceFetcher, RetryPolicy};
