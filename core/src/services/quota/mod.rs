//! Daily match quota
//!
//! Counts resolutions per identity per calendar day in a configurable
//! reference timezone. Counters reset by day key, never by decrement.

mod config;
mod tracker;


pub use config::QuotaConfig;
pub use tracker::QuotaTracker;
