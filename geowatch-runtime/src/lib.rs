//! Geowatch Runtime
//!
//! Session state for one dashboard: the latest event feed, the selected
//! event's cascade, and the failure state shown when analysis fails.

pub mod dashboard;

pub use dashboard::*;
