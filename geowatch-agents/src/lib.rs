//! Geowatch Agents
//!
//! The I/O side of the pipeline, behind narrow traits:
//! - **Providers**: news search and answer APIs (Valyu, OpenAI-compatible)
//! - **Geocoder**: places search results on the relationship graph
//! - **Collector**: builds the event feed from search results
//! - **Analyst**: asks for ripple effects and estimates the cascade
//! - **Dossier**: profiles a named entity from search results
//! - **Markets**: prediction-market overlays for the map
//!
//! ## Configuration
//!
//! Settings load from an optional TOML file, see [`config::AppConfig`].

pub mod analyst;
pub mod collector;
pub mod config;
pub mod dossier;
pub mod geocoder;
pub mod markets;
pub mod provider;
pub mod search;
pub mod traits;

pub use analyst::*;
pub use collector::*;
pub use config::*;
pub use dossier::*;
pub use geocoder::*;
pub use markets::*;
pub use provider::*;
pub use search::*;
pub use traits::*;
