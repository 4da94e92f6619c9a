//! Geowatch Core - event model, classification and cascade estimation
//!
//! This crate provides the pure, I/O-free pieces of the pipeline:
//! - Threat event types and the event feed
//! - Text normalization of scraped content
//! - Rule-based category and threat-level classification
//! - Keyword and entity extraction, event assembly
//! - The country relationship graph
//! - Cascade-effect estimation, local and from structured provider output
//! - Entity dossiers and prediction-market overlays

pub mod assemble;
pub mod cascade;
pub mod classify;
pub mod entity;
pub mod error;
pub mod event;
pub mod extract;
pub mod graph;
pub mod market;
pub mod normalize;
pub mod structured;
pub mod taxonomy;

pub use assemble::*;
pub use cascade::*;
pub use classify::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use extract::*;
pub use graph::*;
pub use market::*;
pub use normalize::*;
pub use structured::*;
pub use taxonomy::*;
