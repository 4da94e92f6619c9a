//! Common traits for the external collaborators

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use geowatch_core::{ExternalPayload, GeoLocation, ParseError, RawMarketEvent};

use crate::{ProviderError, SearchResult};

/// Errors from agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl AgentError {
    /// Transient failures worth offering a retry for
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Timeout(_))
    }
}

/// A question for an answer provider
#[derive(Debug, Clone, Default)]
pub struct AnswerRequest {
    pub query: String,
    /// Source domains the provider should not cite
    pub excluded_sources: Vec<String>,
    /// JSON schema for structured output
    pub schema: Option<serde_json::Value>,
}

impl AnswerRequest {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn exclude(mut self, source: &str) -> Self {
        self.excluded_sources.push(source.to_string());
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// News search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ProviderError>;

    fn name(&self) -> &str;
}

/// Free-text or structured answers to a question
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answer(&self, request: &AnswerRequest) -> Result<ExternalPayload, ProviderError>;

    fn name(&self) -> &str;
}

/// Resolves a search result to a place
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when no place can be resolved
    async fn geocode(&self, title: &str, body: &str) -> Result<Option<GeoLocation>, ProviderError>;
}

/// One page of prediction-market events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub limit: usize,
    /// Exchange tag slug, all events when `None`
    pub tag: Option<String>,
}

impl MarketQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit, tag: None }
    }

    pub fn tagged(tag: &str, limit: usize) -> Self {
        Self {
            limit,
            tag: Some(tag.to_string()),
        }
    }
}

/// Open prediction-market events
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn events(&self, query: &MarketQuery) -> Result<Vec<RawMarketEvent>, ProviderError>;

    fn name(&self) -> &str;
}

pub type SharedSearch = Arc<dyn SearchProvider>;
pub type SharedAnswer = Arc<dyn AnswerProvider>;
pub type SharedGeocoder = Arc<dyn Geocoder>;
pub type SharedMarkets = Arc<dyn MarketSource>;
