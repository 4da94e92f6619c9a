//! Prediction-market overlays
//!
//! Events come from the Polymarket Gamma API behind [`MarketSource`]; the
//! filtering and ranking live in `geowatch_core::market`.
//! - Tag pages are fetched concurrently, a failed page is skipped
//! - Only when every page fails is the overlay an error
//! - Results are de-duplicated by market id and ordered by volume

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use geowatch_core::{
    country_markets, country_tags, matching_markets, open_markets, rank_by_volume,
    PredictionMarket, RawMarketEvent, PRIORITY_TAGS,
};

use crate::{AgentError, MarketQuery, MarketSource, ProviderError, SharedMarkets};

/// Events fetched per priority tag
pub const GEOPOLITICAL_TAG_LIMIT: usize = 30;

/// Events fetched per country tag
pub const COUNTRY_TAG_LIMIT: usize = 20;

/// Untagged events scanned by text searches
pub const SEARCH_FETCH_LIMIT: usize = 100;

/// Most text-matched markets added to a country overlay
pub const COUNTRY_SEARCH_CAP: usize = 10;

#[derive(Debug, Clone)]
pub struct GammaConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gamma-api.polymarket.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl GammaConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Gamma API client; no key needed
pub struct GammaClient {
    client: reqwest::Client,
    config: GammaConfig,
}

impl GammaClient {
    pub fn new(config: GammaConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn events(&self, query: &MarketQuery) -> Result<Vec<RawMarketEvent>, ProviderError> {
        let url = format!("{}/events", self.config.base_url);
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", "0".to_string()),
            ("closed", "false".to_string()),
        ];
        if let Some(tag) = &query.tag {
            params.push(("tag_slug", tag.clone()));
        }
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Api(format!("Gamma API error {}", status)));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        Ok(events_from_value(body))
    }

    fn name(&self) -> &str {
        "polymarket"
    }
}

/// Events of a listing payload; a payload that is not a list is empty and
/// malformed entries are skipped
pub fn events_from_value(value: Value) -> Vec<RawMarketEvent> {
    let Value::Array(items) = value else {
        warn!("Market listing is not an array, ignoring");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawMarketEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping malformed market event: {}", e);
                None
            }
        })
        .collect()
}

/// Create a shared Gamma market source
pub fn create_market_source(config: GammaConfig) -> Result<SharedMarkets, ProviderError> {
    Ok(Arc::new(GammaClient::new(config)?))
}

pub struct MarketWatcher {
    source: SharedMarkets,
    concurrency: usize,
}

impl MarketWatcher {
    pub fn new(source: SharedMarkets) -> Self {
        Self {
            source,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One page per query, in query order; a failed page is empty
    async fn fetch_pages(&self, queries: Vec<MarketQuery>) -> Result<Vec<Vec<RawMarketEvent>>, AgentError> {
        let outcomes: Vec<(MarketQuery, Result<Vec<RawMarketEvent>, ProviderError>)> = stream::iter(queries)
            .map(|query| async move {
                let outcome = self.source.events(&query).await;
                (query, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut last_error = None;
        let mut succeeded = 0;
        let mut pages = Vec::with_capacity(outcomes.len());

        for (query, outcome) in outcomes {
            match outcome {
                Ok(events) => {
                    debug!("{} market events for {:?}", events.len(), query.tag);
                    succeeded += 1;
                    pages.push(events);
                }
                Err(e) => {
                    warn!("Market fetch for {:?} failed: {}", query.tag, e);
                    last_error = Some(e);
                    pages.push(Vec::new());
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(AgentError::Provider(e)),
            _ => Ok(pages),
        }
    }

    /// Open markets under the priority geopolitical tags
    pub async fn geopolitical(&self, limit: usize) -> Result<Vec<PredictionMarket>, AgentError> {
        let queries = PRIORITY_TAGS
            .iter()
            .map(|tag| MarketQuery::tagged(tag, GEOPOLITICAL_TAG_LIMIT))
            .collect();

        let events: Vec<RawMarketEvent> = self.fetch_pages(queries).await?.into_iter().flatten().collect();
        let markets = rank_by_volume(open_markets(&events), limit);

        info!("{} geopolitical markets via {}", markets.len(), self.source.name());
        Ok(markets)
    }

    /// Markets that concern `country`: its tag pages plus a text scan of
    /// recent events
    pub async fn for_country(&self, country: &str, limit: usize) -> Result<Vec<PredictionMarket>, AgentError> {
        let mut queries: Vec<MarketQuery> = country_tags(country)
            .iter()
            .map(|tag| MarketQuery::tagged(tag, COUNTRY_TAG_LIMIT))
            .collect();
        queries.push(MarketQuery::new(SEARCH_FETCH_LIMIT));

        let mut pages = self.fetch_pages(queries).await?;
        let recent = pages.pop().unwrap_or_default();
        let tagged: Vec<RawMarketEvent> = pages.into_iter().flatten().collect();

        let mut markets = country_markets(&tagged, country);
        let mut searched = country_markets(&recent, country);
        searched.truncate(COUNTRY_SEARCH_CAP);
        markets.extend(searched);

        let markets = rank_by_volume(markets, limit);
        info!("{} markets for {}", markets.len(), country);
        Ok(markets)
    }

    /// Recent open markets mentioning `query`
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<PredictionMarket>, AgentError> {
        let events = self
            .source
            .events(&MarketQuery::new(SEARCH_FETCH_LIMIT))
            .await?;

        Ok(rank_by_volume(matching_markets(&events, query), limit))
    }
}
