//! Dashboard Coordinator
//!
//! Owns one dashboard session:
//! - The shared, read-only relationship graph
//! - The providers, pre-constructed by the caller
//! - The latest event feed and the current cascade state
//!
//! Each cascade request replaces the previous state. Transient failures
//! become a retryable `Failed` state; malformed provider output does not.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use geowatch_agents::{
    AgentError, CascadeAnalyst, CascadeMode, CollectorConfig, EventCollector, GraphGeocoder,
    SharedAnswer, SharedGeocoder, SharedSearch,
};
use geowatch_core::{CascadeAnalysis, EventFeed, JitterSource, RandJitter, RelationshipGraph, ThreatEvent};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("No search provider configured")]
    NoSearchProvider,

    #[error("No event with id {0} in the current feed")]
    UnknownEvent(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Dashboard configuration
pub struct DashboardConfig {
    pub graph: Arc<RelationshipGraph>,
    /// Needed for event feeds only
    pub search: Option<SharedSearch>,
    /// Without one, cascades run offline
    pub answer: Option<SharedAnswer>,
    /// Defaults to the graph geocoder
    pub geocoder: Option<SharedGeocoder>,
    pub collector: CollectorConfig,
    /// Empty for the built-in threat queries
    pub queries: Vec<String>,
    /// Bound on one provider round trip
    pub timeout: Duration,
    /// Ask for structured output instead of free text
    pub structured: bool,
}

impl DashboardConfig {
    pub fn new(graph: Arc<RelationshipGraph>) -> Self {
        Self {
            graph,
            search: None,
            answer: None,
            geocoder: None,
            collector: CollectorConfig::default(),
            queries: Vec::new(),
            timeout: Duration::from_secs(60),
            structured: false,
        }
    }
}

/// What the cascade panel shows
#[derive(Debug, Clone)]
pub enum CascadeState {
    Idle,
    Ready(Box<CascadeAnalysis>),
    Failed { message: String, retryable: bool },
}

impl CascadeState {
    pub fn analysis(&self) -> Option<&CascadeAnalysis> {
        match self {
            Self::Ready(analysis) => Some(analysis),
            _ => None,
        }
    }
}

pub struct Dashboard {
    collector: Option<EventCollector>,
    analyst: CascadeAnalyst,
    queries: Vec<String>,
    mode: CascadeMode,
    jitter: Box<dyn JitterSource + Send>,
    feed: Option<EventFeed>,
    state: CascadeState,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let geocoder = config
            .geocoder
            .unwrap_or_else(|| Arc::new(GraphGeocoder::new(config.graph.clone())) as SharedGeocoder);

        let collector = config
            .search
            .map(|search| EventCollector::new(search, geocoder, config.collector));

        let mode = match (&config.answer, config.structured) {
            (None, _) => CascadeMode::Offline,
            (Some(_), true) => CascadeMode::Structured,
            (Some(_), false) => CascadeMode::FreeText,
        };

        let analyst = CascadeAnalyst::new(config.graph, config.answer).with_timeout(config.timeout);

        info!("Dashboard ready ({:?} cascades)", mode);

        Self {
            collector,
            analyst,
            queries: config.queries,
            mode,
            jitter: Box::new(RandJitter::from_entropy()),
            feed: None,
            state: CascadeState::Idle,
        }
    }

    /// Replace the jitter source
    pub fn with_jitter(mut self, jitter: Box<dyn JitterSource + Send>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn mode(&self) -> CascadeMode {
        self.mode
    }

    pub fn feed(&self) -> Option<&EventFeed> {
        self.feed.as_ref()
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn find_event(&self, id: &str) -> Option<&ThreatEvent> {
        self.feed.as_ref()?.events.iter().find(|e| e.id == id)
    }

    /// Fetch a fresh feed; the previous feed is kept on failure
    pub async fn refresh_events(&mut self) -> Result<&EventFeed, DashboardError> {
        let collector = self
            .collector
            .as_ref()
            .ok_or(DashboardError::NoSearchProvider)?;

        let feed = collector.collect(&self.queries).await.map_err(|e| {
            warn!("Event refresh failed: {}", e);
            e
        })?;

        info!("Feed refreshed: {} events", feed.count);
        Ok(self.feed.insert(feed))
    }

    /// Analyze `event` in the dashboard's mode
    pub async fn analyze_cascade(&mut self, event: &ThreatEvent) -> &CascadeState {
        let mode = self.mode;
        self.analyze_with(event, mode).await
    }

    /// Analyze `event` in an explicit mode
    pub async fn analyze_with(&mut self, event: &ThreatEvent, mode: CascadeMode) -> &CascadeState {
        self.state = match self.analyst.analyze(event, mode, self.jitter.as_mut()).await {
            Ok(analysis) => CascadeState::Ready(Box::new(analysis)),
            Err(e) => {
                error!("Cascade analysis for {} failed: {}", event.id, e);
                let retryable = e.is_retryable();
                let message = if retryable {
                    format!("Analysis failed, retry: {}", e)
                } else {
                    format!("Analysis failed: {}", e)
                };
                CascadeState::Failed { message, retryable }
            }
        };

        &self.state
    }

    /// Analyze a feed event by id
    pub async fn analyze_event(&mut self, id: &str) -> Result<&CascadeState, DashboardError> {
        let event = self
            .find_event(id)
            .cloned()
            .ok_or_else(|| DashboardError::UnknownEvent(id.to_string()))?;

        Ok(self.analyze_cascade(&event).await)
    }

    pub fn reset(&mut self) {
        self.state = CascadeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use geowatch_agents::{
        AnswerProvider, AnswerRequest, ProviderError, SearchProvider, SearchResult,
    };
    use geowatch_core::{ExternalPayload, SequenceJitter};

    struct FakeSearch;

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
            let mut result = SearchResult::new(
                &format!("Border clash reported in Ukraine ({})", query),
                "https://example.com/clash",
                "Troops exchanged fire overnight.",
            );
            result.published_date = Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
            Ok(vec![result])
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FakeAnswer(Result<ExternalPayload, fn() -> ProviderError>);

    #[async_trait]
    impl AnswerProvider for FakeAnswer {
        async fn answer(&self, _request: &AnswerRequest) -> Result<ExternalPayload, ProviderError> {
            match &self.0 {
                Ok(payload) => Ok(payload.clone()),
                Err(make) => Err(make()),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn dashboard(answer: Option<FakeAnswer>, structured: bool) -> Dashboard {
        let mut config = DashboardConfig::new(Arc::new(RelationshipGraph::builtin()));
        config.search = Some(Arc::new(FakeSearch));
        config.answer = answer.map(|a| Arc::new(a) as SharedAnswer);
        config.queries = vec!["q1".to_string(), "q2".to_string()];
        config.structured = structured;
        Dashboard::new(config).with_jitter(Box::new(SequenceJitter::constant(0.5)))
    }

    #[tokio::test]
    async fn test_refresh_then_analyze_offline() {
        let mut dashboard = dashboard(None, false);
        assert_eq!(dashboard.mode(), CascadeMode::Offline);
        assert!(matches!(dashboard.state(), CascadeState::Idle));

        let feed = dashboard.refresh_events().await.unwrap();
        assert_eq!(feed.count, 2);
        let id = feed.events[0].id.clone();

        let state = dashboard.analyze_event(&id).await.unwrap();
        let analysis = state.analysis().unwrap();
        assert_eq!(analysis.source_event.id, id);
        assert!(analysis.effects.iter().any(|e| e.target_country == "Russia"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_retryable() {
        let answer = FakeAnswer(Err(|| ProviderError::Network("connection refused".to_string())));
        let mut dashboard = dashboard(Some(answer), false);
        let feed = dashboard.refresh_events().await.unwrap();
        let event = feed.events[0].clone();

        match dashboard.analyze_cascade(&event).await {
            CascadeState::Failed { message, retryable } => {
                assert!(*retryable);
                assert!(message.starts_with("Analysis failed, retry"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_failure_is_not_retryable() {
        let answer = FakeAnswer(Ok(ExternalPayload::Text("not json".to_string())));
        let mut dashboard = dashboard(Some(answer), true);
        assert_eq!(dashboard.mode(), CascadeMode::Structured);
        let feed = dashboard.refresh_events().await.unwrap();
        let event = feed.events[0].clone();

        let state = dashboard.analyze_cascade(&event).await;
        assert!(matches!(state, CascadeState::Failed { retryable: false, .. }));
    }

    #[tokio::test]
    async fn test_new_request_supersedes_failure() {
        let answer = FakeAnswer(Ok(ExternalPayload::Text("not json".to_string())));
        let mut dashboard = dashboard(Some(answer), true);
        let feed = dashboard.refresh_events().await.unwrap();
        let event = feed.events[0].clone();

        dashboard.analyze_cascade(&event).await;
        let state = dashboard.analyze_with(&event, CascadeMode::Offline).await;
        assert!(state.analysis().is_some());

        dashboard.reset();
        assert!(matches!(dashboard.state(), CascadeState::Idle));
    }

    #[tokio::test]
    async fn test_refresh_without_search_provider() {
        let mut dashboard = Dashboard::new(DashboardConfig::new(Arc::new(RelationshipGraph::builtin())));
        let err = dashboard.refresh_events().await.unwrap_err();
        assert!(matches!(err, DashboardError::NoSearchProvider));
        assert!(dashboard.feed().is_none());
    }

    #[tokio::test]
    async fn test_unknown_event_id() {
        let mut dashboard = dashboard(None, false);
        dashboard.refresh_events().await.unwrap();
        let err = dashboard.analyze_event("evt-missing").await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownEvent(_)));
    }
}
