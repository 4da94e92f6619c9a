//! Event feed collector
//!
//! Search -> geocode -> assemble -> dedup -> sort:
//! - Queries run concurrently, results keep query order
//! - Each result is geocoded and assembled independently
//! - Results without a resolvable location are dropped
//! - Duplicate titles collapse to their first occurrence
//! - The feed is ordered newest first

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use geowatch_core::{EventDraft, EventFeed, ThreatEvent};

use crate::{AgentError, ProviderError, SearchResult, SharedGeocoder, SharedSearch};

/// Built-in threat queries
pub const THREAT_QUERIES: [&str; 7] = [
    "breaking news conflict military",
    "geopolitical crisis tensions",
    "protest demonstration unrest",
    "natural disaster emergency",
    "terrorism attack security",
    "cyber attack breach",
    "diplomatic summit sanctions",
];

/// Built-in queries used when the caller supplies none
pub const DEFAULT_QUERY_COUNT: usize = 3;

/// Most caller-supplied queries run per collection
pub const MAX_QUERIES: usize = 5;

/// Queries to run: the caller's first five, or the default three
pub fn select_queries(requested: &[String]) -> Vec<String> {
    let requested: Vec<String> = requested
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .take(MAX_QUERIES)
        .map(str::to_string)
        .collect();

    if requested.is_empty() {
        THREAT_QUERIES[..DEFAULT_QUERY_COUNT]
            .iter()
            .map(|q| q.to_string())
            .collect()
    } else {
        requested
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Results requested per query
    pub max_results: usize,
    /// Concurrent searches and geocodes
    pub concurrency: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_results: 15,
            concurrency: 4,
        }
    }
}

pub struct EventCollector {
    search: SharedSearch,
    geocoder: SharedGeocoder,
    config: CollectorConfig,
}

impl EventCollector {
    pub fn new(search: SharedSearch, geocoder: SharedGeocoder, config: CollectorConfig) -> Self {
        Self {
            search,
            geocoder,
            config,
        }
    }

    /// Collect a feed for `queries` (empty for the built-in defaults).
    ///
    /// Failed queries are skipped; only when every query fails is the
    /// collection an error.
    pub async fn collect(&self, queries: &[String]) -> Result<EventFeed, AgentError> {
        let queries = select_queries(queries);
        let concurrency = self.config.concurrency.max(1);

        info!(
            "Collecting events for {} queries via {}",
            queries.len(),
            self.search.name()
        );

        let outcomes: Vec<(String, Result<Vec<SearchResult>, ProviderError>)> = stream::iter(queries)
            .map(|query| async move {
                let outcome = self.search.search(&query, self.config.max_results).await;
                (query, outcome)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut last_error = None;
        let mut results = Vec::new();

        for (query, outcome) in outcomes {
            match outcome {
                Ok(hits) => {
                    debug!("{} results for {:?}", hits.len(), query);
                    results.extend(hits);
                }
                Err(e) => {
                    warn!("Search for {:?} failed: {}", query, e);
                    last_error = Some(e);
                }
            }
        }

        if results.is_empty() {
            if let Some(e) = last_error {
                return Err(AgentError::Provider(e));
            }
        }

        let total = results.len();
        let events: Vec<ThreatEvent> = stream::iter(results)
            .map(|result| self.to_event(result))
            .buffered(concurrency)
            .filter_map(|event| async { event })
            .collect()
            .await;

        let located = events.len();
        let feed = EventFeed::from_events(events);

        info!(
            "Collected {} events ({} results, {} located)",
            feed.count, total, located
        );

        Ok(feed)
    }

    async fn to_event(&self, result: SearchResult) -> Option<ThreatEvent> {
        let content = result.plain_content();

        let location = match self.geocoder.geocode(&result.title, &content).await {
            Ok(Some(location)) if !location.is_unresolved() => location,
            Ok(_) => {
                debug!("No location for {:?}", result.title);
                return None;
            }
            Err(e) => {
                warn!("Geocoding {:?} failed: {}", result.title, e);
                return None;
            }
        };

        let mut draft = EventDraft::new(&result.title, &content, location, result.source_or_default())
            .source_url(&result.url);
        if let Some(published) = result.published_date {
            draft = draft.timestamp(published);
        }

        match draft.assemble() {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Rejected {:?}: {}", result.title, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphGeocoder, SearchProvider};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use geowatch_core::RelationshipGraph;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FakeSearch {
        responses: HashMap<String, Vec<SearchResult>>,
        failing: Vec<String>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                failing: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn respond(mut self, query: &str, results: Vec<SearchResult>) -> Self {
            self.responses.insert(query.to_string(), results);
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.failing.push(query.to_string());
            self
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
            self.seen.lock().unwrap().push(query.to_string());
            if self.failing.iter().any(|q| q == query) {
                return Err(ProviderError::Network("connection reset".to_string()));
            }
            Ok(self.responses.get(query).cloned().unwrap_or_default())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn hit(title: &str, content: &str, day: u32) -> SearchResult {
        let mut result = SearchResult::new(title, "https://example.com/story", content);
        result.published_date = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
        result
    }

    fn collector(search: FakeSearch) -> (EventCollector, Arc<FakeSearch>) {
        let search = Arc::new(search);
        let geocoder = Arc::new(GraphGeocoder::new(Arc::new(RelationshipGraph::builtin())));
        let collector = EventCollector::new(search.clone(), geocoder, CollectorConfig::default());
        (collector, search)
    }

    #[test]
    fn test_select_queries() {
        let defaults = select_queries(&[]);
        assert_eq!(defaults, THREAT_QUERIES[..3].to_vec());

        let many: Vec<String> = (0..8).map(|i| format!("query {}", i)).collect();
        assert_eq!(select_queries(&many).len(), MAX_QUERIES);

        let blank = vec!["  ".to_string()];
        assert_eq!(select_queries(&blank).len(), DEFAULT_QUERY_COUNT);
    }

    #[tokio::test]
    async fn test_collect_filters_dedups_and_sorts() {
        let search = FakeSearch::new()
            .respond(
                "q1",
                vec![
                    hit("Troops mass on Ukraine border", "Military buildup continues.", 1),
                    hit("Storm warning issued", "Heavy rain expected nationwide.", 5),
                ],
            )
            .respond(
                "q2",
                vec![
                    hit("Troops mass on Ukraine border", "Duplicate coverage.", 9),
                    hit("Protests spread across France", "Rally in Paris.", 3),
                ],
            );
        let (collector, _) = collector(search);

        let feed = collector
            .collect(&["q1".to_string(), "q2".to_string()])
            .await
            .unwrap();

        let titles: Vec<_> = feed.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Protests spread across France", "Troops mass on Ukraine border"]);
        assert_eq!(feed.count, 2);

        let ukraine = &feed.events[1];
        assert_eq!(ukraine.summary, "Military buildup continues.");
        assert_eq!(ukraine.location.country.as_deref(), Some("Ukraine"));
        assert_eq!(ukraine.source, "web");
    }

    #[tokio::test]
    async fn test_default_queries_used() {
        let (collector, search) = collector(FakeSearch::new());
        let feed = collector.collect(&[]).await.unwrap();
        assert!(feed.events.is_empty());

        let mut seen = search.seen.lock().unwrap().clone();
        seen.sort();
        let mut expected: Vec<String> = THREAT_QUERIES[..3].iter().map(|q| q.to_string()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_partial_failure_is_tolerated() {
        let search = FakeSearch::new()
            .fail("broken")
            .respond("ok", vec![hit("Earthquake hits Japan", "Tsunami warning.", 2)]);
        let (collector, _) = collector(search);

        let feed = collector
            .collect(&["broken".to_string(), "ok".to_string()])
            .await
            .unwrap();
        assert_eq!(feed.count, 1);
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let search = FakeSearch::new().fail("a").fail("b");
        let (collector, _) = collector(search);

        let err = collector
            .collect(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(ProviderError::Network(_))));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_html_content_is_stripped() {
        let search = FakeSearch::new().respond(
            "q",
            vec![hit(
                "Cyber attack on Israel banks",
                "<p>Ransomware crippled payments.</p><script>ads()</script>",
                4,
            )],
        );
        let (collector, _) = collector(search);

        let feed = collector.collect(&["q".to_string()]).await.unwrap();
        let event = &feed.events[0];
        assert_eq!(event.summary, "Ransomware crippled payments.");
        assert_eq!(event.category, geowatch_core::EventCategory::Cyber);
    }
}
