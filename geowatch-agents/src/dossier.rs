//! Entity research
//!
//! Profiles a named entity from one search round trip.

use tracing::{debug, info};

use geowatch_core::{EntityDocument, EntityDossier};

use crate::{AgentError, SharedSearch};

/// Search results a dossier is built from
pub const ENTITY_MAX_RESULTS: usize = 10;

pub struct EntityResearcher {
    search: SharedSearch,
}

impl EntityResearcher {
    pub fn new(search: SharedSearch) -> Self {
        Self { search }
    }

    /// `Ok(None)` when the search finds nothing about `name`
    pub async fn research(&self, name: &str) -> Result<Option<EntityDossier>, AgentError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let query = format!("{} profile background information", name);
        let results = self.search.search(&query, ENTITY_MAX_RESULTS).await?;
        debug!("{} documents for entity {:?}", results.len(), name);

        let documents: Vec<EntityDocument> = results
            .iter()
            .map(|result| EntityDocument {
                title: result.title.clone(),
                url: result.url.clone(),
                content: result.plain_content(),
            })
            .collect();

        let dossier = EntityDossier::from_documents(name, &documents);
        if let Some(dossier) = &dossier {
            info!("Profiled {} as {}", dossier.name, dossier.entity_type);
        }
        Ok(dossier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderError, SearchProvider, SearchResult};
    use async_trait::async_trait;
    use geowatch_core::EntityType;
    use std::sync::{Arc, Mutex};

    struct FakeSearch {
        results: Vec<SearchResult>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, ProviderError> {
            self.seen.lock().unwrap().push((query.to_string(), max_results));
            Ok(self.results.clone())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn researcher(results: Vec<SearchResult>) -> (EntityResearcher, Arc<FakeSearch>) {
        let search = Arc::new(FakeSearch {
            results,
            seen: Mutex::new(Vec::new()),
        });
        (EntityResearcher::new(search.clone()), search)
    }

    #[tokio::test]
    async fn test_research_builds_dossier() {
        let (researcher, search) = researcher(vec![SearchResult::new(
            "Wagner Group",
            "https://example.com/wagner",
            "<p>A militia and armed group operating in Africa.</p>",
        )]);

        let dossier = researcher.research(" Wagner Group ").await.unwrap().unwrap();
        assert_eq!(dossier.name, "Wagner Group");
        assert_eq!(dossier.entity_type, EntityType::Group);
        assert_eq!(dossier.description, "A militia and armed group operating in Africa.");
        assert_eq!(dossier.sources[0].url, "https://example.com/wagner");

        let seen = search.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            ("Wagner Group profile background information".to_string(), ENTITY_MAX_RESULTS)
        );
    }

    #[tokio::test]
    async fn test_no_results_no_dossier() {
        let (researcher, _) = researcher(Vec::new());
        assert!(researcher.research("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_skips_search() {
        let (researcher, search) = researcher(Vec::new());
        assert!(researcher.research("   ").await.unwrap().is_none());
        assert!(search.seen.lock().unwrap().is_empty());
    }
}
