//! Relationship-graph geocoder
//!
//! Resolves a result to the centroid of the first graph country named in
//! its title, falling back to its body. Good enough for country-level
//! plotting; anything finer needs a real geocoding service.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::trace;

use geowatch_core::{GeoLocation, RelationshipGraph};

use crate::{Geocoder, ProviderError};

pub struct GraphGeocoder {
    graph: Arc<RelationshipGraph>,
}

impl GraphGeocoder {
    pub fn new(graph: Arc<RelationshipGraph>) -> Self {
        Self { graph }
    }

    /// Graph country mentioned earliest in `text`; the longer name wins at
    /// the same position, then graph order
    fn mentioned_country(&self, text: &str) -> Option<&str> {
        let lower_text = text.to_lowercase();
        self.graph
            .names()
            .filter_map(|name| {
                lower_text
                    .find(&name.to_lowercase())
                    .map(|position| (position, Reverse(name.len()), name))
            })
            .min_by_key(|(position, length, _)| (*position, *length))
            .map(|(_, _, name)| name)
    }

    pub fn resolve(&self, title: &str, body: &str) -> Option<GeoLocation> {
        let name = self
            .mentioned_country(title)
            .or_else(|| self.mentioned_country(body))?;
        let profile = self.graph.profile(name)?;

        trace!("Geocoded to {}", name);
        Some(
            GeoLocation::new(profile.lat, profile.lng)
                .with_place_name(name)
                .with_country(name)
                .with_region(&profile.region),
        )
    }
}

#[async_trait]
impl Geocoder for GraphGeocoder {
    async fn geocode(&self, title: &str, body: &str) -> Result<Option<GeoLocation>, ProviderError> {
        Ok(self.resolve(title, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder() -> GraphGeocoder {
        GraphGeocoder::new(Arc::new(RelationshipGraph::builtin()))
    }

    #[test]
    fn test_title_mention_wins() {
        let location = geocoder()
            .resolve("Drone strike reported in SYRIA", "Officials in Israel and Lebanon reacted")
            .unwrap();
        assert_eq!(location.country.as_deref(), Some("Syria"));
        assert_eq!(location.region.as_deref(), Some("Middle East"));
        assert_eq!(location.latitude, 34.8021);
    }

    #[test]
    fn test_earliest_mention_wins() {
        let location = geocoder()
            .resolve("Russia strikes Ukraine power grid", "")
            .unwrap();
        assert_eq!(location.country.as_deref(), Some("Russia"));

        let location = geocoder()
            .resolve("Talks stall", "Envoys from Turkey met officials from Iran")
            .unwrap();
        assert_eq!(location.country.as_deref(), Some("Turkey"));
    }

    #[test]
    fn test_body_fallback() {
        let location = geocoder()
            .resolve("Talks collapse", "Negotiators from Brazil walked out")
            .unwrap();
        assert_eq!(location.place_name.as_deref(), Some("Brazil"));
    }

    #[test]
    fn test_unresolved() {
        assert!(geocoder().resolve("Storm warning", "Heavy rain expected").is_none());
    }

    #[tokio::test]
    async fn test_geocode_trait() {
        let location = geocoder().geocode("Protests in Kenya", "").await.unwrap();
        assert!(location.is_none());
        let location = geocoder().geocode("Protests in Nigeria", "").await.unwrap();
        assert_eq!(location.unwrap().country.as_deref(), Some("Nigeria"));
    }
}
