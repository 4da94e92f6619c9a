//! Event assembly: normalize, classify, extract, stamp
//!
//! Title and content are normalized separately; classification and
//! extraction run on `"{title} {content}"`.

use chrono::{DateTime, Utc};
use tracing::trace;
use uuid::Uuid;

use crate::{
    classify_category, classify_threat_level, extract_entities, extract_keywords, normalize,
    EventCategory, GeoLocation, ThreatEvent, ValidationError,
};

/// Characters of normalized content kept as the event summary
pub const SUMMARY_CHARS: usize = 500;

/// Builder for a [`ThreatEvent`] from one search result
#[derive(Debug, Clone)]
pub struct EventDraft {
    title: String,
    content: String,
    location: GeoLocation,
    source: String,
    source_url: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    category: Option<EventCategory>,
}

impl EventDraft {
    pub fn new(title: &str, content: &str, location: GeoLocation, source: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            location,
            source: source.to_string(),
            source_url: None,
            timestamp: None,
            category: None,
        }
    }

    pub fn source_url(mut self, url: &str) -> Self {
        if !url.trim().is_empty() {
            self.source_url = Some(url.to_string());
        }
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Use `category` instead of classifying the text
    pub fn category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::MissingField("source"));
        }
        if self.location.is_unresolved() {
            return Err(ValidationError::UnresolvedLocation);
        }
        if !self.location.has_valid_range() {
            return Err(ValidationError::InvalidCoordinates {
                latitude: self.location.latitude,
                longitude: self.location.longitude,
            });
        }
        Ok(())
    }

    /// Build the event; the id is fresh and the timestamp defaults to now
    pub fn assemble(self) -> Result<ThreatEvent, ValidationError> {
        self.validate()?;

        let title = normalize(&self.title);
        let content = normalize(&self.content);
        let full_text = format!("{} {}", title, content);

        let event = ThreatEvent {
            id: format!("evt-{}", Uuid::new_v4()),
            summary: content.chars().take(SUMMARY_CHARS).collect(),
            category: self
                .category
                .unwrap_or_else(|| classify_category(&full_text)),
            threat_level: classify_threat_level(&full_text),
            location: self.location,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            source: self.source,
            source_url: self.source_url,
            entities: extract_entities(&full_text),
            keywords: extract_keywords(&full_text),
            raw_content: Some(content),
            title,
        };

        trace!(
            "Assembled {} as {}/{}",
            event.id,
            event.category,
            event.threat_level
        );

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreatLevel;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn kyiv() -> GeoLocation {
        GeoLocation::new(50.45, 30.52)
            .with_place_name("Kyiv")
            .with_country("Ukraine")
    }

    #[test]
    fn test_assemble_classifies_combined_text() {
        let event = EventDraft::new(
            "Border clash reported",
            "Skip to main content\nTroops exchanged fire near the border. Read more",
            kyiv(),
            "reuters",
        )
        .source_url("https://example.com/a")
        .assemble()
        .unwrap();

        assert_eq!(event.title, "Border clash reported");
        assert_eq!(event.summary, "Troops exchanged fire near the border.");
        assert_eq!(event.category, EventCategory::Conflict);
        assert_eq!(event.threat_level, ThreatLevel::Info);
        assert!(event.keywords.contains(&"clash".to_string()));
        assert!(event.keywords.contains(&"troops".to_string()));
        assert_eq!(event.source_url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_category_override() {
        let event = EventDraft::new("Border clash reported", "Troops exchanged fire.", kyiv(), "web")
            .category(EventCategory::Military)
            .assemble()
            .unwrap();
        assert_eq!(event.category, EventCategory::Military);
        assert!(event.keywords.contains(&"clash".to_string()));
    }

    #[test]
    fn test_summary_truncated_to_500_chars() {
        let content = "Inflation ".repeat(200);
        let event = EventDraft::new("Prices", &content, kyiv(), "web")
            .assemble()
            .unwrap();
        assert_eq!(event.summary.chars().count(), SUMMARY_CHARS);
        assert!(event.raw_content.unwrap().len() > SUMMARY_CHARS);
    }

    #[test]
    fn test_timestamp_supplied_or_now() {
        let published = Utc.with_ymd_and_hms(2024, 11, 2, 8, 30, 0).unwrap();
        let event = EventDraft::new("Summit opens", "", kyiv(), "web")
            .timestamp(published)
            .assemble()
            .unwrap();
        assert_eq!(event.timestamp, published);

        let before = Utc::now();
        let event = EventDraft::new("Summit opens", "", kyiv(), "web")
            .assemble()
            .unwrap();
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = (0..500)
            .map(|_| {
                EventDraft::new("Same title", "Same body", kyiv(), "web")
                    .assemble()
                    .unwrap()
                    .id
            })
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_rejects_missing_fields() {
        let err = EventDraft::new("  ", "body", kyiv(), "web").assemble().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("title"));

        let err = EventDraft::new("Title", "body", kyiv(), "").assemble().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("source"));
    }

    #[test]
    fn test_rejects_unresolved_location() {
        let err = EventDraft::new("Title", "body", GeoLocation::unresolved(), "web")
            .assemble()
            .unwrap_err();
        assert_eq!(err, ValidationError::UnresolvedLocation);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let err = EventDraft::new("Title", "body", GeoLocation::new(120.0, 10.0), "web")
            .assemble()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCoordinates { .. }));
    }
}
