//! Threat events plotted on the dashboard map
//!
//! An event is built once per search result and never mutated afterwards.
//! Event lists are deduplicated by exact title and ordered newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Categories an event can be classified into.
///
/// Declaration order is significant: the category classifier resolves ties
/// in favour of the earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Conflict,
    Protest,
    Disaster,
    Diplomatic,
    Economic,
    Terrorism,
    Cyber,
    Health,
    Environmental,
    Military,
    Crime,
    Piracy,
    Infrastructure,
    Commodities,
}

impl EventCategory {
    /// All categories in canonical order
    pub const ALL: [EventCategory; 14] = [
        EventCategory::Conflict,
        EventCategory::Protest,
        EventCategory::Disaster,
        EventCategory::Diplomatic,
        EventCategory::Economic,
        EventCategory::Terrorism,
        EventCategory::Cyber,
        EventCategory::Health,
        EventCategory::Environmental,
        EventCategory::Military,
        EventCategory::Crime,
        EventCategory::Piracy,
        EventCategory::Infrastructure,
        EventCategory::Commodities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::Protest => "protest",
            Self::Disaster => "disaster",
            Self::Diplomatic => "diplomatic",
            Self::Economic => "economic",
            Self::Terrorism => "terrorism",
            Self::Cyber => "cyber",
            Self::Health => "health",
            Self::Environmental => "environmental",
            Self::Military => "military",
            Self::Crime => "crime",
            Self::Piracy => "piracy",
            Self::Infrastructure => "infrastructure",
            Self::Commodities => "commodities",
        }
    }

    /// Parse a lower-case category name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an event, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl ThreatLevel {
    /// Levels in the order the threat classifier checks them
    pub const PRIORITY: [ThreatLevel; 5] = [
        ThreatLevel::Critical,
        ThreatLevel::High,
        ThreatLevel::Medium,
        ThreatLevel::Low,
        ThreatLevel::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved position on the map.
///
/// `(0, 0)` is the "location unresolved" sentinel and never a real event
/// location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            place_name: None,
            country: None,
            region: None,
        }
    }

    /// The sentinel returned by geocoders that could not place a text
    pub fn unresolved() -> Self {
        Self::new(0.0, 0.0).with_place_name("Unknown")
    }

    pub fn with_place_name(mut self, name: &str) -> Self {
        self.place_name = Some(name.to_string());
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// True for the `(0, 0)` sentinel
    pub fn is_unresolved(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn has_valid_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A classified, geolocated event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatEvent {
    pub id: String,
    pub title: String,
    /// First 500 characters of the normalized content
    pub summary: String,
    pub category: EventCategory,
    pub threat_level: ThreatLevel,
    pub location: GeoLocation,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    /// At most 10 matched vocabulary terms
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl ThreatEvent {
    /// Country of the event location, if known
    pub fn country(&self) -> Option<&str> {
        self.location.country.as_deref()
    }
}

/// Keep the first event for each exact (case-sensitive) title
pub fn dedup_by_title(events: Vec<ThreatEvent>) -> Vec<ThreatEvent> {
    let mut seen: HashSet<String> = HashSet::new();
    events
        .into_iter()
        .filter(|event| seen.insert(event.title.clone()))
        .collect()
}

/// Sort events newest first
pub fn sort_newest_first(events: &mut [ThreatEvent]) {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// A batch of events as served to the dashboard feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFeed {
    pub events: Vec<ThreatEvent>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

impl EventFeed {
    /// Deduplicate, order and stamp a batch of assembled events
    pub fn from_events(events: Vec<ThreatEvent>) -> Self {
        let mut events = dedup_by_title(events);
        sort_newest_first(&mut events);

        Self {
            count: events.len(),
            events,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn event(title: &str, hour: u32) -> ThreatEvent {
        ThreatEvent {
            id: format!("evt-{}-{}", title, hour),
            title: title.to_string(),
            summary: String::new(),
            category: EventCategory::Conflict,
            threat_level: ThreatLevel::Medium,
            location: GeoLocation::new(48.3, 31.1),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
            source: "web".to_string(),
            source_url: None,
            entities: Vec::new(),
            keywords: Vec::new(),
            raw_content: None,
        }
    }

    #[test]
    fn test_category_order_and_parse() {
        assert_eq!(EventCategory::ALL[0], EventCategory::Conflict);
        assert_eq!(EventCategory::ALL[13], EventCategory::Commodities);
        assert_eq!(EventCategory::parse("Military"), Some(EventCategory::Military));
        assert_eq!(EventCategory::parse("weather"), None);
    }

    #[test]
    fn test_unresolved_sentinel() {
        assert!(GeoLocation::unresolved().is_unresolved());
        assert!(!GeoLocation::new(0.0, 12.5).is_unresolved());
        assert!(!GeoLocation::new(91.0, 0.0).has_valid_range());
    }

    #[test]
    fn test_dedup_is_case_sensitive_and_keeps_first() {
        let events = vec![
            event("Border clash", 1),
            event("Border clash", 5),
            event("border clash", 3),
        ];
        let deduped = dedup_by_title(events);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].timestamp.hour(), 1);
    }

    #[test]
    fn test_feed_sorted_newest_first() {
        let feed = EventFeed::from_events(vec![event("a", 1), event("b", 9), event("c", 4)]);
        let titles: Vec<_> = feed.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
        assert_eq!(feed.count, 3);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(event("x", 2)).unwrap();
        assert_eq!(json["threatLevel"], "medium");
        assert_eq!(json["category"], "conflict");
        assert!(json.get("sourceUrl").is_none());
    }
}
