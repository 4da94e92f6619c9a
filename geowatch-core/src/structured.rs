//! Structured cascade payloads from an external answer provider
//!
//! The provider may return its answer as text or as an already-parsed JSON
//! value. Both are parsed strictly against [`StructuredCascade`]; nothing is
//! guessed out of free text.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::cascade::{describe, factors_for};
use crate::{
    CascadeAnalysis, CascadeEffect, CascadeEstimator, GeoLocation, ImpactType, ParseError,
    ThreatEvent, MAX_CANDIDATES, UNKNOWN_COUNTRY,
};

/// Answer payload as received from a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalPayload {
    Text(String),
    Structured(Value),
}

impl ExternalPayload {
    /// Plain-text view, for free-text analysis
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

/// One country as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEffect {
    #[serde(alias = "targetCountry")]
    pub country: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub probability: f64,
    pub timeframe_hours: f64,
    pub impact_type: ImpactType,
    #[serde(default, alias = "reason")]
    pub description: String,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredCascade {
    #[serde(alias = "affectedCountries")]
    pub effects: Vec<ExternalEffect>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// JSON schema requested from providers that support structured output
pub fn structured_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "effects": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "country": { "type": "string" },
                        "countryCode": { "type": "string" },
                        "probability": { "type": "number", "minimum": 0, "maximum": 100 },
                        "timeframeHours": { "type": "number", "minimum": 1 },
                        "impactType": {
                            "type": "string",
                            "enum": ["economic", "military", "political", "humanitarian", "social"]
                        },
                        "description": { "type": "string" }
                    },
                    "required": ["country", "probability", "timeframeHours", "impactType", "description"]
                }
            },
            "summary": { "type": "string" }
        },
        "required": ["effects"]
    })
}

/// Parse a provider payload into a [`StructuredCascade`].
///
/// Text is parsed as JSON after trimming; an already-structured value is
/// deserialized directly. Anything that does not fit the schema is a
/// [`ParseError`] carrying an excerpt of the raw payload.
pub fn parse_external_payload(payload: &ExternalPayload) -> Result<StructuredCascade, ParseError> {
    let parsed = match payload {
        ExternalPayload::Text(text) => serde_json::from_str::<StructuredCascade>(text.trim())
            .map_err(|e| ParseError::new(format!("invalid cascade payload: {}", e), text))?,
        ExternalPayload::Structured(value) => {
            StructuredCascade::deserialize(value).map_err(|e| {
                ParseError::new(format!("invalid cascade payload: {}", e), &value.to_string())
            })?
        }
    };

    for effect in &parsed.effects {
        if effect.country.trim().is_empty() {
            return Err(ParseError::new(
                "cascade effect without a country",
                &payload.as_text(),
            ));
        }
        if !effect.probability.is_finite() || !effect.timeframe_hours.is_finite() {
            return Err(ParseError::new(
                format!("non-finite figures for {}", effect.country),
                &payload.as_text(),
            ));
        }
    }

    Ok(parsed)
}

impl CascadeEstimator<'_> {
    /// Turn a parsed provider answer into a ranked analysis.
    ///
    /// Payload coordinates are used only when they are a real location;
    /// otherwise the graph centroid is used. Countries that can be placed
    /// neither way are dropped, as is the source country itself. A country
    /// listed twice keeps its highest-ranked effect, and only the
    /// highest-ranked effects are kept.
    pub fn transform_structured(
        &self,
        event: &ThreatEvent,
        structured: StructuredCascade,
    ) -> CascadeAnalysis {
        let graph = self.graph();
        let source = event.country().unwrap_or(UNKNOWN_COUNTRY);
        let mut effects = Vec::with_capacity(structured.effects.len());

        for external in structured.effects {
            let country = external.country.trim().to_string();
            if country == source {
                continue;
            }

            let profile = graph.profile(&country);
            let reported = match (external.latitude, external.longitude) {
                (Some(lat), Some(lng)) => Some(GeoLocation::new(lat, lng)),
                _ => None,
            }
            .filter(|location| !location.is_unresolved() && location.has_valid_range());
            let coordinates = match (reported, profile) {
                (Some(location), _) => Some((location.latitude, location.longitude)),
                (None, Some(p)) => Some((p.lat, p.lng)),
                (None, None) => None,
            };
            let Some((latitude, longitude)) = coordinates else {
                debug!("Dropping {}: no coordinates", country);
                continue;
            };

            let relations = graph.relations(source, &country);
            let factors = if external.factors.is_empty() {
                factors_for(&relations)
            } else {
                external.factors
            };
            let description = if external.description.trim().is_empty() {
                describe(&country, external.impact_type, &relations)
            } else {
                external.description
            };
            let code = external
                .country_code
                .or_else(|| profile.map(|p| p.code.clone()))
                .unwrap_or_default();

            effects.push(CascadeEffect {
                id: format!("cascade-{}", Uuid::new_v4()),
                target_country: country,
                target_country_code: code,
                latitude,
                longitude,
                probability: external.probability.round().clamp(0.0, 100.0) as u8,
                timeframe_hours: external.timeframe_hours.round().max(1.0) as u32,
                impact_type: external.impact_type,
                description,
                factors,
                rank_delay: 0,
            });
        }

        effects.sort_by(|a, b| b.probability.cmp(&a.probability));
        let mut seen = HashSet::new();
        effects.retain(|effect| seen.insert(effect.target_country.clone()));
        effects.truncate(MAX_CANDIDATES);

        let summary = structured.summary.filter(|s| !s.trim().is_empty());
        CascadeAnalysis::from_effects(event.clone(), effects, summary)
    }
}
