//! Cascade-effect estimation
//!
//! Estimates which countries an event is likely to spill over into, how
//! likely and how soon. Candidates come from the source country's neighbors,
//! its leading trade partners and any graph country mentioned in a free-text
//! analysis. Each candidate is scored from its relationship to the source
//! plus random jitter.
//!
//! The jitter makes repeated runs on identical input differ. That is
//! intended; all randomness goes through a [`JitterSource`] so callers can
//! pin it.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::{EventCategory, Relations, RelationshipGraph, ThreatEvent};

/// Maximum candidate countries considered per analysis
pub const MAX_CANDIDATES: usize = 12;

/// Leading economic partners taken from the source profile
pub const TOP_PARTNERS: usize = 5;

pub const BASE_PROBABILITY: i32 = 30;
pub const NEIGHBOR_BONUS: i32 = 40;
pub const PARTNER_BONUS: i32 = 20;
pub const ALLIANCE_BONUS: i32 = 15;

/// Jitter is drawn from [-JITTER_SPREAD, +JITTER_SPREAD)
pub const JITTER_SPREAD: i32 = 10;

pub const MIN_PROBABILITY: i32 = 15;
pub const MAX_PROBABILITY: i32 = 95;

/// Probability at or above which an effect counts as high risk
pub const HIGH_RISK_THRESHOLD: u8 = 60;

/// Animation stagger between consecutive ranks, in milliseconds
pub const RANK_DELAY_STEP: u32 = 150;

/// Source country name used in summaries when the event has none
pub const UNKNOWN_COUNTRY: &str = "Unknown";

pub const FACTOR_NEIGHBOR: &str = "Neighboring country";
pub const FACTOR_TRADE: &str = "Major trade partner";
pub const FACTOR_ALLIANCE: &str = "Alliance member";
pub const FACTOR_REGION: &str = "Same region";

/// Kind of impact a cascade effect has on the target country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactType {
    Economic,
    Military,
    Political,
    Humanitarian,
    Social,
}

impl ImpactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economic => "economic",
            Self::Military => "military",
            Self::Political => "political",
            Self::Humanitarian => "humanitarian",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for ImpactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact types assigned cyclically to the candidates of an event category
pub fn impact_types_for(category: EventCategory) -> &'static [ImpactType] {
    use ImpactType::*;
    match category {
        EventCategory::Conflict => &[Military, Humanitarian, Economic, Political],
        EventCategory::Military => &[Military, Political, Economic],
        EventCategory::Terrorism => &[Political, Social, Economic],
        EventCategory::Protest => &[Political, Social, Economic],
        EventCategory::Economic => &[Economic, Political, Social],
        EventCategory::Diplomatic => &[Political, Economic],
        EventCategory::Disaster => &[Humanitarian, Economic],
        EventCategory::Cyber => &[Economic, Military, Political],
        EventCategory::Health => &[Humanitarian, Economic, Social],
        EventCategory::Environmental => &[Humanitarian, Economic],
        _ => &[Political, Economic],
    }
}

/// Source of uniform draws in [0, 1)
pub trait JitterSource {
    fn next_unit(&mut self) -> f64;
}

/// Jitter backed by a `rand` generator
pub struct RandJitter<R: Rng> {
    rng: R,
}

impl<R: Rng> RandJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandJitter<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible jitter
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> JitterSource for RandJitter<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceJitter {
    values: Vec<f64>,
    position: usize,
}

impl SequenceJitter {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, position: 0 }
    }

    /// Always returns the same draw
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl JitterSource for SequenceJitter {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

/// Uniform integer in [0, span)
fn draw(jitter: &mut dyn JitterSource, span: i32) -> i32 {
    let unit = jitter.next_unit().clamp(0.0, 1.0);
    ((unit * span as f64).floor() as i32).min(span - 1)
}

/// Predicted spill-over of an event into one country
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeEffect {
    pub id: String,
    pub target_country: String,
    pub target_country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 0-100
    pub probability: u8,
    pub timeframe_hours: u32,
    pub impact_type: ImpactType,
    pub description: String,
    pub factors: Vec<String>,
    /// Display stagger for this rank, in milliseconds
    pub rank_delay: u32,
}

/// Ranked cascade effects of one event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeAnalysis {
    pub source_event: ThreatEvent,
    /// Sorted by probability, highest first
    pub effects: Vec<CascadeEffect>,
    pub summary: String,
    pub total_affected_countries: usize,
    pub high_risk_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl CascadeAnalysis {
    /// Rank `effects` and derive the counts and summary.
    ///
    /// `summary` replaces the templated summary when given.
    pub fn from_effects(
        source_event: ThreatEvent,
        mut effects: Vec<CascadeEffect>,
        summary: Option<String>,
    ) -> Self {
        rank_effects(&mut effects);

        let high_risk_count = effects
            .iter()
            .filter(|e| e.probability >= HIGH_RISK_THRESHOLD)
            .count();
        let summary = summary
            .unwrap_or_else(|| summarize(&source_event, &effects, high_risk_count));

        Self {
            total_affected_countries: effects.len(),
            high_risk_count,
            summary,
            effects,
            source_event,
            generated_at: Utc::now(),
        }
    }
}

/// Stable sort by descending probability, then restagger the delays
pub fn rank_effects(effects: &mut [CascadeEffect]) {
    effects.sort_by(|a, b| b.probability.cmp(&a.probability));
    for (rank, effect) in effects.iter_mut().enumerate() {
        effect.rank_delay = rank as u32 * RANK_DELAY_STEP;
    }
}

fn summarize(event: &ThreatEvent, effects: &[CascadeEffect], high_risk_count: usize) -> String {
    let country = event.country().unwrap_or(UNKNOWN_COUNTRY);

    if effects.is_empty() {
        return format!(
            "No country-level correlations were found for this {} event in {}.",
            event.category, country
        );
    }

    let mut vectors: Vec<&str> = Vec::new();
    for effect in effects.iter().take(5) {
        let name = effect.impact_type.as_str();
        if !vectors.contains(&name) {
            vectors.push(name);
        }
    }

    format!(
        "This {} event in {} could potentially cascade to {} countries. {} countries face high \
         probability (60%+) of being affected. Primary impact vectors include {} effects.",
        event.category,
        country,
        effects.len(),
        high_risk_count,
        vectors.join(", ")
    )
}

/// Factor tags for the relations that hold, in fixed order
pub fn factors_for(relations: &Relations) -> Vec<String> {
    [
        (relations.neighbor, FACTOR_NEIGHBOR),
        (relations.economic_partner, FACTOR_TRADE),
        (relations.shared_alliance, FACTOR_ALLIANCE),
        (relations.same_region, FACTOR_REGION),
    ]
    .into_iter()
    .filter(|(holds, _)| *holds)
    .map(|(_, tag)| tag.to_string())
    .collect()
}

pub(crate) fn describe(country: &str, impact: ImpactType, relations: &Relations) -> String {
    let mut description = format!("{} may experience {} effects", country, impact);
    if relations.neighbor {
        description.push_str(" due to direct proximity");
    }
    if relations.economic_partner {
        description.push_str(" through trade disruption");
    }
    description.push('.');
    description
}

/// Graph-based cascade estimator
pub struct CascadeEstimator<'g> {
    graph: &'g RelationshipGraph,
}

impl<'g> CascadeEstimator<'g> {
    pub fn new(graph: &'g RelationshipGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g RelationshipGraph {
        self.graph
    }

    /// Candidate countries in union order, deduplicated, capped.
    ///
    /// Candidates without a graph profile are kept here; they still occupy a
    /// slot in the ordering but produce no effect.
    pub fn candidates(&self, source: &str, analysis_text: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered: Vec<&str> = Vec::new();

        if let Some(profile) = self.graph.profile(source) {
            let neighbors = profile.neighbors.iter();
            let partners = profile.economic_partners.iter().take(TOP_PARTNERS);
            for name in neighbors.chain(partners) {
                if seen.insert(name) {
                    ordered.push(name);
                }
            }
        }

        let lower_text = analysis_text.to_lowercase();
        for name in self.graph.names() {
            if name != source && lower_text.contains(&name.to_lowercase()) && seen.insert(name) {
                ordered.push(name);
            }
        }

        ordered.truncate(MAX_CANDIDATES);
        ordered.into_iter().map(str::to_string).collect()
    }

    /// Score one candidate: base + relationship bonuses + jitter, clamped
    pub fn probability(relations: &Relations, jitter: &mut dyn JitterSource) -> u8 {
        let mut score = BASE_PROBABILITY;
        if relations.neighbor {
            score += NEIGHBOR_BONUS;
        }
        if relations.economic_partner {
            score += PARTNER_BONUS;
        }
        if relations.shared_alliance {
            score += ALLIANCE_BONUS;
        }

        let noise = draw(jitter, 2 * JITTER_SPREAD) - JITTER_SPREAD;
        (score + noise).clamp(MIN_PROBABILITY, MAX_PROBABILITY) as u8
    }

    /// Hours until impact: [24, 72) for neighbors, [72, 240) otherwise
    pub fn timeframe_hours(neighbor: bool, jitter: &mut dyn JitterSource) -> u32 {
        let hours = if neighbor {
            24 + draw(jitter, 48)
        } else {
            72 + draw(jitter, 168)
        };
        hours as u32
    }

    /// Estimate the ranked cascade effects of `event`.
    ///
    /// An unknown source country and no mentioned countries yields an
    /// analysis with no effects, which is a valid outcome.
    pub fn estimate(
        &self,
        event: &ThreatEvent,
        analysis_text: &str,
        jitter: &mut dyn JitterSource,
    ) -> CascadeAnalysis {
        let source = event.country().unwrap_or(UNKNOWN_COUNTRY);
        if !self.graph.contains(source) {
            debug!("No relationship profile for source country {}", source);
        }

        let impact_types = impact_types_for(event.category);
        let candidates = self.candidates(source, analysis_text);
        let mut effects = Vec::with_capacity(candidates.len());

        for (index, target) in candidates.iter().enumerate() {
            let Some(profile) = self.graph.profile(target) else {
                debug!("Skipping {}: no relationship profile", target);
                continue;
            };

            let relations = self.graph.relations(source, target);
            let probability = Self::probability(&relations, jitter);
            let timeframe_hours = Self::timeframe_hours(relations.neighbor, jitter);
            let impact_type = impact_types[index % impact_types.len()];

            effects.push(CascadeEffect {
                id: format!("cascade-{}", Uuid::new_v4()),
                target_country: target.clone(),
                target_country_code: profile.code.clone(),
                latitude: profile.lat,
                longitude: profile.lng,
                probability,
                timeframe_hours,
                impact_type,
                description: describe(target, impact_type, &relations),
                factors: factors_for(&relations),
                rank_delay: 0,
            });
        }

        debug!(
            "Cascade for {}: {} candidates, {} effects",
            source,
            candidates.len(),
            effects.len()
        );

        CascadeAnalysis::from_effects(event.clone(), effects, None)
    }
}
