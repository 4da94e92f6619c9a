//! Prediction-market overlays
//!
//! Markets arrive as loosely-typed event listings: outcome labels and
//! prices may be JSON arrays or JSON-encoded strings, volumes may be numbers
//! or numeric strings. This module turns them into [`PredictionMarket`]s and
//! decides which ones concern a given country.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Page URL prefix for a market's parent event
pub const MARKET_URL_PREFIX: &str = "https://polymarket.com/event/";

/// Tags fetched for the general geopolitical overlay
pub const PRIORITY_TAGS: [&str; 7] = [
    "geopolitics",
    "world",
    "ukraine",
    "russia",
    "iran",
    "china",
    "middle-east",
];

/// Most tags fetched for one country
pub const MAX_COUNTRY_TAGS: usize = 3;

/// Country-specific tags; broad tags ("world", "war") never appear here
static COUNTRY_TAGS: &[(&str, &[&str])] = &[
    ("Ukraine", &["ukraine", "zelensky", "zelenskyy"]),
    ("Russia", &["russia", "putin"]),
    ("Israel", &["israel", "netanyahu"]),
    ("Palestine", &["gaza", "palestine", "hamas"]),
    ("Iran", &["iran", "khamenei"]),
    ("China", &["china", "xi-jinping"]),
    ("Taiwan", &["taiwan"]),
    ("North Korea", &["north-korea", "kim-jong-un", "dprk"]),
    ("Syria", &["syria", "assad"]),
    ("Yemen", &["yemen", "houthi"]),
    ("United States", &["trump", "biden", "us-politics"]),
    ("France", &["france", "macron"]),
    ("Germany", &["germany", "scholz"]),
    ("United Kingdom", &["uk", "starmer", "england"]),
    ("Poland", &["poland"]),
    ("India", &["india", "modi"]),
    ("Pakistan", &["pakistan"]),
    ("South Korea", &["south-korea"]),
    ("Japan", &["japan"]),
    ("Sudan", &["sudan"]),
    ("Ethiopia", &["ethiopia"]),
    ("Somalia", &["somalia"]),
    ("Venezuela", &["venezuela", "maduro"]),
    ("Brazil", &["brazil", "lula"]),
];

static COUNTRY_VARIANTS: &[(&str, &[&str])] = &[
    ("United States", &["usa", "u.s.", "america", "american"]),
    ("United Kingdom", &["uk", "britain", "british", "england"]),
    ("North Korea", &["dprk", "pyongyang", "kim jong"]),
    ("South Korea", &["rok", "seoul"]),
    ("Russia", &["russian", "moscow", "kremlin", "putin"]),
    ("Ukraine", &["ukrainian", "kyiv", "kiev", "zelensky", "zelenskyy"]),
    ("China", &["chinese", "beijing", "prc", "xi jinping"]),
    ("Iran", &["iranian", "tehran", "khamenei"]),
    ("Israel", &["israeli", "tel aviv", "netanyahu"]),
    ("Palestine", &["palestinian", "gaza", "west bank", "hamas"]),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketTag {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A market as listed by the exchange
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarket {
    pub id: String,
    pub question: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub outcomes: Value,
    #[serde(default)]
    pub outcome_prices: Value,
    #[serde(default)]
    pub volume: Option<Value>,
    #[serde(default)]
    pub volume_num: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<Value>,
    #[serde(default)]
    pub liquidity_num: Option<f64>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub closed: Option<bool>,
}

impl RawMarket {
    /// Neither closed nor explicitly inactive
    pub fn is_open(&self) -> bool {
        self.closed != Some(true) && self.active != Some(false)
    }
}

/// An exchange event grouping one or more markets
#[derive(Debug, Clone, Deserialize)]
pub struct RawMarketEvent {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub markets: Option<Vec<RawMarket>>,
    #[serde(default)]
    pub tags: Option<Vec<MarketTag>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutcome {
    pub label: String,
    /// Percent, 0-100
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMarket {
    pub id: String,
    pub question: String,
    pub slug: String,
    pub event_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub outcomes: Vec<MarketOutcome>,
    pub volume: f64,
    pub liquidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub url: String,
    pub is_active: bool,
}

/// A JSON array, or a string holding one; anything else is empty
pub fn parse_json_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Number or numeric string; missing or unparseable is 0
fn number_of(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Normalize one listed market, `None` when it has no outcomes
pub fn parse_market(market: &RawMarket, event_slug: &str) -> Option<PredictionMarket> {
    let labels = parse_json_array(&market.outcomes);
    if labels.is_empty() {
        return None;
    }
    let prices = parse_json_array(&market.outcome_prices);

    let outcomes = labels
        .iter()
        .enumerate()
        .map(|(i, label)| MarketOutcome {
            label: label_of(label),
            probability: number_of(prices.get(i)) * 100.0,
        })
        .collect();

    let volume = market
        .volume_num
        .filter(|v| v.is_finite())
        .unwrap_or_else(|| number_of(market.volume.as_ref()));
    let liquidity = market
        .liquidity_num
        .filter(|v| v.is_finite())
        .unwrap_or_else(|| number_of(market.liquidity.as_ref()));

    let end_date = market
        .end_date
        .as_deref()
        .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
        .map(|date| date.with_timezone(&Utc));

    let image = [&market.image, &market.icon]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .cloned();

    Some(PredictionMarket {
        id: market.id.clone(),
        question: market.question.clone(),
        slug: market.slug.clone(),
        event_slug: event_slug.to_string(),
        description: market.description.clone(),
        outcomes,
        volume,
        liquidity,
        end_date,
        image,
        url: format!("{}{}", MARKET_URL_PREFIX, event_slug),
        is_active: market.active == Some(true) && market.closed != Some(true),
    })
}

/// Highest-probability outcome; the first one wins ties
pub fn leading_outcome(market: &PredictionMarket) -> MarketOutcome {
    market
        .outcomes
        .iter()
        .fold(None::<&MarketOutcome>, |best, outcome| match best {
            Some(best) if outcome.probability <= best.probability => Some(best),
            _ => Some(outcome),
        })
        .cloned()
        .unwrap_or_else(|| MarketOutcome {
            label: "N/A".to_string(),
            probability: 0.0,
        })
}

/// Lower-case spellings that identify `country` in market text
pub fn country_variants(country: &str) -> Vec<String> {
    let mut variants = vec![country.to_lowercase()];
    if let Some((_, extra)) = COUNTRY_VARIANTS.iter().find(|(name, _)| *name == country) {
        variants.extend(extra.iter().map(|v| v.to_string()));
    }
    variants
}

/// Whether the market question, its description or the event title names `country`
pub fn is_market_relevant(market: &RawMarket, country: &str, event: &RawMarketEvent) -> bool {
    let variants = country_variants(country);
    let mentions = |text: &str| {
        let text = text.to_lowercase();
        variants.iter().any(|v| text.contains(v.as_str()))
    };

    mentions(&market.question)
        || market.description.as_deref().is_some_and(mentions)
        || mentions(&event.title)
}

/// Exchange tags to fetch for `country`, at most [`MAX_COUNTRY_TAGS`]
pub fn country_tags(country: &str) -> Vec<String> {
    let tags: Vec<String> = match COUNTRY_TAGS.iter().find(|(name, _)| *name == country) {
        Some((_, tags)) => tags.iter().map(|t| t.to_string()).collect(),
        None => vec![country
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")],
    };
    tags.into_iter().take(MAX_COUNTRY_TAGS).collect()
}

fn collect_markets(
    events: &[RawMarketEvent],
    keep: impl Fn(&RawMarketEvent, &RawMarket) -> bool,
) -> Vec<PredictionMarket> {
    events
        .iter()
        .flat_map(|event| {
            event
                .markets
                .iter()
                .flatten()
                .map(move |market| (event, market))
        })
        .filter(|&(event, market)| market.is_open() && keep(event, market))
        .filter_map(|(event, market)| parse_market(market, &event.slug))
        .collect()
}

/// Every open market of `events`
pub fn open_markets(events: &[RawMarketEvent]) -> Vec<PredictionMarket> {
    collect_markets(events, |_, _| true)
}

/// Open markets of `events` that concern `country`
pub fn country_markets(events: &[RawMarketEvent], country: &str) -> Vec<PredictionMarket> {
    collect_markets(events, |event, market| is_market_relevant(market, country, event))
}

/// Open markets whose event (title, description, tags) or own question or
/// description contains `query`, case-insensitively
pub fn matching_markets(events: &[RawMarketEvent], query: &str) -> Vec<PredictionMarket> {
    let query = query.to_lowercase();
    let contains = |text: &str| text.to_lowercase().contains(&query);

    collect_markets(events, |event, market| {
        let event_matches = contains(&event.title)
            || event.description.as_deref().is_some_and(contains)
            || event.tags.iter().flatten().any(|tag| {
                tag.label.as_deref().is_some_and(contains) || tag.slug.as_deref().is_some_and(contains)
            });

        event_matches
            || contains(&market.question)
            || market.description.as_deref().is_some_and(contains)
    })
}

/// Keep the first market per id, order by volume (highest first), cap at `limit`
pub fn rank_by_volume(markets: Vec<PredictionMarket>, limit: usize) -> Vec<PredictionMarket> {
    let mut seen = HashSet::new();
    let mut markets: Vec<_> = markets
        .into_iter()
        .filter(|market| seen.insert(market.id.clone()))
        .collect();
    markets.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    markets.truncate(limit);
    markets
}

/// `$1.2M`, `$500K`, `$42`
pub fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000.0 {
        format!("${:.1}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("${}K", (volume / 1_000.0).round())
    } else {
        format!("${}", volume.round())
    }
}

pub fn format_probability(probability: f64) -> String {
    format!("{}%", probability.round())
}
