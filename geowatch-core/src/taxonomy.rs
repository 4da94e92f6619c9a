//! Keyword vocabularies for category and threat-level classification
//!
//! All keywords are lower-case and matched as plain substrings of the
//! lower-cased text.

use crate::{EventCategory, ThreatLevel};

/// Keywords per category, in canonical category order
pub static CATEGORY_KEYWORDS: &[(EventCategory, &[&str])] = &[
    (
        EventCategory::Conflict,
        &[
            "war", "battle", "fighting", "combat", "clash", "strike", "attack", "offensive",
            "invasion", "troops",
        ],
    ),
    (
        EventCategory::Protest,
        &[
            "protest", "demonstration", "rally", "march", "riot", "unrest", "uprising",
            "dissent", "activist", "strike",
        ],
    ),
    (
        EventCategory::Disaster,
        &[
            "earthquake", "flood", "hurricane", "typhoon", "tsunami", "wildfire", "tornado",
            "volcanic", "landslide", "disaster",
        ],
    ),
    (
        EventCategory::Diplomatic,
        &[
            "summit", "treaty", "agreement", "diplomatic", "embassy", "ambassador",
            "negotiation", "talks", "bilateral", "sanctions",
        ],
    ),
    (
        EventCategory::Economic,
        &[
            "economy", "trade", "tariff", "currency", "inflation", "recession", "market",
            "sanctions", "gdp", "debt",
        ],
    ),
    (
        EventCategory::Terrorism,
        &[
            "terrorist", "terrorism", "bomb", "explosion", "hostage", "extremist", "militant",
            "isis", "al-qaeda", "jihad",
        ],
    ),
    (
        EventCategory::Cyber,
        &[
            "cyber", "hack", "breach", "malware", "ransomware", "ddos", "phishing", "data leak",
            "cyber attack", "vulnerability",
        ],
    ),
    (
        EventCategory::Health,
        &[
            "pandemic", "epidemic", "outbreak", "virus", "disease", "covid", "vaccine",
            "health emergency", "who", "infection",
        ],
    ),
    (
        EventCategory::Environmental,
        &[
            "climate", "pollution", "environmental", "emission", "deforestation",
            "biodiversity", "carbon", "renewable", "conservation", "ecosystem",
        ],
    ),
    (
        EventCategory::Military,
        &[
            "military", "army", "navy", "air force", "missile", "nuclear", "weapons", "defense",
            "pentagon", "nato",
        ],
    ),
    (
        EventCategory::Crime,
        &[
            "murder", "homicide", "kidnapping", "abduction", "disappearance", "shooting",
            "gunfire", "drug trafficking", "cartel", "gang", "robbery", "assault",
            "organized crime", "manslaughter", "crime",
        ],
    ),
    (
        EventCategory::Piracy,
        &[
            "piracy", "pirate", "hijack", "shipping attack", "maritime", "vessel seized",
            "ship attack", "sea attack", "somali", "gulf of aden", "red sea attack", "houthi",
        ],
    ),
    (
        EventCategory::Infrastructure,
        &[
            "reservoir", "water level", "dam", "power grid", "blackout", "power outage",
            "utility", "electricity", "water supply", "infrastructure", "pipeline",
            "bridge collapse",
        ],
    ),
    (
        EventCategory::Commodities,
        &[
            "grocery price", "food price", "commodity", "wheat", "corn", "rice price",
            "food shortage", "food supply", "agriculture", "crop", "harvest", "famine",
            "food security",
        ],
    ),
];

/// Keywords per threat level, in priority order
pub static THREAT_LEVEL_KEYWORDS: &[(ThreatLevel, &[&str])] = &[
    (
        ThreatLevel::Critical,
        &[
            "emergency", "imminent", "catastrophic", "mass casualty", "nuclear", "wmd", "urgent",
            "crisis", "immediate threat",
        ],
    ),
    (
        ThreatLevel::High,
        &[
            "severe", "major", "significant", "escalating", "dangerous", "critical", "serious",
            "alarming", "warning",
        ],
    ),
    (
        ThreatLevel::Medium,
        &[
            "moderate", "developing", "ongoing", "tensions", "concern", "elevated", "increasing",
            "notable",
        ],
    ),
    (
        ThreatLevel::Low,
        &["minor", "limited", "contained", "isolated", "localized", "manageable", "stable"],
    ),
    (
        ThreatLevel::Info,
        &[
            "update", "report", "announcement", "statement", "analysis", "brief", "summary",
            "overview",
        ],
    ),
];

/// Keyword list for one category
pub fn category_keywords(category: EventCategory) -> &'static [&'static str] {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Category vocabulary followed by threat vocabulary, duplicates included
pub fn full_vocabulary() -> impl Iterator<Item = &'static str> {
    let categories = CATEGORY_KEYWORDS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter().copied());
    let levels = THREAT_LEVEL_KEYWORDS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter().copied());

    categories.chain(levels)
}
