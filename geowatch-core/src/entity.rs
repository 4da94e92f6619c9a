//! Entity dossiers
//!
//! An entity named in an event (a country, an armed group, a leader, a
//! company) is profiled from a handful of search documents. The type is
//! decided by weighted indicator phrases in the combined text:
//! - country indicators count double
//! - group indicators count one and a half
//! - person and organization indicators count once
//!
//! Known country names short-circuit to `Country`; no indicator at all
//! falls back to `Organization`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of combined document text kept as the description
pub const DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Country,
    Group,
    Person,
    Organization,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Group => "group",
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static KNOWN_COUNTRIES: &[&str] = &[
    "afghanistan", "albania", "algeria", "andorra", "angola", "argentina", "armenia",
    "australia", "austria", "azerbaijan", "bahamas", "bahrain", "bangladesh", "barbados",
    "belarus", "belgium", "belize", "benin", "bhutan", "bolivia", "bosnia", "botswana",
    "brazil", "brunei", "bulgaria", "burkina faso", "burundi", "cambodia", "cameroon",
    "canada", "cape verde", "central african republic", "chad", "chile", "china",
    "colombia", "comoros", "congo", "costa rica", "croatia", "cuba", "cyprus",
    "czech republic", "czechia", "denmark", "djibouti", "dominica", "dominican republic",
    "ecuador", "egypt", "el salvador", "equatorial guinea", "eritrea", "estonia",
    "eswatini", "ethiopia", "fiji", "finland", "france", "gabon", "gambia", "georgia",
    "germany", "ghana", "greece", "grenada", "guatemala", "guinea", "guinea-bissau",
    "guyana", "haiti", "honduras", "hungary", "iceland", "india", "indonesia", "iran",
    "iraq", "ireland", "israel", "italy", "ivory coast", "jamaica", "japan", "jordan",
    "kazakhstan", "kenya", "kiribati", "north korea", "south korea", "korea", "kosovo",
    "kuwait", "kyrgyzstan", "laos", "latvia", "lebanon", "lesotho", "liberia", "libya",
    "liechtenstein", "lithuania", "luxembourg", "madagascar", "malawi", "malaysia",
    "maldives", "mali", "malta", "marshall islands", "mauritania", "mauritius", "mexico",
    "micronesia", "moldova", "monaco", "mongolia", "montenegro", "morocco", "mozambique",
    "myanmar", "namibia", "nauru", "nepal", "netherlands", "new zealand", "nicaragua",
    "niger", "nigeria", "north macedonia", "norway", "oman", "pakistan", "palau",
    "palestine", "panama", "papua new guinea", "paraguay", "peru", "philippines", "poland",
    "portugal", "qatar", "romania", "russia", "rwanda", "saint kitts", "saint lucia",
    "saint vincent", "samoa", "san marino", "saudi arabia", "senegal", "serbia",
    "seychelles", "sierra leone", "singapore", "slovakia", "slovenia", "solomon islands",
    "somalia", "south africa", "south sudan", "spain", "sri lanka", "sudan", "suriname",
    "sweden", "switzerland", "syria", "taiwan", "tajikistan", "tanzania", "thailand",
    "timor-leste", "togo", "tonga", "trinidad", "tunisia", "turkey", "turkmenistan",
    "tuvalu", "uganda", "ukraine", "united arab emirates", "uae", "united kingdom", "uk",
    "united states", "usa", "us", "america", "uruguay", "uzbekistan", "vanuatu",
    "vatican", "venezuela", "vietnam", "yemen", "zambia", "zimbabwe",
];

const COUNTRY_INDICATORS: &[&str] = &[
    "sovereign nation", "republic of", "kingdom of", "nation state",
    "government of", "country located", "bordered by", "capital city",
    "national anthem", "head of state", "prime minister of", "president of the country",
];

const GROUP_INDICATORS: &[&str] = &[
    "ethnic group", "tribe", "tribal", "indigenous", "clan", "community",
    "peoples", "militant group", "rebel group", "armed group", "terrorist organization",
    "militia", "faction", "insurgent", "separatist", "guerrilla",
];

// Trailing spaces keep "his"/"her" from matching inside longer words
const PERSON_INDICATORS: &[&str] = &[
    "was born", "born in", "died in", "biography", "personal life",
    "early life", "career", "married", "children", "his ", "her ",
    "he was", "she was", "politician", "leader", "ceo", "founder",
    "president ", "minister ", "general ", "commander",
];

const ORGANIZATION_INDICATORS: &[&str] = &[
    "company", "corporation", "founded in", "headquarters", "inc.", "ltd.",
    "organization", "institution", "agency", "association", "foundation",
    "ngo", "nonprofit", "enterprise", "business", "firm", "conglomerate",
];

/// Whether `name` is a known country name (case-insensitive)
pub fn is_known_country(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    KNOWN_COUNTRIES.contains(&name.as_str())
}

fn indicator_hits(text: &str, indicators: &[&str]) -> u32 {
    indicators.iter().filter(|i| text.contains(*i)).count() as u32
}

/// Classify an entity from its name and what the documents say about it
pub fn classify_entity_type(name: &str, content: &str) -> EntityType {
    if is_known_country(name) {
        return EntityType::Country;
    }

    let text = content.to_lowercase();

    // Weights in half points: country x2, group x1.5, person and organization x1
    let scores = [
        (EntityType::Country, indicator_hits(&text, COUNTRY_INDICATORS) * 4),
        (EntityType::Group, indicator_hits(&text, GROUP_INDICATORS) * 3),
        (EntityType::Person, indicator_hits(&text, PERSON_INDICATORS) * 2),
        (EntityType::Organization, indicator_hits(&text, ORGANIZATION_INDICATORS) * 2),
    ];

    // First maximum wins on ties
    let (best, score) = scores
        .into_iter()
        .fold((EntityType::Organization, 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

    if score > 0 {
        best
    } else {
        EntityType::Organization
    }
}

/// One document an entity dossier is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySource {
    pub title: String,
    pub url: String,
}

/// Profile of a named entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDossier {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub sources: Vec<EntitySource>,
}

impl EntityDossier {
    /// Build a dossier, `None` when there are no documents
    pub fn from_documents(name: &str, documents: &[EntityDocument]) -> Option<Self> {
        if documents.is_empty() {
            return None;
        }

        let combined = documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Some(Self {
            name: name.to_string(),
            description: combined.chars().take(DESCRIPTION_CHARS).collect(),
            entity_type: classify_entity_type(name, &combined),
            sources: documents
                .iter()
                .map(|d| EntitySource {
                    title: d.title.clone(),
                    url: d.url.clone(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content: &str) -> EntityDocument {
        EntityDocument {
            title: "Profile".to_string(),
            url: "https://example.com/profile".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_known_country_short_circuits() {
        assert_eq!(classify_entity_type("  France ", "a company founded in 1900"), EntityType::Country);
        assert_eq!(classify_entity_type("UAE", ""), EntityType::Country);
        assert!(!is_known_country("Atlantis"));
    }

    #[test]
    fn test_weighted_scores() {
        // One group hit (3) outweighs one organization hit (2)
        assert_eq!(
            classify_entity_type("Wagner", "A militia operating as a company."),
            EntityType::Group
        );
        // Two person hits (4) beat one group hit (3)
        assert_eq!(
            classify_entity_type("Ivan Petrov", "A politician and commander of a faction."),
            EntityType::Person
        );
        // One country hit (4) beats one person hit (2)
        assert_eq!(
            classify_entity_type("Freedonia", "The republic of Freedonia, led by a politician."),
            EntityType::Country
        );
    }

    #[test]
    fn test_tie_keeps_declaration_order() {
        // Person and organization both score 2
        assert_eq!(
            classify_entity_type("Acme", "The founder sold the firm."),
            EntityType::Person
        );
    }

    #[test]
    fn test_no_indicator_defaults_to_organization() {
        assert_eq!(classify_entity_type("Xyzzy", "Nothing to see."), EntityType::Organization);
    }

    #[test]
    fn test_dossier_from_documents() {
        let long = "x".repeat(990);
        let documents = vec![document(&long), document("A rebel group active in the north.")];
        let dossier = EntityDossier::from_documents("Northern Front", &documents).unwrap();

        assert_eq!(dossier.entity_type, EntityType::Group);
        assert_eq!(dossier.description.chars().count(), DESCRIPTION_CHARS);
        assert!(dossier.description.starts_with(&long));
        assert_eq!(dossier.sources.len(), 2);

        let json = serde_json::to_value(&dossier).unwrap();
        assert_eq!(json["type"], "group");
    }

    #[test]
    fn test_no_documents_no_dossier() {
        assert!(EntityDossier::from_documents("Anyone", &[]).is_none());
    }
}
