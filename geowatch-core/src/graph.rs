//! Country relationship graph
//!
//! A read-only table of country profiles (neighbors, trade partners,
//! alliances, region, centroid) keyed by canonical country name. Built once
//! at startup and shared behind an `Arc` by every request.
//!
//! Profiles may name countries that have no profile of their own; such
//! dangling names are tolerated and simply yield no relationship data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ParseError;

/// Relationship data for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryProfile {
    /// ISO-3166-1 alpha-2 code
    pub code: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default)]
    pub economic_partners: Vec<String>,
    #[serde(default)]
    pub alliances: Vec<String>,
    pub region: String,
}

/// A named profile as it appears in a graph file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    #[serde(flatten)]
    pub profile: CountryProfile,
}

/// Boolean relations of a target country as seen from a source country
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relations {
    pub neighbor: bool,
    pub economic_partner: bool,
    pub shared_alliance: bool,
    pub same_region: bool,
}

/// Immutable country relationship graph.
///
/// Keeps declaration order: it is the order in which the cascade estimator
/// scans for country mentions.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    entries: Vec<(String, CountryProfile)>,
    index: HashMap<String, usize>,
}

impl RelationshipGraph {
    /// Build a graph; a repeated name replaces the earlier profile in place
    pub fn new(entries: impl IntoIterator<Item = (String, CountryProfile)>) -> Self {
        let mut graph = Self::default();
        for (name, profile) in entries {
            match graph.index.get(&name) {
                Some(&i) => graph.entries[i].1 = profile,
                None => {
                    graph.index.insert(name.clone(), graph.entries.len());
                    graph.entries.push((name, profile));
                }
            }
        }
        graph
    }

    /// The built-in table of 26 countries
    pub fn builtin() -> Self {
        Self::new(BUILTIN_COUNTRIES.iter().map(CountryRecord::to_entry))
    }

    /// Load a JSON array of [`CountryEntry`] records
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let entries: Vec<CountryEntry> = serde_json::from_str(json)
            .map_err(|e| ParseError::new(format!("invalid relationship graph: {}", e), json))?;
        Ok(Self::new(entries.into_iter().map(|e| (e.name, e.profile))))
    }

    pub fn profile(&self, name: &str) -> Option<&CountryProfile> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Country names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `b` is listed as a neighbor of `a`
    pub fn is_neighbor(&self, a: &str, b: &str) -> bool {
        self.profile(a)
            .is_some_and(|p| p.neighbors.iter().any(|n| n == b))
    }

    /// `b` is listed as an economic partner of `a`
    pub fn is_economic_partner(&self, a: &str, b: &str) -> bool {
        self.profile(a)
            .is_some_and(|p| p.economic_partners.iter().any(|n| n == b))
    }

    /// Both countries have profiles and their alliance sets intersect
    pub fn shares_alliance(&self, a: &str, b: &str) -> bool {
        match (self.profile(a), self.profile(b)) {
            (Some(pa), Some(pb)) => pa.alliances.iter().any(|x| pb.alliances.contains(x)),
            _ => false,
        }
    }

    /// Both countries have profiles in the same region
    pub fn same_region(&self, a: &str, b: &str) -> bool {
        match (self.profile(a), self.profile(b)) {
            (Some(pa), Some(pb)) => pa.region == pb.region,
            _ => false,
        }
    }

    pub fn relations(&self, source: &str, target: &str) -> Relations {
        Relations {
            neighbor: self.is_neighbor(source, target),
            economic_partner: self.is_economic_partner(source, target),
            shared_alliance: self.shares_alliance(source, target),
            same_region: self.same_region(source, target),
        }
    }
}

struct CountryRecord {
    name: &'static str,
    code: &'static str,
    lat: f64,
    lng: f64,
    neighbors: &'static [&'static str],
    economic_partners: &'static [&'static str],
    alliances: &'static [&'static str],
    region: &'static str,
}

impl CountryRecord {
    fn to_entry(&self) -> (String, CountryProfile) {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        (
            self.name.to_string(),
            CountryProfile {
                code: self.code.to_string(),
                lat: self.lat,
                lng: self.lng,
                neighbors: owned(self.neighbors),
                economic_partners: owned(self.economic_partners),
                alliances: owned(self.alliances),
                region: self.region.to_string(),
            },
        )
    }
}

static BUILTIN_COUNTRIES: &[CountryRecord] = &[
    CountryRecord {
        name: "Ukraine",
        code: "UA",
        lat: 48.3794,
        lng: 31.1656,
        neighbors: &["Russia", "Belarus", "Poland", "Slovakia", "Hungary", "Romania", "Moldova"],
        economic_partners: &["Germany", "Poland", "Turkey", "China", "Italy"],
        alliances: &["EU-candidate"],
        region: "Eastern Europe",
    },
    CountryRecord {
        name: "Russia",
        code: "RU",
        lat: 61.524,
        lng: 105.3188,
        neighbors: &[
            "Ukraine", "Belarus", "Finland", "Estonia", "Latvia", "Lithuania", "Poland", "Georgia",
            "Azerbaijan", "Kazakhstan", "China", "Mongolia", "North Korea",
        ],
        economic_partners: &["China", "India", "Turkey", "Belarus", "Kazakhstan"],
        alliances: &["CSTO", "BRICS"],
        region: "Eurasia",
    },
    CountryRecord {
        name: "China",
        code: "CN",
        lat: 35.8617,
        lng: 104.1954,
        neighbors: &[
            "Russia", "Mongolia", "North Korea", "Vietnam", "Laos", "Myanmar", "India", "Bhutan",
            "Nepal", "Pakistan", "Afghanistan", "Tajikistan", "Kyrgyzstan", "Kazakhstan",
        ],
        economic_partners: &[
            "United States", "Japan", "South Korea", "Germany", "Australia", "Vietnam",
        ],
        alliances: &["SCO", "BRICS"],
        region: "East Asia",
    },
    CountryRecord {
        name: "United States",
        code: "US",
        lat: 37.0902,
        lng: -95.7129,
        neighbors: &["Canada", "Mexico"],
        economic_partners: &[
            "China", "Canada", "Mexico", "Japan", "Germany", "United Kingdom", "South Korea",
        ],
        alliances: &["NATO", "AUKUS", "Five Eyes"],
        region: "North America",
    },
    CountryRecord {
        name: "Israel",
        code: "IL",
        lat: 31.0461,
        lng: 34.8516,
        neighbors: &["Lebanon", "Syria", "Jordan", "Egypt", "Palestine"],
        economic_partners: &["United States", "China", "United Kingdom", "Germany", "India"],
        alliances: &["US-ally"],
        region: "Middle East",
    },
    CountryRecord {
        name: "Iran",
        code: "IR",
        lat: 32.4279,
        lng: 53.688,
        neighbors: &[
            "Iraq", "Turkey", "Armenia", "Azerbaijan", "Turkmenistan", "Afghanistan", "Pakistan",
        ],
        economic_partners: &["China", "UAE", "Turkey", "Iraq", "India"],
        alliances: &["SCO-observer"],
        region: "Middle East",
    },
    CountryRecord {
        name: "Germany",
        code: "DE",
        lat: 51.1657,
        lng: 10.4515,
        neighbors: &[
            "France", "Belgium", "Netherlands", "Luxembourg", "Switzerland", "Austria",
            "Czech Republic", "Poland", "Denmark",
        ],
        economic_partners: &[
            "United States", "China", "France", "Netherlands", "United Kingdom", "Italy", "Poland",
        ],
        alliances: &["NATO", "EU"],
        region: "Western Europe",
    },
    CountryRecord {
        name: "Poland",
        code: "PL",
        lat: 51.9194,
        lng: 19.1451,
        neighbors: &[
            "Germany", "Czech Republic", "Slovakia", "Ukraine", "Belarus", "Lithuania", "Russia",
        ],
        economic_partners: &["Germany", "Czech Republic", "United Kingdom", "France", "Italy"],
        alliances: &["NATO", "EU"],
        region: "Eastern Europe",
    },
    CountryRecord {
        name: "Taiwan",
        code: "TW",
        lat: 23.6978,
        lng: 120.9605,
        neighbors: &[],
        economic_partners: &["China", "United States", "Japan", "South Korea", "Singapore"],
        alliances: &["US-partner"],
        region: "East Asia",
    },
    CountryRecord {
        name: "Japan",
        code: "JP",
        lat: 36.2048,
        lng: 138.2529,
        neighbors: &[],
        economic_partners: &["China", "United States", "South Korea", "Taiwan", "Thailand"],
        alliances: &["US-ally", "Quad"],
        region: "East Asia",
    },
    CountryRecord {
        name: "South Korea",
        code: "KR",
        lat: 35.9078,
        lng: 127.7669,
        neighbors: &["North Korea"],
        economic_partners: &["China", "United States", "Japan", "Vietnam", "Taiwan"],
        alliances: &["US-ally"],
        region: "East Asia",
    },
    CountryRecord {
        name: "North Korea",
        code: "KP",
        lat: 40.3399,
        lng: 127.5101,
        neighbors: &["South Korea", "China", "Russia"],
        economic_partners: &["China", "Russia"],
        alliances: &[],
        region: "East Asia",
    },
    CountryRecord {
        name: "India",
        code: "IN",
        lat: 20.5937,
        lng: 78.9629,
        neighbors: &["Pakistan", "China", "Nepal", "Bhutan", "Bangladesh", "Myanmar"],
        economic_partners: &["United States", "China", "UAE", "Saudi Arabia", "Iraq"],
        alliances: &["Quad", "BRICS"],
        region: "South Asia",
    },
    CountryRecord {
        name: "Pakistan",
        code: "PK",
        lat: 30.3753,
        lng: 69.3451,
        neighbors: &["India", "Afghanistan", "Iran", "China"],
        economic_partners: &["China", "UAE", "Saudi Arabia", "United States"],
        alliances: &["China-ally"],
        region: "South Asia",
    },
    CountryRecord {
        name: "Saudi Arabia",
        code: "SA",
        lat: 23.8859,
        lng: 45.0792,
        neighbors: &["Jordan", "Iraq", "Kuwait", "Qatar", "UAE", "Oman", "Yemen"],
        economic_partners: &["China", "United States", "Japan", "India", "South Korea"],
        alliances: &["GCC", "US-partner"],
        region: "Middle East",
    },
    CountryRecord {
        name: "Turkey",
        code: "TR",
        lat: 38.9637,
        lng: 35.2433,
        neighbors: &["Greece", "Bulgaria", "Georgia", "Armenia", "Iran", "Iraq", "Syria"],
        economic_partners: &["Germany", "United Kingdom", "Italy", "Iraq", "United States"],
        alliances: &["NATO"],
        region: "Middle East",
    },
    CountryRecord {
        name: "United Kingdom",
        code: "GB",
        lat: 55.3781,
        lng: -3.436,
        neighbors: &["Ireland"],
        economic_partners: &["United States", "Germany", "Netherlands", "France", "China"],
        alliances: &["NATO", "Five Eyes", "AUKUS"],
        region: "Western Europe",
    },
    CountryRecord {
        name: "France",
        code: "FR",
        lat: 46.2276,
        lng: 2.2137,
        neighbors: &[
            "Belgium", "Luxembourg", "Germany", "Switzerland", "Italy", "Spain", "Andorra", "Monaco",
        ],
        economic_partners: &["Germany", "United States", "Italy", "Spain", "Belgium"],
        alliances: &["NATO", "EU"],
        region: "Western Europe",
    },
    CountryRecord {
        name: "Syria",
        code: "SY",
        lat: 34.8021,
        lng: 38.9968,
        neighbors: &["Turkey", "Iraq", "Jordan", "Israel", "Lebanon"],
        economic_partners: &["Russia", "China", "Iran", "UAE"],
        alliances: &["Russia-ally", "Iran-ally"],
        region: "Middle East",
    },
    CountryRecord {
        name: "Lebanon",
        code: "LB",
        lat: 33.8547,
        lng: 35.8623,
        neighbors: &["Syria", "Israel"],
        economic_partners: &["UAE", "Saudi Arabia", "China", "Turkey"],
        alliances: &[],
        region: "Middle East",
    },
    CountryRecord {
        name: "Egypt",
        code: "EG",
        lat: 26.8206,
        lng: 30.8025,
        neighbors: &["Libya", "Sudan", "Israel", "Palestine"],
        economic_partners: &["United States", "UAE", "Saudi Arabia", "China", "Turkey"],
        alliances: &["US-partner", "Arab League"],
        region: "Middle East",
    },
    CountryRecord {
        name: "Sudan",
        code: "SD",
        lat: 12.8628,
        lng: 30.2176,
        neighbors: &[
            "Egypt", "Libya", "Chad", "Central African Republic", "South Sudan", "Ethiopia",
            "Eritrea",
        ],
        economic_partners: &["UAE", "China", "Saudi Arabia", "India"],
        alliances: &[],
        region: "Africa",
    },
    CountryRecord {
        name: "Ethiopia",
        code: "ET",
        lat: 9.145,
        lng: 40.4897,
        neighbors: &["Eritrea", "Djibouti", "Somalia", "Kenya", "South Sudan", "Sudan"],
        economic_partners: &["China", "United States", "Saudi Arabia", "UAE"],
        alliances: &["AU"],
        region: "Africa",
    },
    CountryRecord {
        name: "Nigeria",
        code: "NG",
        lat: 9.082,
        lng: 8.6753,
        neighbors: &["Benin", "Niger", "Chad", "Cameroon"],
        economic_partners: &["India", "United States", "Spain", "Netherlands", "France"],
        alliances: &["AU", "ECOWAS"],
        region: "Africa",
    },
    CountryRecord {
        name: "Brazil",
        code: "BR",
        lat: -14.235,
        lng: -51.9253,
        neighbors: &[
            "Argentina", "Paraguay", "Bolivia", "Peru", "Colombia", "Venezuela", "Guyana",
            "Suriname", "French Guiana", "Uruguay",
        ],
        economic_partners: &["China", "United States", "Argentina", "Netherlands", "Germany"],
        alliances: &["BRICS", "Mercosur"],
        region: "South America",
    },
    CountryRecord {
        name: "Australia",
        code: "AU",
        lat: -25.2744,
        lng: 133.7751,
        neighbors: &[],
        economic_partners: &["China", "Japan", "United States", "South Korea", "India"],
        alliances: &["AUKUS", "Five Eyes", "Quad"],
        region: "Oceania",
    },
];
