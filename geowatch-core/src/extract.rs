//! Keyword and naive named-entity extraction

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::taxonomy::full_vocabulary;

/// Maximum keywords attached to an event
pub const MAX_KEYWORDS: usize = 10;

// Well-known organisations
static ORGANISATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(United Nations|UN|NATO|EU|European Union|WHO|IMF|World Bank)\b").unwrap()
});

// "Capitalized Phrase" followed by an office of state
static GOVERNMENT_ACTOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+(?i:government|military|ministry|president|prime minister)",
    )
    .unwrap()
});

/// Vocabulary terms present in the text, first-seen order, at most 10
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower_text = text.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();

    full_vocabulary()
        .filter(|keyword| seen.insert(keyword))
        .filter(|keyword| lower_text.contains(keyword))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Distinct organisation and government-actor mentions in encounter order
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut entities = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for pattern in [&*ORGANISATION_REGEX, &*GOVERNMENT_ACTOR_REGEX] {
        for cap in pattern.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                let entity = m.as_str().trim().to_string();
                if !entity.is_empty() && seen.insert(entity.clone()) {
                    entities.push(entity);
                }
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_in_vocabulary_order() {
        let keywords = extract_keywords("Troops massed before the summit; a major emergency");
        assert_eq!(keywords, vec!["troops", "summit", "emergency", "major"]);
    }

    #[test]
    fn test_keywords_match_inside_words() {
        // "crisis" contains "isis"
        let keywords = extract_keywords("a crisis");
        assert_eq!(keywords, vec!["isis", "crisis"]);
    }

    #[test]
    fn test_keywords_deduplicated_across_vocabularies() {
        // "strike" is in two categories, "nuclear" in a category and a level
        let keywords = extract_keywords("nuclear strike");
        assert_eq!(keywords, vec!["strike", "nuclear"]);
    }

    #[test]
    fn test_keywords_bounded() {
        let text = "war battle fighting combat clash strike attack offensive invasion troops \
                    protest demonstration rally march riot earthquake flood hurricane";
        let keywords = extract_keywords(text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "war");
    }

    #[test]
    fn test_keywords_empty_text() {
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn test_entities_organisations_and_actors() {
        let text = "NATO and the UN responded after the Russian government and \
                    the Polish Prime Minister spoke. NATO said more.";
        let entities = extract_entities(text);
        assert_eq!(entities, vec!["NATO", "UN", "Russian", "Polish"]);
    }

    #[test]
    fn test_entities_multi_word_phrase() {
        let entities = extract_entities("The South Korean military raised its alert");
        assert_eq!(entities, vec!["The South Korean"]);
    }

    #[test]
    fn test_entities_none_found() {
        assert!(extract_entities("nothing notable happened today").is_empty());
    }
}
