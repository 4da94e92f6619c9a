//! Rule-based event classification
//!
//! Two deliberately different algorithms:
//! - Category: best score wins, ties go to the earlier category, `conflict`
//!   when nothing matches.
//! - Threat level: the first keyword found, scanning levels in priority
//!   order, wins; `medium` when nothing matches.
//!
//! Matching is plain substring matching on lower-cased text, so "strike"
//! counts inside "airstrike" and "hunger strike" alike.

use crate::taxonomy::{CATEGORY_KEYWORDS, THREAT_LEVEL_KEYWORDS};
use crate::{EventCategory, ThreatLevel};

/// Category used when no keyword of any category is present
pub const DEFAULT_CATEGORY: EventCategory = EventCategory::Conflict;

/// Threat level used when no severity keyword is present
pub const DEFAULT_THREAT_LEVEL: ThreatLevel = ThreatLevel::Medium;

/// Number of distinct keywords of `keywords` present in `lower_text`
fn keyword_score(lower_text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lower_text.contains(**keyword))
        .count()
}

/// Per-category keyword scores, in canonical order
pub fn category_scores(text: &str) -> Vec<(EventCategory, usize)> {
    let lower_text = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| (*category, keyword_score(&lower_text, keywords)))
        .collect()
}

/// Pick the category with the strictly highest keyword score
pub fn classify_category(text: &str) -> EventCategory {
    let mut best_match = DEFAULT_CATEGORY;
    let mut best_score = 0;

    for (category, score) in category_scores(text) {
        if score > best_score {
            best_score = score;
            best_match = category;
        }
    }

    best_match
}

/// Pick the level of the first severity keyword found
pub fn classify_threat_level(text: &str) -> ThreatLevel {
    let lower_text = text.to_lowercase();

    for (level, keywords) in THREAT_LEVEL_KEYWORDS {
        if keywords.iter().any(|keyword| lower_text.contains(keyword)) {
            return *level;
        }
    }

    DEFAULT_THREAT_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_score_wins() {
        let text = "Earthquake and tsunami warning after landslide";
        assert_eq!(classify_category(text), EventCategory::Disaster);
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // conflict ("clash") and protest ("rally") score 1 each; conflict is
        // declared first.
        assert_eq!(classify_category("A clash at the rally"), EventCategory::Conflict);
    }

    #[test]
    fn test_protest_rally_sanctions_talks() {
        let text = "Massive protest rally erupts amid economic sanctions talks";
        let scores = category_scores(text);
        let score_of = |c: EventCategory| scores.iter().find(|(x, _)| *x == c).unwrap().1;

        assert_eq!(score_of(EventCategory::Protest), 2);
        assert_eq!(score_of(EventCategory::Diplomatic), 2);
        assert_eq!(score_of(EventCategory::Economic), 1);
        // protest is declared before diplomatic
        assert_eq!(classify_category(text), EventCategory::Protest);
    }

    #[test]
    fn test_no_match_falls_back_to_conflict() {
        // Misleading but intended: nothing here is a conflict.
        assert_eq!(classify_category("Local bakery opens new branch"), EventCategory::Conflict);
        assert_eq!(classify_category(""), EventCategory::Conflict);
    }

    #[test]
    fn test_substring_overlap_counts_strike_for_conflict() {
        // "hunger strike" and "airstrike" both hit the shared "strike" keyword,
        // and the tie resolves to conflict.
        assert_eq!(classify_category("Prisoners begin hunger strike"), EventCategory::Conflict);
        assert_eq!(classify_category("Overnight airstrike hits depot"), EventCategory::Conflict);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        // "flood" four times is still one disaster point; two cyber keywords win
        let text = "flood flood flood flood after the ransomware breach";
        assert_eq!(classify_category(text), EventCategory::Cyber);
    }

    #[test]
    fn test_category_is_deterministic() {
        let text = "Navy deploys missile destroyer near disputed strait";
        assert_eq!(classify_category(text), classify_category(text));
        assert_eq!(classify_category(text), EventCategory::Military);
    }

    #[test]
    fn test_critical_keyword_beats_earlier_low_keywords() {
        let text = "A minor, limited and isolated incident, later declared an emergency";
        assert_eq!(classify_threat_level(text), ThreatLevel::Critical);
    }

    #[test]
    fn test_threat_level_is_first_hit_not_best_score() {
        // One high keyword outranks several low and info keywords
        let text = "Severe storm: minor, contained, localized damage in latest update";
        assert_eq!(classify_threat_level(text), ThreatLevel::High);
    }

    #[test]
    fn test_threat_level_defaults_to_medium() {
        assert_eq!(classify_threat_level("Quiet day at the harbour"), ThreatLevel::Medium);
    }

    #[test]
    fn test_threat_level_is_case_insensitive() {
        assert_eq!(classify_threat_level("OFFICIAL STATEMENT"), ThreatLevel::Info);
    }
}
