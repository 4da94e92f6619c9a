//! Boilerplate removal for scraped news text
//!
//! Strips navigation, cookie, subscription, sharing and advert chrome plus
//! bare page-section labels ("Menu", "Sports", ...), then tidies whitespace.
//! Matched spans are deleted outright, never replaced by placeholders.

use regex::Regex;
use std::sync::LazyLock;

/// Boilerplate patterns, applied in order
static BOILERPLATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)skip to (?:main |primary )?content",
        r"(?i)keyboard shortcuts?(?: for audio player)?",
        r"(?i)toggle navigation",
        r"(?i)search(?:\s+the site)?",
        r"(?i)sign (?:in|up|out)",
        r"(?i)log (?:in|out)",
        r"(?i)subscribe(?:\s+now)?",
        r"(?i)newsletter",
        r"(?i)privacy policy",
        r"(?i)terms (?:of (?:service|use)|and conditions)",
        r"(?i)cookie (?:policy|settings|preferences)",
        r"(?i)about us",
        r"(?i)contact us",
        r"(?i)advertise (?:with us)?",
        r"(?i)careers",
        r"(?i)weather (?:today|forecast)?",
        r"(?i)all rights reserved",
        r"(?i)copyright \d{4}",
        r"(?i)follow us on",
        r"(?i)share (?:this|on)",
        r"(?i)related (?:articles|stories|posts)",
        r"(?i)recommended (?:for you|articles)",
        r"(?i)trending (?:now|stories)",
        r"(?i)most (?:read|popular|viewed)",
        r"(?i)read more",
        r"(?i)continue reading",
        r"(?i)load(?:ing)? more",
        r"(?i)view (?:all|more)",
        r"(?i)see (?:all|more)",
        r"(?i)advertisement",
        r"(?i)sponsored (?:content|by)",
        r"(?i)click here",
        r"(?i)tap (?:here|to)",
        r"(?i)download (?:our )?app",
        r"(?i)get the app",
        r"(?i)breaking news alert",
        r"(?i)live updates?",
        // Page-section labels standing alone on a line
        r"(?im)^\s*menu\s*$",
        r"(?im)^\s*home\s*$",
        r"(?im)^\s*news\s*$",
        r"(?im)^\s*sports?\s*$",
        r"(?im)^\s*entertainment\s*$",
        r"(?im)^\s*business\s*$",
        r"(?im)^\s*tech(?:nology)?\s*$",
        r"(?im)^\s*opinion\s*$",
        r"(?im)^\s*video\s*$",
        r"(?im)^\s*photos?\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static HORIZONTAL_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").unwrap());

/// Remove boilerplate and collapse whitespace.
///
/// Idempotent: the cleaning pass is repeated until the text stops changing,
/// so spans that only become boilerplate after an earlier removal are caught
/// too. Every pass that changes the text shortens it, which bounds the loop.
pub fn normalize(text: &str) -> String {
    let mut current = text.replace("\r\n", "\n");

    loop {
        let next = clean_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let mut cleaned = text.to_string();

    for pattern in BOILERPLATE_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
    }

    let collapsed = HORIZONTAL_RUNS.replace_all(&cleaned, " ");
    let trimmed_lines = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    EXCESS_NEWLINES
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}
