//! Search result normalization
//!
//! Provider results arrive as loosely typed JSON. Titles default to
//! "Untitled", non-string content becomes empty, and published dates are
//! accepted as date strings or epoch numbers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use scraper::node::Node;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Source label used when a result names none
pub const DEFAULT_SOURCE: &str = "web";

/// Epoch numbers above this are milliseconds, below it seconds
const MILLIS_THRESHOLD: f64 = 1e12;

static HTML_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:html|body|div|p|span|br|a|h[1-6]|ul|ol|li|table|article|section|script|style)\b[^>]*>")
        .unwrap()
});

/// One normalized search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    pub fn new(title: &str, url: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
            published_date: None,
            source: None,
        }
    }

    /// Normalize one raw provider result
    pub fn from_value(value: &Value) -> Self {
        let date = value
            .get("date")
            .filter(|v| !is_falsy(v))
            .or_else(|| value.get("publication_date"));

        Self {
            title: str_field(value, "title").unwrap_or("Untitled").to_string(),
            url: str_field(value, "url").unwrap_or_default().to_string(),
            content: value
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            published_date: date.and_then(parse_published_date),
            source: str_field(value, "source").map(str::to_string),
        }
    }

    pub fn source_or_default(&self) -> &str {
        self.source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SOURCE)
    }

    /// Content reduced to visible text when it carries HTML markup
    pub fn plain_content(&self) -> String {
        if looks_like_html(&self.content) {
            html_to_text(&self.content)
        } else {
            self.content.clone()
        }
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        _ => false,
    }
}

/// Parse a published date from a string or an epoch number
pub fn parse_published_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => {
            let n = n.as_f64()?;
            if n == 0.0 {
                return None;
            }
            let millis = if n > MILLIS_THRESHOLD { n } else { n * 1000.0 };
            DateTime::from_timestamp_millis(millis as i64)
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn looks_like_html(text: &str) -> bool {
    HTML_TAG_REGEX.is_match(text)
}

/// Visible text of an HTML fragment, one line per text node
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text_parts = Vec::new();

    for node_ref in document.root_element().descendants() {
        if let Node::Text(text_node) = node_ref.value() {
            let in_excluded = node_ref.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"))
            });

            if !in_excluded {
                let trimmed = text_node.trim();
                if !trimmed.is_empty() {
                    text_parts.push(trimmed.to_string());
                }
            }
        }
    }

    text_parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_defaults_for_missing_fields() {
        let result = SearchResult::from_value(&json!({
            "url": "https://example.com",
            "content": {"blocks": []}
        }));
        assert_eq!(result.title, "Untitled");
        assert_eq!(result.content, "");
        assert_eq!(result.source_or_default(), "web");
        assert!(result.published_date.is_none());
    }

    #[test]
    fn test_date_from_iso_string() {
        let result = SearchResult::from_value(&json!({
            "title": "Port closed",
            "date": "2024-11-02T08:30:00Z",
            "source": "reuters"
        }));
        assert_eq!(
            result.published_date,
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 8, 30, 0).unwrap())
        );
        assert_eq!(result.source_or_default(), "reuters");
    }

    #[test]
    fn test_date_falls_back_to_publication_date() {
        let result = SearchResult::from_value(&json!({
            "title": "Port closed",
            "date": null,
            "publication_date": "2024-11-02"
        }));
        assert_eq!(
            result.published_date,
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_published_date(&json!(1704067200)), Some(expected));
        assert_eq!(parse_published_date(&json!(1704067200000_i64)), Some(expected));
    }

    #[test]
    fn test_unparseable_dates_dropped() {
        assert!(parse_published_date(&json!("last Tuesday")).is_none());
        assert!(parse_published_date(&json!(true)).is_none());
        assert!(parse_published_date(&json!("")).is_none());
    }

    #[test]
    fn test_html_content_reduced_to_text() {
        let result = SearchResult::new(
            "Protest",
            "https://example.com",
            "<div><p>Crowds gathered downtown.</p><script>track()</script>\
             <style>.x{}</style><p>Police responded.</p></div>",
        );
        assert_eq!(
            result.plain_content(),
            "Crowds gathered downtown.\nPolice responded."
        );
    }

    #[test]
    fn test_plain_text_left_alone() {
        let result = SearchResult::new("t", "u", "Inflation rose 3% < 5% target");
        assert_eq!(result.plain_content(), "Inflation rose 3% < 5% target");
    }
}
