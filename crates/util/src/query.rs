//! Query-string helpers shared by the engine and the HTTP client.

use serde_json::{Map as JsonMap, Value};
use url::form_urlencoded;

/// Parse a `k=v&k2=v2` parameter string into a JSON object.
///
/// Values are kept as strings; repeated keys are last-writer-wins. Empty or
/// whitespace-only input yields an empty map, never an error.
pub fn parse_params(params: &str) -> JsonMap<String, Value> {
    let mut out = JsonMap::new();
    let trimmed = params.trim().trim_start_matches('?');
    if trimmed.is_empty() {
        return out;
    }
    for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
        out.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    out
}

/// Append a parameter string to a URL, inserting `?` or `&` as needed.
pub fn join_url_params(url: &str, params: &str) -> String {
    let params = params.trim().trim_start_matches('?');
    if params.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{params}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_params_basic_pairs() {
        let parsed = parse_params("k=1&name=my%20app");
        assert_eq!(parsed.get("k"), Some(&json!("1")));
        assert_eq!(parsed.get("name"), Some(&json!("my app")));
    }

    #[test]
    fn parse_params_last_writer_wins() {
        let parsed = parse_params("k=1&k=2");
        assert_eq!(parsed.get("k"), Some(&json!("2")));
    }

    #[test]
    fn parse_params_tolerates_empty_and_leading_question_mark() {
        assert!(parse_params("").is_empty());
        assert!(parse_params("   ").is_empty());
        assert_eq!(parse_params("?a=b").get("a"), Some(&json!("b")));
    }

    #[test]
    fn join_url_params_picks_separator() {
        assert_eq!(join_url_params("/frag/a", "k=1"), "/frag/a?k=1");
        assert_eq!(join_url_params("/frag/a?x=0", "k=1"), "/frag/a?x=0&k=1");
        assert_eq!(join_url_params("/frag/a", ""), "/frag/a");
    }
}
