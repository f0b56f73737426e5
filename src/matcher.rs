//! Request matching against recorded interactions

use serde::{Deserialize, Serialize};

use crate::cassette::RecordedRequest;

/// Which request dimensions participate in matching
///
/// Method and url always match; headers and body are opt-in and both
/// default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Also require request headers to agree
    #[serde(default)]
    pub headers: bool,
    /// Also require request bodies to agree
    #[serde(default)]
    pub body: bool,
}

/// Decide whether a live request matches a recorded one
///
/// Method and url compare exactly (case-sensitive) after url
/// normalization; headers and bodies are compared only when enabled in
/// the configuration.
#[must_use]
pub fn requests_match(
    live: &RecordedRequest,
    recorded: &RecordedRequest,
    config: MatchConfig,
) -> bool {
    if live.method != recorded.method {
        return false;
    }

    if normalize_url(&live.url) != normalize_url(&recorded.url) {
        return false;
    }

    if config.headers && live.headers != recorded.headers {
        return false;
    }

    if config.body && live.body != recorded.body {
        return false;
    }

    true
}

/// Normalize a url for matching
///
/// Strips trivial variance: the default port for the scheme (`:80` for
/// http, `:443` for https) and an empty trailing query. Everything else,
/// including case, is preserved verbatim.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_query = trimmed.strip_suffix('?').unwrap_or(trimmed);

    let Some((scheme, rest)) = without_query.split_once("://") else {
        return without_query.to_string();
    };

    let default_port = match scheme {
        "http" => ":80",
        "https" => ":443",
        _ => return without_query.to_string(),
    };

    // Authority runs up to the first '/', '?' or '#'
    let authority_end = rest
        .find(['/', '?', '#'])
        .unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    if let Some(host) = authority.strip_suffix(default_port) {
        format!("{scheme}://{host}{tail}")
    } else {
        without_query.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::Body;

    fn request(method: &str, url: &str) -> RecordedRequest {
        RecordedRequest::new(method, url)
    }

    #[test]
    fn test_default_matches_method_and_url() {
        let live = request("GET", "http://example.com/a");
        let recorded = request("GET", "http://example.com/a");
        assert!(requests_match(&live, &recorded, MatchConfig::default()));
    }

    #[test]
    fn test_method_mismatch() {
        let live = request("POST", "http://example.com/a");
        let recorded = request("GET", "http://example.com/a");
        assert!(!requests_match(&live, &recorded, MatchConfig::default()));
    }

    #[test]
    fn test_url_mismatch() {
        let live = request("GET", "http://example.com/different_from_original");
        let recorded = request("GET", "http://example.com");
        assert!(!requests_match(&live, &recorded, MatchConfig::default()));
    }

    #[test]
    fn test_url_is_case_sensitive() {
        let live = request("GET", "http://example.com/A");
        let recorded = request("GET", "http://example.com/a");
        assert!(!requests_match(&live, &recorded, MatchConfig::default()));
    }

    #[test]
    fn test_default_port_stripped() {
        assert_eq!(normalize_url("http://example.com:80/a"), "http://example.com/a");
        assert_eq!(
            normalize_url("https://example.com:443/a"),
            "https://example.com/a"
        );
        // Non-default ports survive
        assert_eq!(
            normalize_url("http://example.com:8080/a"),
            "http://example.com:8080/a"
        );
        // Wrong scheme/port pairing survives
        assert_eq!(
            normalize_url("https://example.com:80/a"),
            "https://example.com:80/a"
        );
    }

    #[test]
    fn test_default_port_without_path() {
        assert_eq!(normalize_url("http://example.com:80"), "http://example.com");
    }

    #[test]
    fn test_empty_trailing_query_stripped() {
        assert_eq!(normalize_url("http://example.com/a?"), "http://example.com/a");
    }

    #[test]
    fn test_default_port_equivalence_in_matching() {
        let live = request("GET", "http://example.com:80/a");
        let recorded = request("GET", "http://example.com/a");
        assert!(requests_match(&live, &recorded, MatchConfig::default()));
    }

    #[test]
    fn test_headers_ignored_by_default() {
        let mut live = request("GET", "http://example.com/a");
        live.headers = vec![("Accept".to_string(), "text/html".to_string())];
        let recorded = request("GET", "http://example.com/a");

        assert!(requests_match(&live, &recorded, MatchConfig::default()));

        let strict = MatchConfig {
            headers: true,
            body: false,
        };
        assert!(!requests_match(&live, &recorded, strict));
    }

    #[test]
    fn test_body_opt_in() {
        let mut live = request("POST", "http://example.com/a");
        live.body = Some(Body::from("payload-a"));
        let mut recorded = request("POST", "http://example.com/a");
        recorded.body = Some(Body::from("payload-b"));

        assert!(requests_match(&live, &recorded, MatchConfig::default()));

        let strict = MatchConfig {
            headers: false,
            body: true,
        };
        assert!(!requests_match(&live, &recorded, strict));
    }
}
