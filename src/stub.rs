//! Ad-hoc stub definitions, independent of any cassette

use serde::{Deserialize, Serialize};

use crate::cassette::{Body, Headers, RecordedResponse};

/// A directly declared request-to-response mapping
///
/// Stubs match on the exact url string only and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubDefinition {
    /// Url the stub answers, compared for exact equality
    pub url: String,
    /// Response status code
    #[serde(default = "default_status")]
    pub status: u16,
    /// Response body
    #[serde(default)]
    pub body: Body,
    /// Response headers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Headers,
}

fn default_status() -> u16 {
    200
}

impl StubDefinition {
    /// Create a stub answering `url` with the given status and body
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Body>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Build the synthetic response this stub serves
    #[must_use]
    pub fn response(&self) -> RecordedResponse {
        RecordedResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Registry of stub definitions active within one scope
///
/// Lookup is a direct url-keyed search with no positional consumption:
/// the same stub answers repeated identical requests without exhaustion.
#[derive(Debug, Clone, Default)]
pub struct StubRegistry {
    definitions: Vec<StubDefinition>,
}

impl StubRegistry {
    /// Create a registry holding the given definitions
    #[must_use]
    pub fn new(definitions: Vec<StubDefinition>) -> Self {
        Self { definitions }
    }

    /// Add definitions to the registry
    pub fn register(&mut self, definitions: impl IntoIterator<Item = StubDefinition>) {
        self.definitions.extend(definitions);
    }

    /// Find the definition whose url equals the request url
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&StubDefinition> {
        self.definitions.iter().find(|def| def.url == url)
    }

    /// Number of registered definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
