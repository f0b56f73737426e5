//! Cassette data model: interactions, bodies, and captured failures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered header mapping, order preserved from the wire
pub type Headers = Vec<(String, String)>;

/// Binary-safe HTTP body
///
/// Serializes as a plain string when the bytes are valid UTF-8, and as a
/// hex string otherwise, so cassette files stay diffable while still
/// round-tripping arbitrary bytes losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BodyRepr", try_from = "BodyRepr")]
pub struct Body(pub Vec<u8>);

impl Body {
    /// Body bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the body is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// On-disk body encoding
#[derive(Serialize, Deserialize)]
#[serde(tag = "encoding", content = "data", rename_all = "lowercase")]
enum BodyRepr {
    Utf8(String),
    Hex(String),
}

impl From<Body> for BodyRepr {
    fn from(body: Body) -> Self {
        match String::from_utf8(body.0) {
            Ok(text) => Self::Utf8(text),
            Err(err) => Self::Hex(hex::encode(err.into_bytes())),
        }
    }
}

impl TryFrom<BodyRepr> for Body {
    type Error = String;

    fn try_from(repr: BodyRepr) -> Result<Self, Self::Error> {
        match repr {
            BodyRepr::Utf8(text) => Ok(Self(text.into_bytes())),
            BodyRepr::Hex(encoded) => hex::decode(&encoded)
                .map(Self)
                .map_err(|e| format!("invalid hex body: {e}")),
        }
    }
}

/// Canonical shape of an outgoing HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Full request url
    pub url: String,
    /// Request headers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Headers,
    /// Request body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl RecordedRequest {
    /// Create a request with no headers and no body
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// Canonical shape of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Headers,
    /// Response body
    #[serde(default, skip_serializing_if = "Body::is_empty")]
    pub body: Body,
}

/// Classified kind of a captured network failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Connection could not be established
    Connect,
    /// Name resolution failed
    Dns,
    /// Request did not complete in time
    Timeout,
    /// Transport-level I/O failure
    Io,
    /// Protocol-level failure
    Protocol,
    /// Unclassified failure
    Other,
}

/// Captured network failure, stored verbatim in place of a response
///
/// Replaying a cassette re-surfaces the identical descriptor, including
/// the nested cause chain, without any connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFailure {
    /// Failure classification
    pub kind: FailureKind,
    /// Failure message as observed live
    pub message: String,
    /// Nested cause, innermost last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<NetworkFailure>>,
}

impl NetworkFailure {
    /// Create a failure with no cause chain
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a nested cause
    #[must_use]
    pub fn with_cause(mut self, cause: NetworkFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)?;
        if let Some(cause) = &self.cause {
            write!(f, ": caused by: {cause}")?;
        }
        Ok(())
    }
}

/// Outcome of one recorded exchange: a response or a captured failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The server answered
    Response(RecordedResponse),
    /// The exchange failed before a response arrived
    Error(NetworkFailure),
}

/// One recorded request/response (or request/failure) pair
///
/// Immutable once created; the externally tagged outcome guarantees the
/// record holds exactly one of response or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// The request as sent
    pub request: RecordedRequest,
    /// What came back
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Named, ordered sequence of recorded interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cassette {
    /// Cassette name, maps to one file in the store
    pub name: String,
    /// Interactions in original recording order
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Create an empty cassette for a fresh recording scope
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interactions: Vec::new(),
        }
    }

    /// Whether the cassette has any interactions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}
