//! Hyper-backed transport for real network passthrough

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::cassette::{FailureKind, NetworkFailure, RecordedRequest, RecordedResponse};
use crate::transport::Transport;
use crate::{Result, TapedeckError};

/// Transport using the hyper legacy client
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// Create a transport with pooled connections and no timeout
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build_http();

        Self {
            client,
            timeout: None,
        }
    }

    /// Apply a per-request timeout
    ///
    /// Timed-out calls surface a `Timeout` failure, which the recorder
    /// never persists.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn exchange(&self, request: &RecordedRequest) -> Result<RecordedResponse> {
        let uri = request.url.parse::<Uri>().map_err(|e| {
            TapedeckError::Other(format!("invalid url '{}': {e}", request.url))
        })?;

        let method = request.method.parse::<Method>().map_err(|e| {
            TapedeckError::Other(format!("invalid HTTP method '{}': {e}", request.method))
        })?;

        debug!("Forwarding {} {}", request.method, request.url);

        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let body = request
            .body
            .as_ref()
            .map(|b| b.as_bytes().to_vec())
            .unwrap_or_default();
        let http_request = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| TapedeckError::Other(format!("failed to build request: {e}")))?;

        let response = self.client.request(http_request).await.map_err(|e| {
            warn!("Forward failed: {e}");
            TapedeckError::Network(failure_from_error(&e))
        })?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TapedeckError::Network(failure_from_error(&e)))?
            .to_bytes();

        Ok(RecordedResponse {
            status,
            headers,
            body: body_bytes.to_vec().into(),
        })
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: &RecordedRequest) -> Result<RecordedResponse> {
        match self.timeout {
            None => self.exchange(request).await,
            Some(limit) => match tokio::time::timeout(limit, self.exchange(request)).await {
                Ok(result) => result,
                Err(_) => Err(TapedeckError::Network(NetworkFailure::new(
                    FailureKind::Timeout,
                    format!("request timed out after {limit:?}"),
                ))),
            },
        }
    }
}

/// Convert wire headers to ordered pairs
///
/// Header values are not guaranteed to be UTF-8; undecodable bytes are
/// replaced rather than swallowing the whole value.
fn header_pairs(headers: &hyper::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Build a failure descriptor from an error and its source chain
fn failure_from_error(err: &(dyn StdError + 'static)) -> NetworkFailure {
    let mut failure = NetworkFailure::new(classify(err), err.to_string());
    if let Some(source) = err.source() {
        failure = failure.with_cause(failure_from_error(source));
    }
    failure
}

/// Classify one error in a chain
fn classify(err: &(dyn StdError + 'static)) -> FailureKind {
    if let Some(io_err) = err.downcast_ref::<io::Error>() {
        return match io_err.kind() {
            io::ErrorKind::TimedOut => FailureKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => FailureKind::Connect,
            _ => FailureKind::Io,
        };
    }

    if err.downcast_ref::<hyper::Error>().is_some() {
        return FailureKind::Protocol;
    }

    let message = err.to_string();
    if message.contains("dns") || message.contains("resolve") {
        FailureKind::Dns
    } else if message.contains("connect") {
        FailureKind::Connect
    } else {
        FailureKind::Other
    }
}
