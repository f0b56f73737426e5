//! Interceptor sitting between client code and the real network

use tracing::debug;

use crate::cassette::{FailureKind, Outcome, RecordedRequest, RecordedResponse};
use crate::recorder::Decision;
use crate::scope;
use crate::transport::Transport;
use crate::{Result, TapedeckError};

/// Hooks one client library's send boundary
///
/// Every call delegates to the recorder active on the current thread:
/// replayed and stubbed calls are answered synchronously from memory,
/// recording and passthrough calls go out through the wrapped transport.
/// A replayed failure surfaces as the identical error the live call
/// produced, cause chain included.
pub struct Interceptor<T: Transport> {
    transport: T,
}

impl<T: Transport> Interceptor<T> {
    /// Wrap a transport
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The wrapped transport
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one intercepted call
    ///
    /// Scope state is thread-local: a call belonging to a cassette scope
    /// must run start to finish on the thread that entered the scope, so
    /// async interception needs a current-thread runtime (or a pinned
    /// task). A recording call that resumes on another worker thread
    /// after the forward fails with `ScopeNotActive` instead of losing
    /// the interaction silently.
    ///
    /// # Errors
    ///
    /// Returns match failures from the active scope, replayed network
    /// failures, live transport errors, and `ScopeNotActive` when a
    /// captured outcome cannot be recorded
    pub async fn intercept(&self, request: RecordedRequest) -> Result<RecordedResponse> {
        match scope::decide(&request)? {
            Decision::Passthrough => {
                debug!("Passthrough: {} {}", request.method, request.url);
                self.transport.send(&request).await
            }
            Decision::Replay(Outcome::Response(response)) => {
                debug!("Replayed: {} {} -> {}", request.method, request.url, response.status);
                Ok(response)
            }
            Decision::Replay(Outcome::Error(failure)) => {
                debug!("Replayed failure: {} {} -> {}", request.method, request.url, failure);
                Err(TapedeckError::Network(failure))
            }
            Decision::Stub(response) => {
                debug!("Stubbed: {} {} -> {}", request.method, request.url, response.status);
                Ok(response)
            }
            Decision::ForwardAndRecord => self.forward_and_record(request).await,
        }
    }

    async fn forward_and_record(&self, request: RecordedRequest) -> Result<RecordedResponse> {
        match self.transport.send(&request).await {
            Ok(response) => {
                scope::record(request, Outcome::Response(response.clone()))?;
                Ok(response)
            }
            Err(TapedeckError::Network(failure)) => {
                // Recording is transparent to the caller's error handling:
                // the captured failure is stored and re-raised as-is. The
                // recorder itself refuses timed-out outcomes.
                if failure.kind != FailureKind::Timeout {
                    scope::record(request, Outcome::Error(failure.clone()))?;
                }
                Err(TapedeckError::Network(failure))
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::NetworkFailure;
    use crate::matcher::MatchConfig;
    use crate::storage::CassetteStore;
    use std::cell::{Cell, RefCell};
    use tempfile::TempDir;

    /// Scripted transport answering from a queue, tracking call counts
    struct ScriptedTransport {
        outcomes: RefCell<Vec<Result<RecordedResponse>>>,
        calls: Cell<usize>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<RecordedResponse>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes),
                calls: Cell::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &RecordedRequest) -> Result<RecordedResponse> {
            self.calls.set(self.calls.get() + 1);
            let mut outcomes = self.outcomes.borrow_mut();
            assert!(!outcomes.is_empty(), "scripted transport exhausted");
            outcomes.remove(0)
        }
    }

    fn ok(status: u16, body: &str) -> Result<RecordedResponse> {
        Ok(RecordedResponse {
            status,
            headers: vec![],
            body: body.into(),
        })
    }

    #[tokio::test]
    async fn test_passthrough_without_scope() {
        let interceptor = Interceptor::new(ScriptedTransport::new(vec![ok(200, "live")]));

        let response = interceptor
            .intercept(RecordedRequest::new("GET", "http://example.com/server"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(interceptor.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_recording_captures_forwarded_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let store = CassetteStore::new(temp_dir.path());
        let interceptor = Interceptor::new(ScriptedTransport::new(vec![ok(200, "recorded")]));

        scope::begin(&store, "captured", MatchConfig::default()).unwrap();
        let response = interceptor
            .intercept(RecordedRequest::new("GET", "http://example.com/server"))
            .await
            .unwrap();
        scope::end().unwrap();

        assert_eq!(response.status, 200);
        let cassette = store.load("captured").unwrap().unwrap();
        assert_eq!(cassette.interactions.len(), 1);
    }

    #[tokio::test]
    async fn test_recording_captures_failure_and_reraises() {
        let temp_dir = TempDir::new().unwrap();
        let store = CassetteStore::new(temp_dir.path());

        let failure = NetworkFailure::new(FailureKind::Connect, "connection refused");
        let interceptor = Interceptor::new(ScriptedTransport::new(vec![Err(
            TapedeckError::Network(failure.clone()),
        )]));

        scope::begin(&store, "refused", MatchConfig::default()).unwrap();
        let err = interceptor
            .intercept(RecordedRequest::new("GET", "http://unreachable.invalid/"))
            .await
            .unwrap_err();
        scope::end().unwrap();

        let TapedeckError::Network(raised) = err else {
            panic!("expected network failure");
        };
        assert_eq!(raised, failure);

        let cassette = store.load("refused").unwrap().unwrap();
        assert!(matches!(cassette.interactions[0].outcome, Outcome::Error(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_reraised_but_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let store = CassetteStore::new(temp_dir.path());

        let interceptor = Interceptor::new(ScriptedTransport::new(vec![Err(
            TapedeckError::Network(NetworkFailure::new(FailureKind::Timeout, "deadline exceeded")),
        )]));

        scope::begin(&store, "timed_out", MatchConfig::default()).unwrap();
        let err = interceptor
            .intercept(RecordedRequest::new("GET", "http://slow.example.com/"))
            .await
            .unwrap_err();
        scope::end().unwrap();

        assert!(matches!(err, TapedeckError::Network(_)));
        assert!(
            store.load("timed_out").unwrap().is_none(),
            "timed-out calls must not be persisted"
        );
    }

    #[tokio::test]
    async fn test_replay_makes_no_transport_calls() {
        let temp_dir = TempDir::new().unwrap();
        let store = CassetteStore::new(temp_dir.path());

        {
            let interceptor = Interceptor::new(ScriptedTransport::new(vec![ok(200, "first")]));
            scope::begin(&store, "no_network", MatchConfig::default()).unwrap();
            interceptor
                .intercept(RecordedRequest::new("GET", "http://example.com/server"))
                .await
                .unwrap();
            scope::end().unwrap();
        }

        let interceptor = Interceptor::new(ScriptedTransport::new(vec![]));
        scope::begin(&store, "no_network", MatchConfig::default()).unwrap();
        let response = interceptor
            .intercept(RecordedRequest::new("GET", "http://example.com/server"))
            .await
            .unwrap();
        scope::end().unwrap();

        assert_eq!(response.body, "first".into());
        assert_eq!(interceptor.transport.calls(), 0);
    }
}
