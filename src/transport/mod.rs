//! Transport adapters bridging client libraries to the canonical
//! request/response shapes

mod client;

pub use client::HyperTransport;

use crate::cassette::{RecordedRequest, RecordedResponse};
use crate::Result;

/// The send boundary of one HTTP client library
///
/// Each supported client gets one implementation translating its call
/// signature into the canonical `RecordedRequest` shape and back. Network
/// failures must surface as `TapedeckError::Network` so the recorder can
/// capture them verbatim.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Perform the real network exchange for a request
    ///
    /// # Errors
    ///
    /// Returns `TapedeckError::Network` for connection-level failures and
    /// other variants for request construction problems
    async fn send(&self, request: &RecordedRequest) -> Result<RecordedResponse>;
}
