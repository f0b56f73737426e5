//! Recorder state machine deciding replay, record, or stub per call

use tracing::{debug, info};

use crate::cassette::{Cassette, FailureKind, Interaction, Outcome, RecordedRequest, RecordedResponse};
use crate::matcher::{self, MatchConfig};
use crate::storage::CassetteStore;
use crate::stub::{StubDefinition, StubRegistry};
use crate::{Result, TapedeckError};

/// Active state of a recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Cassette name was unused; live calls are forwarded and captured
    Recording,
    /// Cassette had persisted content; calls are answered from it
    Replaying,
    /// Stub definitions answer calls; no store, no network
    Stubbing,
}

/// What the interceptor should do with one intercepted call
#[derive(Debug, Clone)]
pub enum Decision {
    /// No recorder is active; forward to the network, unrecorded
    Passthrough,
    /// Forward to the network and feed the outcome back for recording
    ForwardAndRecord,
    /// Serve the recorded outcome without touching the network
    Replay(Outcome),
    /// Serve a synthetic stub response
    Stub(RecordedResponse),
}

/// Per-scope recorder owning the current cassette's state
///
/// Exactly one recorder is active per thread at a time; the scope layer
/// enforces that. The recorder itself only decides what each intercepted
/// call does and accumulates newly captured interactions.
#[derive(Debug)]
pub struct Recorder {
    mode: Mode,
    match_config: MatchConfig,
}

#[derive(Debug)]
enum Mode {
    Recording {
        cassette: Cassette,
        store: CassetteStore,
    },
    Replaying {
        cassette: Cassette,
        consumed: Vec<bool>,
    },
    Stubbing {
        registry: StubRegistry,
    },
}

impl Recorder {
    /// Open a named cassette scope
    ///
    /// A store miss (or an empty persisted cassette) selects recording;
    /// persisted content selects replaying, starting at interaction 0.
    ///
    /// # Errors
    ///
    /// Returns error if an existing cassette file cannot be loaded
    pub fn for_cassette(
        store: &CassetteStore,
        name: &str,
        match_config: MatchConfig,
    ) -> Result<Self> {
        let mode = match store.load(name)? {
            Some(cassette) if !cassette.is_empty() => {
                info!(
                    "Replaying cassette '{}': {} interactions",
                    name,
                    cassette.interactions.len()
                );
                let consumed = vec![false; cassette.interactions.len()];
                Mode::Replaying { cassette, consumed }
            }
            _ => {
                info!("Recording cassette '{}'", name);
                Mode::Recording {
                    cassette: Cassette::empty(name),
                    store: store.clone(),
                }
            }
        };

        Ok(Self { mode, match_config })
    }

    /// Open a stub scope; never touches the cassette store
    #[must_use]
    pub fn for_stubs(definitions: Vec<StubDefinition>) -> Self {
        info!("Stubbing scope: {} definitions", definitions.len());
        Self {
            mode: Mode::Stubbing {
                registry: StubRegistry::new(definitions),
            },
            match_config: MatchConfig::default(),
        }
    }

    /// Current state of this recorder
    #[must_use]
    pub fn state(&self) -> RecorderState {
        match self.mode {
            Mode::Recording { .. } => RecorderState::Recording,
            Mode::Replaying { .. } => RecorderState::Replaying,
            Mode::Stubbing { .. } => RecorderState::Stubbing,
        }
    }

    /// Decide how an intercepted call is handled
    ///
    /// Replay consumes interactions statefully: the live request takes
    /// the first not-yet-consumed interaction, in recorded order, whose
    /// configured match dimensions agree. Replay never falls back to the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotMatch` when unconsumed interactions remain but
    /// none match, `CassetteExhausted` when the cassette is used up, and
    /// `RequestNotMatch` for a stub scope with no definition for the url
    pub fn decide(&mut self, request: &RecordedRequest) -> Result<Decision> {
        match &mut self.mode {
            Mode::Recording { .. } => {
                debug!("Record: forwarding {} {}", request.method, request.url);
                Ok(Decision::ForwardAndRecord)
            }
            Mode::Replaying { cassette, consumed } => {
                next_match(cassette, consumed, request, self.match_config)
                    .map(Decision::Replay)
            }
            Mode::Stubbing { registry } => match registry.lookup(&request.url) {
                Some(stub) => {
                    debug!("Stub hit: {} {}", request.method, request.url);
                    Ok(Decision::Stub(stub.response()))
                }
                None => Err(TapedeckError::RequestNotMatch {
                    method: request.method.clone(),
                    url: request.url.clone(),
                }),
            },
        }
    }

    /// Append a captured interaction while recording
    ///
    /// Timed-out forwards are never persisted: nothing is recorded for
    /// calls that did not complete. Outside recording mode this is a
    /// no-op.
    pub fn record(&mut self, request: RecordedRequest, outcome: Outcome) {
        if let Outcome::Error(failure) = &outcome {
            if failure.kind == FailureKind::Timeout {
                debug!("Not recording timed-out call: {} {}", request.method, request.url);
                return;
            }
        }

        if let Mode::Recording { cassette, .. } = &mut self.mode {
            debug!(
                "Recorded interaction {}: {} {}",
                cassette.interactions.len(),
                request.method,
                request.url
            );
            cassette.interactions.push(Interaction { request, outcome });
        } else {
            debug!("Ignoring record outside recording mode");
        }
    }

    /// Number of interactions appended during this scope
    #[must_use]
    pub fn appended(&self) -> usize {
        match &self.mode {
            Mode::Recording { cassette, .. } => cassette.interactions.len(),
            _ => 0,
        }
    }

    /// Close the scope, persisting a recording cassette if anything was
    /// captured
    ///
    /// # Errors
    ///
    /// Returns error if the cassette cannot be saved
    pub fn finish(self) -> Result<()> {
        match self.mode {
            Mode::Recording { cassette, store } => {
                if cassette.is_empty() {
                    debug!("Cassette '{}' captured nothing, not persisting", cassette.name);
                    Ok(())
                } else {
                    store.save(&cassette)
                }
            }
            Mode::Replaying { .. } | Mode::Stubbing { .. } => Ok(()),
        }
    }
}

/// Find and consume the next matching interaction
fn next_match(
    cassette: &Cassette,
    consumed: &mut [bool],
    request: &RecordedRequest,
    config: MatchConfig,
) -> Result<Outcome> {
    let mut any_unconsumed = false;

    for (index, interaction) in cassette.interactions.iter().enumerate() {
        if consumed[index] {
            continue;
        }
        any_unconsumed = true;

        if matcher::requests_match(request, &interaction.request, config) {
            debug!(
                "Replay hit {}: {} {}",
                index, request.method, request.url
            );
            consumed[index] = true;
            return Ok(interaction.outcome.clone());
        }
    }

    if any_unconsumed {
        Err(TapedeckError::RequestNotMatch {
            method: request.method.clone(),
            url: request.url.clone(),
        })
    } else {
        Err(TapedeckError::CassetteExhausted {
            method: request.method.clone(),
            url: request.url.clone(),
        })
    }
}
