//! Thread-local scope management for the active recorder
//!
//! Exactly one recorder may be active per thread. Scopes never nest:
//! entering a second scope fails fast with `ScopeReentry`, and teardown
//! always restores the inactive (pure passthrough) state, even when
//! persisting the cassette fails.

use std::cell::RefCell;

use tracing::debug;

use crate::cassette::{Outcome, RecordedRequest};
use crate::matcher::MatchConfig;
use crate::recorder::{Decision, Recorder, RecorderState};
use crate::storage::CassetteStore;
use crate::stub::StubDefinition;
use crate::{Result, TapedeckError};

thread_local! {
    static ACTIVE: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

/// State of the recorder active on this thread, if any
#[must_use]
pub fn current() -> Option<RecorderState> {
    ACTIVE.with(|cell| cell.borrow().as_ref().map(Recorder::state))
}

/// Activate a recorder on this thread
///
/// # Errors
///
/// Returns `ScopeReentry` if a recorder is already active
pub fn activate(recorder: Recorder) -> Result<()> {
    ACTIVE.with(|cell| {
        let mut active = cell.borrow_mut();
        if active.is_some() {
            return Err(TapedeckError::ScopeReentry);
        }
        debug!("Scope activated: {:?}", recorder.state());
        *active = Some(recorder);
        Ok(())
    })
}

/// Deactivate and return the recorder active on this thread
///
/// # Errors
///
/// Returns `ScopeNotActive` if no recorder is active
pub fn deactivate() -> Result<Recorder> {
    ACTIVE.with(|cell| {
        cell.borrow_mut()
            .take()
            .ok_or(TapedeckError::ScopeNotActive)
    })
}

/// Enter a named cassette scope
///
/// An unused name starts recording; persisted content starts replaying
/// from interaction 0.
///
/// Scope state is thread-local: every intercepted call of the scope,
/// including the record step after an awaited forward, must run on the
/// thread that entered the scope. Async interception therefore needs a
/// current-thread runtime (or a pinned task); a call that resumes on
/// another worker thread fails with `ScopeNotActive` when it tries to
/// record.
///
/// # Errors
///
/// Returns error if a scope is already active or the cassette cannot be
/// loaded
pub fn begin(store: &CassetteStore, name: &str, match_config: MatchConfig) -> Result<()> {
    let recorder = Recorder::for_cassette(store, name, match_config)?;
    activate(recorder)
}

/// Enter a stub scope; the cassette store is never touched
///
/// # Errors
///
/// Returns error if a scope is already active
pub fn begin_stub(definitions: Vec<StubDefinition>) -> Result<()> {
    activate(Recorder::for_stubs(definitions))
}

/// Exit the active scope
///
/// A recording scope with at least one captured interaction persists its
/// cassette synchronously before this returns. The thread is back in
/// passthrough state afterwards even if persistence fails.
///
/// # Errors
///
/// Returns error if no scope is active or the cassette cannot be saved
pub fn end() -> Result<()> {
    let recorder = deactivate()?;
    debug!("Scope ended: {:?}", recorder.state());
    recorder.finish()
}

/// Decide how the active recorder handles an intercepted call
///
/// With no active scope the call passes through to the real network,
/// unrecorded.
///
/// # Errors
///
/// Propagates match failures from the active recorder
pub fn decide(request: &RecordedRequest) -> Result<Decision> {
    ACTIVE.with(|cell| match cell.borrow_mut().as_mut() {
        None => Ok(Decision::Passthrough),
        Some(recorder) => recorder.decide(request),
    })
}

/// Feed a forwarded call's outcome back to the active recorder
///
/// # Errors
///
/// Returns `ScopeNotActive` when no recorder is active on this thread,
/// meaning the outcome could not be captured. A forwarded call that
/// resumed on a different thread than the one that entered the scope
/// lands here; see [`begin`] for the threading requirement.
pub fn record(request: RecordedRequest, outcome: Outcome) -> Result<()> {
    ACTIVE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(recorder) => {
            recorder.record(request, outcome);
            Ok(())
        }
        None => Err(TapedeckError::ScopeNotActive),
    })
}
