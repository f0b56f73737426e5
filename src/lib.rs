//! Tapedeck - Scoped HTTP record-replay cassettes
//!
//! Intercepts outbound HTTP calls, recording them to named cassettes on
//! first use and replaying them deterministically afterwards, with no
//! network access during replay.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod cassette;
pub mod config;
pub mod error;
pub mod intercept;
pub mod matcher;
pub mod recorder;
pub mod scope;
pub mod storage;
pub mod stub;
pub mod transport;

pub use error::{Result, TapedeckError};
