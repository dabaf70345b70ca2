//! Deterministic simulation harness for the Ripple sync core.
//!
//! Scripted implementations of the consumed interfaces and a virtual-clock
//! environment, for reproducible testing of reconnect, backoff, and timeout
//! behavior without real time or a real server.
//!
//! # Invariant Testing
//!
//! The `invariants` module verifies WHAT must be true across all execution
//! paths, not specific scenarios: the active selection never carries an
//! unseen count, and presence and unseen entries never outlive their roster
//! entry. Use [`InvariantRegistry::standard()`] and check an
//! [`EngineSnapshot`] after every applied operation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod script;
pub mod sim_env;

pub use invariants::{
    ActiveUnseenZero, EngineSnapshot, Invariant, InvariantRegistry, InvariantResult,
    PresenceWithinRoster, UnseenWithinRoster, Violation,
};
pub use script::{
    ChannelProbe, DirectoryProbe, FetchStep, OpenOutcome, ScriptedChannel, ScriptedDirectory,
};
pub use sim_env::{SimEnv, SimInstant, SteppedEnv};
