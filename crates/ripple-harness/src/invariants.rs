//! Invariant checking for the sync engine.
//!
//! Invariants are properties that must always hold during execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible operation sequences.
//!
//! Checks run against an [`EngineSnapshot`] captured from a live engine, so
//! each check sees one consistent state.

use std::collections::{HashMap, HashSet};

use ripple_core::ContactId;
use ripple_sync::SyncEngine;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Observable engine state at a point in time.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    /// Roster membership.
    pub roster: HashSet<ContactId>,
    /// Contacts reported online.
    pub online: HashSet<ContactId>,
    /// Unseen counts; absent means zero.
    pub unseen: HashMap<ContactId, u32>,
    /// The active conversation, if any.
    pub active: Option<ContactId>,
}

impl EngineSnapshot {
    /// Capture the observable state of a live engine.
    pub fn capture(engine: &SyncEngine) -> Self {
        Self {
            roster: engine.directory().contacts().iter().map(|c| c.id.clone()).collect(),
            online: engine.presence().iter().cloned().collect(),
            unseen: engine.unseen().iter().map(|(id, count)| (id.clone(), count)).collect(),
            active: engine.active().cloned(),
        }
    }
}

/// An invariant that can be checked against engine state.
///
/// Invariants capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] describing what went wrong.
    fn check(&self, state: &EngineSnapshot) -> InvariantResult;
}

/// The active conversation never carries an unseen count.
pub struct ActiveUnseenZero;

impl Invariant for ActiveUnseenZero {
    fn name(&self) -> &'static str {
        "ActiveUnseenZero"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        let Some(active) = &state.active else {
            return Ok(());
        };

        match state.unseen.get(active) {
            None | Some(0) => Ok(()),
            Some(count) => Err(Violation {
                invariant: self.name(),
                message: format!("active contact {active} has unseen count {count}"),
            }),
        }
    }
}

/// Every contact reported online is in the roster.
pub struct PresenceWithinRoster;

impl Invariant for PresenceWithinRoster {
    fn name(&self) -> &'static str {
        "PresenceWithinRoster"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        match state.online.iter().find(|id| !state.roster.contains(*id)) {
            None => Ok(()),
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!("contact {stray} is online but not in the roster"),
            }),
        }
    }
}

/// Every unseen count belongs to a roster contact.
pub struct UnseenWithinRoster;

impl Invariant for UnseenWithinRoster {
    fn name(&self) -> &'static str {
        "UnseenWithinRoster"
    }

    fn check(&self, state: &EngineSnapshot) -> InvariantResult {
        match state.unseen.keys().find(|id| !state.roster.contains(*id)) {
            None => Ok(()),
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!("contact {stray} has an unseen count but is not in the roster"),
            }),
        }
    }
}

/// Registry of invariants to check.
///
/// Collects multiple invariants and runs them all against one snapshot.
/// Use [`InvariantRegistry::standard()`] for the common engine invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard engine invariants.
    ///
    /// Includes:
    /// - [`ActiveUnseenZero`]: the active contact has no unseen count
    /// - [`PresenceWithinRoster`]: online contacts are roster members
    /// - [`UnseenWithinRoster`]: unseen counts belong to roster members
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ActiveUnseenZero);
        registry.add(PresenceWithinRoster);
        registry.add(UnseenWithinRoster);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn check_all(&self, state: &EngineSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated.
    pub fn assert_all(&self, state: &EngineSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(Violation::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
