//! Scripted channel and directory implementations.
//!
//! Tests hold a clone of the scripted object (the runtime owns the other)
//! and feed it outcomes: open attempts, events, rosters. Counters answer
//! "exactly how many times" questions that view snapshots cannot.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use ripple_core::{ChannelEvent, Contact, FetchError, ProtocolError, TransportError};
use ripple_sync::{DirectoryFetch, EventChannel};
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of one scripted open attempt.
#[derive(Debug, Clone)]
pub enum OpenOutcome {
    /// The open succeeds.
    Accept,
    /// The open fails with [`TransportError::Open`].
    Reject(String),
    /// The open never completes; the runtime's open timeout fires.
    Hang,
}

/// One step of the scripted event stream.
#[derive(Debug, Clone)]
enum EventStep {
    Deliver(ChannelEvent),
    Malformed(ProtocolError),
    Close,
}

#[derive(Debug, Default)]
struct ChannelCounters {
    opens: AtomicUsize,
    presence_requests: AtomicUsize,
    closes: AtomicUsize,
}

#[derive(Debug, Default)]
struct ChannelScript {
    opens: Mutex<VecDeque<OpenOutcome>>,
    events: Mutex<VecDeque<EventStep>>,
    wakeup: Notify,
    counters: ChannelCounters,
}

/// Counter view onto a [`ScriptedChannel`].
#[derive(Debug, Clone)]
pub struct ChannelProbe {
    script: Arc<ChannelScript>,
}

impl ChannelProbe {
    /// Number of open attempts so far.
    pub fn opens(&self) -> usize {
        self.script.counters.opens.load(Ordering::SeqCst)
    }

    /// Number of presence snapshot requests so far.
    pub fn presence_requests(&self) -> usize {
        self.script.counters.presence_requests.load(Ordering::SeqCst)
    }

    /// Number of close calls so far.
    pub fn closes(&self) -> usize {
        self.script.counters.closes.load(Ordering::SeqCst)
    }
}

/// [`EventChannel`] driven by a script instead of a server.
///
/// Open attempts consume the scripted [`OpenOutcome`] queue and succeed
/// once it is empty. The event stream blocks until a step is fed in, so a
/// test can interleave deliveries with its own assertions.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    script: Arc<ChannelScript>,
}

impl ScriptedChannel {
    /// A channel whose opens all succeed and whose stream starts empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter view onto this channel.
    pub fn probe(&self) -> ChannelProbe {
        ChannelProbe { script: Arc::clone(&self.script) }
    }

    /// Script the outcome of the next unscripted open attempt.
    pub fn script_open(&self, outcome: OpenOutcome) {
        lock(&self.script.opens).push_back(outcome);
    }

    /// Deliver an event on the stream.
    pub fn deliver(&self, event: ChannelEvent) {
        lock(&self.script.events).push_back(EventStep::Deliver(event));
        self.script.wakeup.notify_one();
    }

    /// Deliver a malformed event on the stream.
    pub fn deliver_malformed(&self, error: ProtocolError) {
        lock(&self.script.events).push_back(EventStep::Malformed(error));
        self.script.wakeup.notify_one();
    }

    /// End the stream, as a server-side or network close would.
    pub fn close_stream(&self) {
        lock(&self.script.events).push_back(EventStep::Close);
        self.script.wakeup.notify_one();
    }
}

impl EventChannel for ScriptedChannel {
    async fn open(&mut self) -> Result<(), TransportError> {
        self.script.counters.opens.fetch_add(1, Ordering::SeqCst);
        let outcome = lock(&self.script.opens).pop_front().unwrap_or(OpenOutcome::Accept);

        match outcome {
            OpenOutcome::Accept => Ok(()),
            OpenOutcome::Reject(reason) => Err(TransportError::Open(reason)),
            OpenOutcome::Hang => std::future::pending().await,
        }
    }

    async fn recv(&mut self) -> Option<Result<ChannelEvent, ProtocolError>> {
        loop {
            let step = lock(&self.script.events).pop_front();
            match step {
                Some(EventStep::Deliver(event)) => return Some(Ok(event)),
                Some(EventStep::Malformed(error)) => return Some(Err(error)),
                Some(EventStep::Close) => return None,
                None => self.script.wakeup.notified().await,
            }
        }
    }

    async fn request_presence(&mut self) -> Result<(), TransportError> {
        self.script.counters.presence_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.script.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Outcome of one scripted roster fetch.
#[derive(Debug, Clone)]
pub enum FetchStep {
    /// The fetch succeeds with this roster.
    Roster(Vec<Contact>),
    /// The fetch fails.
    Fail(FetchError),
    /// The fetch never completes; the runtime's fetch timeout fires.
    Hang,
}

#[derive(Debug, Default)]
struct DirectoryScript {
    steps: Mutex<VecDeque<FetchStep>>,
    default_roster: Mutex<Vec<Contact>>,
    fetches: AtomicUsize,
}

/// Counter view onto a [`ScriptedDirectory`].
#[derive(Debug, Clone)]
pub struct DirectoryProbe {
    script: Arc<DirectoryScript>,
}

impl DirectoryProbe {
    /// Number of roster fetch attempts so far.
    pub fn fetches(&self) -> usize {
        self.script.fetches.load(Ordering::SeqCst)
    }
}

/// [`DirectoryFetch`] driven by a script.
///
/// Fetches consume the scripted [`FetchStep`] queue; once it is empty they
/// succeed with the default roster.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDirectory {
    script: Arc<DirectoryScript>,
}

impl ScriptedDirectory {
    /// A directory that serves `roster` for every unscripted fetch.
    pub fn new(roster: Vec<Contact>) -> Self {
        let this = Self::default();
        *lock(&this.script.default_roster) = roster;
        this
    }

    /// Counter view onto this directory.
    pub fn probe(&self) -> DirectoryProbe {
        DirectoryProbe { script: Arc::clone(&self.script) }
    }

    /// Script the outcome of the next unscripted fetch.
    pub fn script_fetch(&self, step: FetchStep) {
        lock(&self.script.steps).push_back(step);
    }

    /// Replace the roster served once the script queue is empty.
    pub fn set_roster(&self, roster: Vec<Contact>) {
        *lock(&self.script.default_roster) = roster;
    }
}

impl DirectoryFetch for ScriptedDirectory {
    async fn fetch_roster(&mut self) -> Result<Vec<Contact>, FetchError> {
        self.script.fetches.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.script.steps).pop_front();

        match step {
            Some(FetchStep::Roster(roster)) => Ok(roster),
            Some(FetchStep::Fail(error)) => Err(error),
            Some(FetchStep::Hang) => std::future::pending().await,
            None => Ok(lock(&self.script.default_roster).clone()),
        }
    }
}
