//! Async driver for the sync engine.
//!
//! [`SyncRuntime`] owns the engine plus the concrete channel and directory
//! implementations, and runs the single event loop that serializes every
//! mutation: inbound channel events, user commands, and backoff timers all
//! pass through one task, so cross-component invariants never appear
//! briefly violated to a concurrent reader.
//!
//! The rendering layer holds a [`SyncHandle`]: commands go in through a
//! bounded queue, state comes out as immutable [`SyncView`] snapshots on a
//! watch channel, and session-level signals arrive on a separate stream.

use std::{ops::Sub, time::Duration};

use ripple_core::{
    ChannelEvent, CloseReason, ContactId, Environment, FetchError, ProtocolError, TransportError,
};
use tokio::sync::{mpsc, watch};

use crate::{
    channel::{DirectoryFetch, EventChannel},
    engine::{EngineConfig, EngineState, SyncAction, SyncEngine},
    view::{SessionSignal, SyncView},
};

/// Depth of the user-command queue.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// User actions, serialized against the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Make this contact the active conversation.
    Select(ContactId),
    /// Clear the active conversation.
    Deselect,
    /// Reload the contact roster.
    Reload,
    /// Retry the connection now, skipping any backoff wait in flight.
    Reconnect,
    /// Tear down the session.
    Logout,
}

/// Caller-side handle to a running [`SyncRuntime`].
#[derive(Debug)]
pub struct SyncHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SyncView>,
    signals: mpsc::UnboundedReceiver<SessionSignal>,
}

impl SyncHandle {
    /// Current view snapshot.
    pub fn view(&self) -> SyncView {
        self.view.borrow().clone()
    }

    /// A receiver that observes every published view snapshot.
    pub fn watch_view(&self) -> watch::Receiver<SyncView> {
        self.view.clone()
    }

    /// Send a user command to the runtime.
    ///
    /// # Errors
    ///
    /// Returns the command back if the runtime has stopped.
    pub async fn command(
        &self,
        command: Command,
    ) -> Result<(), mpsc::error::SendError<Command>> {
        self.commands.send(command).await
    }

    /// Next session-level signal, or `None` once the runtime has stopped.
    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signals.recv().await
    }
}

/// What the event loop woke up for.
enum Step {
    Command(Option<Command>),
    RetryElapsed,
    Channel(Option<Result<ChannelEvent, ProtocolError>>),
}

/// A backoff wait in flight.
///
/// The deadline is fixed when the engine schedules the retry. The event
/// loop rebuilds its sleep future on every wakeup, so the timer hands out
/// the remaining time rather than the original delay; commands arriving
/// during the wait cannot push the retry back.
struct RetryTimer<I> {
    started: I,
    delay: Duration,
}

impl<I: Copy + Sub<Output = Duration>> RetryTimer<I> {
    fn remaining(&self, now: I) -> Duration {
        self.delay.saturating_sub(now - self.started)
    }
}

/// Owns the engine and drives it against a concrete channel and fetcher.
pub struct SyncRuntime<C, F, E>
where
    C: EventChannel,
    F: DirectoryFetch,
    E: Environment,
{
    engine: SyncEngine,
    channel: C,
    fetcher: F,
    env: E,
    commands: mpsc::Receiver<Command>,
    view: watch::Sender<SyncView>,
    signals: mpsc::UnboundedSender<SessionSignal>,
    /// Backoff wait scheduled by the engine, if any. Cleared on logout and
    /// manual reconnect so in-flight waits are cancellable.
    pending_retry: Option<RetryTimer<E::Instant>>,
}

impl<C, F, E> SyncRuntime<C, F, E>
where
    C: EventChannel,
    F: DirectoryFetch,
    E: Environment,
{
    /// Create a runtime and the handle the rendering layer keeps.
    pub fn new(config: EngineConfig, channel: C, fetcher: F, env: E) -> (Self, SyncHandle) {
        let engine = SyncEngine::new(config);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (view_tx, view_rx) = watch::channel(engine.view());
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            engine,
            channel,
            fetcher,
            env,
            commands: command_rx,
            view: view_tx,
            signals: signal_tx,
            pending_retry: None,
        };
        let handle = SyncHandle { commands: command_tx, view: view_rx, signals: signal_rx };
        (runtime, handle)
    }

    /// Read access to the engine (for embedding and tests).
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Run the event loop until logout or until the handle is dropped.
    pub async fn run(mut self) {
        match self.engine.connect() {
            Ok(actions) => {
                if self.execute(actions).await {
                    return;
                }
            },
            Err(err) => {
                tracing::error!(error = %err, "initial connect refused");
                return;
            },
        }

        loop {
            let connected = self.engine.state() == EngineState::Connected;
            let retry = self.pending_retry.as_ref().map(|timer| timer.remaining(self.env.now()));

            let step = tokio::select! {
                biased;
                command = self.commands.recv() => Step::Command(command),
                () = self.env.sleep(retry.unwrap_or_default()), if retry.is_some() => {
                    Step::RetryElapsed
                },
                event = self.channel.recv(), if connected => Step::Channel(event),
            };

            let ended = match step {
                Step::Command(Some(command)) => self.handle_command(command).await,
                Step::Command(None) => {
                    tracing::debug!("handle dropped, stopping runtime");
                    break;
                },
                Step::RetryElapsed => {
                    self.pending_retry = None;
                    let actions = self.engine.retry_elapsed();
                    self.execute(actions).await
                },
                Step::Channel(Some(Ok(event))) => {
                    let actions = self.engine.apply_event(event);
                    self.execute(actions).await
                },
                Step::Channel(Some(Err(err))) => {
                    // Drop the single offending event; the stream continues.
                    tracing::warn!(error = %err, "dropping malformed event");
                    false
                },
                Step::Channel(None) => {
                    let reason = CloseReason::Network("event stream ended".to_string());
                    let actions = self.engine.channel_closed(&reason);
                    self.execute(actions).await
                },
            };

            if ended {
                break;
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Select(id) => {
                let actions = self.engine.select(id);
                self.execute(actions).await
            },
            Command::Deselect => {
                let actions = self.engine.deselect();
                self.execute(actions).await
            },
            Command::Reload => {
                let actions = self.engine.reload();
                self.execute(actions).await
            },
            Command::Reconnect => self.reconnect_now().await,
            Command::Logout => {
                self.pending_retry = None;
                let actions = self.engine.logout();
                self.execute(actions).await
            },
        }
    }

    /// Manual reconnect: cancel any backoff wait in flight and attempt an
    /// open immediately.
    async fn reconnect_now(&mut self) -> bool {
        match self.engine.state() {
            EngineState::Reconnecting => {
                self.pending_retry = None;
                let actions = self.engine.retry_elapsed();
                self.execute(actions).await
            },
            EngineState::Disconnected => match self.engine.connect() {
                Ok(actions) => self.execute(actions).await,
                Err(err) => {
                    tracing::warn!(error = %err, "manual reconnect refused");
                    false
                },
            },
            EngineState::Connected => false,
        }
    }

    /// Execute engine actions, feeding outcomes back in until the queue
    /// drains. Returns `true` once the session has ended.
    async fn execute(&mut self, actions: Vec<SyncAction>) -> bool {
        let mut queue = actions;
        let mut ended = false;

        while !queue.is_empty() {
            let batch = std::mem::take(&mut queue);

            for action in batch {
                match action {
                    SyncAction::OpenChannel => queue.extend(self.open_channel().await),
                    SyncAction::CloseChannel => self.channel.close().await,
                    SyncAction::ScheduleRetry { delay } => {
                        self.pending_retry = Some(RetryTimer { started: self.env.now(), delay });
                    },
                    SyncAction::FetchRoster => queue.extend(self.fetch_roster().await),
                    SyncAction::RequestPresence => {
                        if let Err(err) = self.channel.request_presence().await {
                            tracing::warn!(error = %err, "presence snapshot request failed");
                        }
                    },
                    SyncAction::Publish => self.publish(),
                    SyncAction::RetriesExhausted => {
                        let _ = self.signals.send(SessionSignal::ReconnectExhausted);
                    },
                    SyncAction::SessionEnded => {
                        let _ = self.signals.send(SessionSignal::SessionEnded);
                        ended = true;
                    },
                }
            }
        }

        ended
    }

    /// Attempt a channel open, racing the configured timeout.
    async fn open_channel(&mut self) -> Vec<SyncAction> {
        let timeout = self.engine.config().open_timeout;

        let outcome = tokio::select! {
            biased;
            result = self.channel.open() => Some(result),
            () = self.env.sleep(timeout) => None,
        };

        match outcome {
            Some(Ok(())) => match self.engine.channel_opened() {
                Ok(actions) => actions,
                Err(err) => {
                    tracing::warn!(error = %err, "unexpected channel open");
                    vec![]
                },
            },
            Some(Err(err)) => self.engine.open_failed(&err),
            None => self.engine.open_failed(&TransportError::Timeout { elapsed: timeout }),
        }
    }

    /// Fetch the roster, racing the configured timeout.
    async fn fetch_roster(&mut self) -> Vec<SyncAction> {
        let timeout = self.engine.config().fetch_timeout;

        let outcome = tokio::select! {
            biased;
            result = self.fetcher.fetch_roster() => Some(result),
            () = self.env.sleep(timeout) => None,
        };

        match outcome {
            Some(Ok(roster)) => self.engine.roster_loaded(roster),
            Some(Err(err)) => self.engine.roster_failed(&err),
            None => self.engine.roster_failed(&FetchError::Timeout { elapsed: timeout }),
        }
    }

    fn publish(&self) {
        let _ = self.view.send_replace(self.engine.view());
    }
}
