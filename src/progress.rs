//! Progress channel between the simulation's execution context and its consumer.
//!
//! The run executes on a dedicated worker thread; the only communication with
//! the consumer is an ordered bounded channel of [`ProgressMessage`]s and an
//! atomic cancellation flag. Snapshots that would stall the numeric loop are
//! dropped; terminal messages never are.

use crate::config::Config;
use crate::engine::{Engine, RunReport};
use crate::error::SimError;
use crate::model::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::thread::{self, JoinHandle};

/// Buffered snapshots held for a slow consumer before data messages are dropped.
const CHANNEL_CAPACITY: usize = 100;

/// Payload of a terminal error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    pub reason: String,
    pub time_at_failure: f64,
}

/// One message on the progress channel.
///
/// Exactly one terminal message (`Done` or `Error`) is sent per run, always
/// after every `Data` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressMessage {
    Data(Snapshot),
    Done(RunReport),
    Error(RunError),
}

/// Handle for a simulation running on its own worker thread.
pub struct SimulationHandle {
    thread: Option<JoinHandle<()>>,
    rx: Receiver<ProgressMessage>,
    cancel: Arc<AtomicBool>,
    terminal_seen: bool,
    last_time: f64,
}

impl SimulationHandle {
    /// Validate the configuration and spawn the run.
    ///
    /// Configuration errors are returned here, synchronously, before any
    /// channel activity begins.
    pub fn spawn(cfg: Config) -> Result<Self, SimError> {
        cfg.validate()
            .map_err(|error| SimError::Config(format!("{error:#}")))?;

        let (tx, rx) = sync_channel(CHANNEL_CAPACITY);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let thread = thread::spawn(move || run_worker(cfg, tx, flag));

        Ok(Self {
            thread: Some(thread),
            rx,
            cancel,
            terminal_seen: false,
            last_time: 0.0,
        })
    }

    /// Drain all currently available messages without blocking.
    ///
    /// A disconnected channel with no terminal message observed is surfaced
    /// as a distinguished error; no further messages follow it.
    pub fn poll(&mut self) -> Vec<ProgressMessage> {
        let mut messages = Vec::new();
        if self.terminal_seen {
            return messages;
        }

        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    match &message {
                        ProgressMessage::Data(snapshot) => self.last_time = snapshot.time,
                        ProgressMessage::Done(_) | ProgressMessage::Error(_) => {
                            self.terminal_seen = true;
                        }
                    }
                    messages.push(message);
                    if self.terminal_seen {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.terminal_seen {
                        self.terminal_seen = true;
                        messages.push(ProgressMessage::Error(RunError {
                            reason: SimError::ContextLost.to_string(),
                            time_at_failure: self.last_time,
                        }));
                    }
                    break;
                }
            }
        }

        messages
    }

    /// Request early termination.
    ///
    /// The worker observes the flag within one epoch boundary and answers
    /// with a `Done` message reporting the last reached time.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// True once a terminal message has been observed by [`Self::poll`].
    pub fn is_finished(&self) -> bool {
        self.terminal_seen
    }

    /// Cancel and wait for the worker thread to exit.
    pub fn shutdown(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            // Keep draining so a terminal send blocked on a full buffer
            // can complete before the join.
            while !thread.is_finished() {
                while self.rx.try_recv().is_ok() {}
                thread::sleep(std::time::Duration::from_millis(1));
            }
            let _ = thread.join();
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker entry point: run the engine and report over the channel.
fn run_worker(cfg: Config, tx: SyncSender<ProgressMessage>, cancel: Arc<AtomicBool>) {
    let mut engine = match Engine::new(cfg) {
        Ok(engine) => engine,
        Err(error) => {
            let _ = tx.send(ProgressMessage::Error(RunError {
                reason: error.to_string(),
                time_at_failure: 0.0,
            }));
            return;
        }
    };

    let outcome = engine.run(
        |snapshot| {
            // A full buffer means the consumer is behind; dropping a data
            // message is tolerable, stalling the numeric loop is not.
            if tx.try_send(ProgressMessage::Data(snapshot.clone())).is_err() {
                log::debug!("dropped snapshot at t = {}: channel full", snapshot.time);
            }
        },
        || cancel.load(Ordering::Relaxed),
    );

    // Terminal messages use the blocking send so they are never lost.
    match outcome {
        Ok(report) => {
            let _ = tx.send(ProgressMessage::Done(report));
        }
        Err(error) => {
            let _ = tx.send(ProgressMessage::Error(RunError {
                reason: error.to_string(),
                time_at_failure: engine.time(),
            }));
        }
    }
}
