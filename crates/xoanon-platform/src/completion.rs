use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use xoanon_core::{Error, Result};

/// The producing half of a [`Completion`]. Completing is infallible from
/// the producer's point of view: if the waiter has already given up, the
/// value is silently dropped.
pub struct Completer<T> {
    tx: Sender<Result<T>>,
}

impl<T> Completer<T> {
    pub fn complete(self, result: Result<T>) {
        let _ = self.tx.send(result);
    }
}

/// A one-shot future for work handed to another thread.
///
/// Values and captured failures travel the same channel, so an error
/// raised inside the work is rethrown to the waiter rather than lost.
pub struct Completion<T> {
    rx: Receiver<Result<T>>,
}

pub fn completion<T>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = bounded(1);
    (Completer { tx }, Completion { rx })
}

impl<T> Completion<T> {
    /// A completion that has already resolved.
    pub fn resolved(result: Result<T>) -> Self {
        let (completer, completion) = completion();
        completer.complete(result);
        completion
    }

    /// Block until the work completes. Fails with [`Error::LoopClosed`]
    /// if the producer went away without delivering a value.
    pub fn wait(self) -> Result<T> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::LoopClosed),
        }
    }

    /// Block for at most `timeout`. On timeout the pending work is
    /// abandoned, not cancelled: it may still complete later and its
    /// value is discarded.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::LoopClosed),
        }
    }

    /// Whether the completion has already resolved, without consuming it.
    pub fn is_resolved(&self) -> bool {
        !self.rx.is_empty()
    }
}
