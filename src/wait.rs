//! Blocking until the next value.

use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::observable::Observable;
use crate::outcome::{Outcome, SharedError};
use crate::source::CallbackError;

/// The ways a blocking wait can come back empty-handed.
#[derive(Debug, Error)]
pub enum WaitError {
    /// No value arrived within the requested duration.
    #[error("timed out waiting for the next value")]
    Timeout,
    /// The signal delivered a failure outcome.
    #[error("{0}")]
    Upstream(SharedError),
}

impl<A: Clone + Send + 'static> Observable<A> {
    /// Block the calling thread until the next value arrives.
    ///
    /// With `timeout` set, gives up with [`WaitError::Timeout`] once it
    /// elapses; without, blocks indefinitely. A replayed current value
    /// satisfies the wait immediately. At most one delivery resumes the
    /// waiting thread, and the one-shot subscription is torn down on the
    /// way out, so a later update cannot fire into a finished wait.
    ///
    /// ```
    /// use std::thread;
    /// use std::time::Duration;
    /// use hydroxyl::{Observable, Options};
    ///
    /// let obs = Observable::with_options(Options::NO_REPLAY);
    /// let producer = obs.clone();
    /// thread::spawn(move || {
    ///     thread::sleep(Duration::from_millis(10));
    ///     producer.update(42);
    /// });
    /// assert_eq!(obs.wait(Some(Duration::from_secs(1))).unwrap(), 42);
    /// ```
    pub fn wait(&self, timeout: Option<Duration>) -> Result<A, WaitError> {
        let (sender, receiver) = channel();
        let slot = Mutex::new(Some(sender));
        let id = self.subscribe_raw(Arc::new(move |a| {
            match slot.lock() {
                Ok(mut slot) => match slot.take() {
                    Some(sender) => {
                        let _ = sender.send(a);
                        Err(CallbackError::Disappeared)
                    }
                    None => Err(CallbackError::Disappeared),
                },
                Err(_) => Err(CallbackError::Poisoned),
            }
        }));
        let received = match timeout {
            Some(timeout) => receiver.recv_timeout(timeout).ok(),
            None => receiver.recv().ok(),
        };
        self.cancel(id);
        received.ok_or(WaitError::Timeout)
    }
}

impl<A: Clone + Send + 'static> Observable<Outcome<A>> {
    /// Block until the signal resolves, converting a failure outcome back
    /// into an error.
    ///
    /// This is the only place a failure carried as data resurfaces as a
    /// Rust error to synchronous calling code.
    pub fn wait_value(&self, timeout: Option<Duration>) -> Result<A, WaitError> {
        match self.wait(timeout)? {
            Ok(value) => Ok(value),
            Err(error) => Err(WaitError::Upstream(error)),
        }
    }
}
