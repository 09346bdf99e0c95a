//! Success-or-failure payloads for signals.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A fully resolved success-or-failure payload.
///
/// There is no pending state: an outcome is only ever constructed resolved.
/// Failures are data, not panics, and flow through combinator chains exactly
/// like successes.
pub type Outcome<A> = Result<A, SharedError>;

/// A cloneable, type-erased error.
///
/// Observable payloads must be `Clone` so they can fan out to several
/// subscribers, which rules out carrying a bare boxed error. `SharedError`
/// wraps the error in an `Arc` instead and delegates display and debug
/// formatting to it.
///
/// `SharedError` deliberately does not implement `std::error::Error` itself;
/// this keeps the blanket `From<E: Error>` conversion coherent, the same
/// trade-off `anyhow::Error` makes.
#[derive(Clone)]
pub struct SharedError {
    inner: Arc<dyn Error + Send + Sync + 'static>,
}

impl SharedError {
    /// Wrap a concrete error.
    pub fn new<E>(error: E) -> SharedError
        where E: Error + Send + Sync + 'static
    {
        SharedError { inner: Arc::new(error) }
    }

    /// Create an error from a plain message.
    pub fn msg<M: Into<String>>(message: M) -> SharedError {
        SharedError::new(Message(message.into()))
    }

    /// Attempt to downcast to a concrete error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
        where E: Error + 'static
    {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<E> From<E> for SharedError
    where E: Error + Send + Sync + 'static
{
    fn from(error: E) -> SharedError {
        SharedError::new(error)
    }
}


/// A bare message promoted to an error.
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Message {}
