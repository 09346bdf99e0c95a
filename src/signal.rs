//! Result-carrying signals.
//!
//! A [`Signal`] is an [`Observable`] whose payload is an [`Outcome`]: the
//! container machinery is exactly the same, this module only adds the
//! success/failure projections and result-aware transforms on top, plus the
//! adapter that turns `(value, error)` completion callbacks into signal
//! updates.

use crate::observable::Observable;
use crate::outcome::{Outcome, SharedError};

/// An observable that carries success-or-failure outcomes.
pub type Signal<A> = Observable<Outcome<A>>;

impl<A: Clone + Send + 'static> Observable<A> {
    /// Map with a fallible transform, capturing the error into the outcome.
    ///
    /// ```
    /// use hydroxyl::Observable;
    ///
    /// let raw = Observable::new();
    /// let parsed = raw.try_map(|s: &str| s.parse::<i32>());
    /// raw.update("17");
    /// assert_eq!(parsed.peek_value(), Some(17));
    /// raw.update("not a number");
    /// assert_eq!(parsed.peek_value(), None);
    /// ```
    pub fn try_map<B, E, F>(&self, f: F) -> Signal<B>
        where B: Clone + Send + 'static,
              E: Into<SharedError>,
              F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
    {
        self.map(move |a| f(a).map_err(Into::into))
    }
}

impl<A: Clone + Send + 'static> Observable<Outcome<A>> {
    /// A signal seeded with a success.
    pub fn ok(value: A) -> Signal<A> {
        Observable::of(Ok(value))
    }

    /// A signal seeded with a failure.
    pub fn err<E: Into<SharedError>>(error: E) -> Signal<A> {
        Observable::of(Err(error.into()))
    }

    /// Transform the success branch with a fallible function.
    ///
    /// Failures pass through untouched; an error returned by `f` becomes a
    /// failure outcome in the derived signal.
    ///
    /// ```
    /// use hydroxyl::{Signal, SharedError};
    ///
    /// let grams = Signal::ok(82_500u32);
    /// let kilograms = grams.then(|g| {
    ///     if g == 0 {
    ///         Err(SharedError::msg("empty sample"))
    ///     } else {
    ///         Ok(g as f64 / 1000.0)
    ///     }
    /// });
    /// assert_eq!(kilograms.peek_value(), Some(82.5));
    /// ```
    pub fn then<B, E, F>(&self, f: F) -> Signal<B>
        where B: Clone + Send + 'static,
              E: Into<SharedError>,
              F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
    {
        self.map(move |outcome| outcome.and_then(|value| f(value).map_err(Into::into)))
    }

    /// Transform the success branch with an infallible function.
    pub fn then_map<B, F>(&self, f: F) -> Signal<B>
        where B: Clone + Send + 'static,
              F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map(move |outcome| outcome.map(&f))
    }

    /// Subscribe to the success branch only. Returns the signal again to
    /// permit chaining.
    pub fn next<F>(&self, f: F) -> Signal<A>
        where F: Fn(A) + Send + Sync + 'static
    {
        self.subscribe(move |outcome| {
            if let Ok(value) = outcome {
                f(value)
            }
        });
        self.clone()
    }

    /// Subscribe to the failure branch only. Returns the signal again to
    /// permit chaining.
    ///
    /// ```
    /// use hydroxyl::{Observable, Signal, SharedError};
    ///
    /// let signal: Signal<i32> = Observable::new();
    /// signal
    ///     .next(|n| println!("got {}", n))
    ///     .error(|e| eprintln!("failed: {}", e));
    /// signal.update(Err(SharedError::msg("store unavailable")));
    /// ```
    pub fn error<F>(&self, f: F) -> Signal<A>
        where F: Fn(SharedError) + Send + Sync + 'static
    {
        self.subscribe(move |outcome| {
            if let Err(error) = outcome {
                f(error)
            }
        });
        self.clone()
    }

    /// Read the current value, if the signal holds a success.
    pub fn peek_value(&self) -> Option<A> {
        self.peek().and_then(|outcome| outcome.ok())
    }

    /// Adapt this signal to a `(value, error)` style completion callback.
    ///
    /// The returned closure is the seam towards callback-based collaborators:
    /// each invocation pushes exactly one outcome, a failure if an error is
    /// present, a success otherwise. Calling it with neither value nor error
    /// violates the completion contract and pushes nothing; the misuse is
    /// logged instead of silently inventing an outcome.
    ///
    /// ```
    /// use hydroxyl::{Observable, Signal, SharedError};
    ///
    /// let latest: Signal<f64> = Observable::new();
    /// let completion = latest.completion_handler::<SharedError>();
    /// // ...hand `completion` to an async store query...
    /// completion(Some(81.7), None);
    /// assert_eq!(latest.peek_value(), Some(81.7));
    /// ```
    pub fn completion_handler<E>(&self) -> impl Fn(Option<A>, Option<E>) + Send + Sync + 'static
        where E: Into<SharedError>
    {
        let signal = self.clone();
        move |value, error| match (value, error) {
            (_, Some(error)) => signal.update(Err(error.into())),
            (Some(value), None) => signal.update(Ok(value)),
            (None, None) => {
                log::warn!("completion handler invoked with neither a value nor an error")
            }
        }
    }
}
