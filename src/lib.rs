//! Observable values and result-carrying signals
//!
//! *Hydroxyl* provides a small set of thread-safe primitives for pushing
//! values through chains of dependent containers: a light-weight take on
//! the observer pattern with reactive combinators layered on top.
//!
//! # Observables
//!
//! The basic type is the [`Observable`]: a container holding an optional
//! current value and a list of subscribers. Updating the container
//! synchronously notifies every subscriber in registration order; depending
//! on its [`Options`], the container retains its latest value and replays
//! it to late subscribers, or fires at most once.
//!
//! ```
//! use hydroxyl::Observable;
//!
//! // A container seeded with a value
//! let weight = Observable::of(82.5);
//!
//! // Derive a formatted rendition; it is seeded through replay
//! let label = weight.map(|kg| format!("{:.1} kg", kg));
//! assert_eq!(label.peek(), Some("82.5 kg".to_string()));
//!
//! // Updates propagate through the chain synchronously
//! weight.update(81.9);
//! assert_eq!(label.peek(), Some("81.9 kg".to_string()));
//! ```
//!
//! Observables are `Send + Sync + Clone`: clones share one container, and
//! any thread may update, subscribe or peek. Each container serializes its
//! own state behind a single mutex; distinct containers are fully
//! independent, so combinator chains cannot deadlock across containers.
//!
//! # Signals
//!
//! A [`Signal`] is an observable whose payload is an [`Outcome`], a fully
//! resolved success-or-failure. Failures travel through `then` chains as
//! data and are only converted back into errors by a blocking
//! [`wait_value`](Observable::wait_value):
//!
//! ```
//! use hydroxyl::{Observable, Signal, SharedError};
//!
//! let fetched: Signal<u32> = Observable::new();
//! fetched
//!     .then_map(|grams| grams as f64 / 1000.0)
//!     .next(|kg| println!("latest sample: {} kg", kg))
//!     .error(|e| eprintln!("fetch failed: {}", e));
//!
//! // The seam towards callback-style collaborators:
//! let completion = fetched.completion_handler::<SharedError>();
//! completion(Some(81_900), None);
//! assert_eq!(fetched.peek_value(), Some(81_900));
//! ```
//!
//! # Scheduling
//!
//! Everything above delivers on the updating thread. The scheduling
//! combinators [`delay`](Observable::delay), [`debounce`](Observable::debounce)
//! and [`ensure`](Observable::ensure) introduce explicit hops onto an
//! [`Executor`], and [`wait`](Observable::wait) blocks the calling thread
//! until the next value arrives or a timeout elapses. Executors can be
//! registered under well-known names with [`register_executor`] so that
//! host applications can expose their own dispatch contexts (a UI main
//! thread, a background pool) to combinator chains.
//!
//! Functions passed to combinators should be free of side effects; Rust's
//! `Fn` bounds keep them from mutating captured state, but I/O and shared
//! `Arc` mutation are still better kept in subscribers at the end of a
//! chain.

#![warn(missing_docs)]

mod executor;
mod observable;
mod outcome;
mod signal;
mod source;
mod timing;
mod wait;

pub use crate::executor::{
    after, executor, hop, register_executor, Executor, Task, ThreadExecutor, WorkerExecutor,
};
pub use crate::observable::{BoxClone, Observable, Options, Subscription};
pub use crate::outcome::{Outcome, SharedError};
pub use crate::signal::Signal;
pub use crate::wait::WaitError;
