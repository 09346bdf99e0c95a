//! Observable value containers.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::source::{with_weak, Callback, CallbackError, CallbackResult, Source};


/// Per-container subscription policy, fixed at construction.
///
/// `replay` controls whether the container retains its latest value and
/// replays it to late subscribers. `once` makes the container fire-once:
/// after a single delivery all subscribers are dropped and further updates
/// are ignored.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Options {
    /// Retain the last value and deliver it synchronously on subscribe.
    pub replay: bool,
    /// Deliver at most one value, then drop all subscribers.
    pub once: bool,
}

impl Options {
    /// Replaying fire-once container, as used for executor hops.
    pub const ONCE: Options = Options { replay: true, once: true };
    /// Plain forwarding container that never retains a value.
    pub const NO_REPLAY: Options = Options { replay: false, once: false };
}

impl Default for Options {
    fn default() -> Options {
        Options { replay: true, once: false }
    }
}


/// The mutex-guarded state of one container: its latest value and its
/// observer registry. All mutations of either go through the same lock.
pub(crate) struct Core<A> {
    last: Option<A>,
    fired: bool,
    options: Options,
    source: Source<A>,
    primer: Option<Box<dyn FnOnce() + Send>>,
}

impl<A> Core<A> {
    pub(crate) fn new(options: Options) -> Core<A> {
        Core { last: None, fired: false, options, source: Source::new(), primer: None }
    }
}


/// Push a value into a container core.
///
/// The registry is snapshotted under the lock and the callbacks run outside
/// of it, so a callback may subscribe to, update or unsubscribe from the
/// same container without deadlocking. Structural changes made meanwhile
/// land in the canonical registry and are merged afterwards.
pub(crate) fn deliver<A: Clone>(core: &Arc<Mutex<Core<A>>>, value: A) -> CallbackResult {
    let entries = {
        let mut core = match core.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(CallbackError::Poisoned),
        };
        if core.options.once && core.fired {
            return Ok(());
        }
        if core.options.replay {
            core.last = Some(value.clone());
        }
        if core.options.once {
            core.fired = true;
        }
        core.source.snapshot()
    };
    let mut dead = vec![];
    let n = entries.len();
    let mut iter = entries.into_iter();
    for _ in 1..n {
        let (id, callback) = match iter.next() {
            Some(entry) => entry,
            None => break,
        };
        if callback(value.clone()).is_err() {
            dead.push(id);
        }
    }
    // Notify the last observer without cloning the value.
    if let Some((id, callback)) = iter.next() {
        if callback(value).is_err() {
            dead.push(id);
        }
    }
    let mut core = match core.lock() {
        Ok(guard) => guard,
        Err(_) => return Err(CallbackError::Poisoned),
    };
    if core.options.once {
        core.source.clear();
    } else if !dead.is_empty() {
        core.source.retire(&dead);
    }
    Ok(())
}


/// Trait to wrap cloning of boxed values in an object-safe manner.
pub trait BoxClone: Send + Sync {
    /// Clone the object as a boxed trait object.
    fn box_clone(&self) -> Box<dyn BoxClone>;
}

impl<T: Send + Sync + Clone + 'static> BoxClone for T {
    fn box_clone(&self) -> Box<dyn BoxClone> {
        Box::new(self.clone())
    }
}


/// A thread-safe container for a value that changes over time.
///
/// An observable holds an optional current value and a list of subscribers.
/// Producers push values in with [`update`](Observable::update), which
/// synchronously notifies every subscriber in registration order. Depending
/// on the container's [`Options`], the latest value is retained and replayed
/// to late subscribers.
///
/// ```
/// use hydroxyl::Observable;
///
/// let weight = Observable::of(82.5);
/// weight.subscribe(|kg| println!("current weight: {} kg", kg));
/// weight.update(82.1);
/// assert_eq!(weight.peek(), Some(82.1));
/// ```
///
/// Observables are `Send + Sync + Clone`; clones share the same underlying
/// container. Combinators like [`map`](Observable::map) derive new
/// containers that are kept up to date automatically. Propagation through a
/// combinator chain happens synchronously on the updating thread's stack, so
/// pathologically deep chains propagate with correspondingly deep recursion.
pub struct Observable<A> {
    pub(crate) core: Arc<Mutex<Core<A>>>,
    pub(crate) keep_alive: Box<dyn BoxClone>,
}

impl<A> Clone for Observable<A> {
    fn clone(&self) -> Observable<A> {
        Observable {
            core: self.core.clone(),
            keep_alive: self.keep_alive.box_clone(),
        }
    }
}

impl<A: Clone + Send + 'static> Default for Observable<A> {
    fn default() -> Observable<A> {
        Observable::new()
    }
}

impl<A: Clone + Send + 'static> Observable<A> {
    /// Create an empty container with default options.
    pub fn new() -> Observable<A> {
        Observable::with_options(Options::default())
    }

    /// Create an empty container with the given options.
    pub fn with_options(options: Options) -> Observable<A> {
        Observable {
            core: Arc::new(Mutex::new(Core::new(options))),
            keep_alive: Box::new(()),
        }
    }

    /// Create a container seeded with a value, using default options.
    pub fn of(value: A) -> Observable<A> {
        Observable::seeded(value, Options::default())
    }

    /// Create a container seeded with a value.
    ///
    /// On a replaying container the seed becomes the current value right
    /// away; on a replaying fire-once container it also counts as the one
    /// firing, so subscribers get it exactly once and are never registered.
    /// A non-replaying container discards the seed.
    pub fn seeded(value: A, options: Options) -> Observable<A> {
        let mut core = Core::new(options);
        if options.replay {
            core.last = Some(value);
            core.fired = options.once;
        }
        Observable {
            core: Arc::new(Mutex::new(core)),
            keep_alive: Box::new(()),
        }
    }

    /// The container's subscription policy.
    pub fn options(&self) -> Options {
        self.core.lock().unwrap().options
    }

    /// Push a new value into the container.
    ///
    /// Stores the value (subject to the replay policy) and synchronously
    /// notifies every currently registered subscriber, in registration
    /// order. On a fire-once container all subscribers are dropped after
    /// this delivery and any later update is a complete no-op.
    ///
    /// ```
    /// use hydroxyl::Observable;
    ///
    /// let counter = Observable::new();
    /// let doubled = counter.map(|n: i32| 2 * n);
    /// counter.update(21);
    /// assert_eq!(doubled.peek(), Some(42));
    /// ```
    pub fn update(&self, value: A) {
        if deliver(&self.core, value).is_err() {
            log::warn!("dropped an update on a poisoned observable");
        }
    }

    /// Read the current value without any side effects.
    pub fn peek(&self) -> Option<A> {
        self.core.lock().unwrap().last.clone()
    }

    /// Register an observer, returning a token for unsubscription.
    ///
    /// If the container replays and holds a value, the observer is invoked
    /// with it synchronously before `subscribe` returns, in addition to
    /// being registered for future updates. On a fire-once container that
    /// has already fired, the observer receives the stored value once and
    /// is not registered.
    ///
    /// The replay runs outside the container's lock, so an update racing
    /// the subscription from another thread can notify the fresh observer
    /// with the newer value before the replayed one arrives.
    ///
    /// ```
    /// use hydroxyl::Observable;
    ///
    /// let obs = Observable::of("ready");
    /// let token = obs.subscribe(|msg| assert_eq!(msg, "ready"));
    /// token.unsubscribe();
    /// ```
    pub fn subscribe<F>(&self, observer: F) -> Subscription<A>
        where F: Fn(A) + Send + Sync + 'static
    {
        let id = self.subscribe_raw(Arc::new(move |a| {
            observer(a);
            Ok(())
        }));
        Subscription { id, core: Arc::downgrade(&self.core) }
    }

    /// Register a raw callback that may prune itself by returning an error.
    ///
    /// This is the primitive all combinators are built on. Replay delivery
    /// happens outside the lock, so the callback may touch this container
    /// again.
    pub(crate) fn subscribe_raw(&self, callback: Callback<A>) -> u64 {
        let (id, pending, primer) = {
            let mut core = self.core.lock().unwrap();
            let spent = core.options.once && core.fired;
            let id = if spent {
                core.source.reserve()
            } else {
                core.source.register(callback.clone())
            };
            let pending = if core.options.replay { core.last.clone() } else { None };
            (id, pending, core.primer.take())
        };
        if let Some(value) = pending {
            let _ = callback(value);
        }
        if let Some(primer) = primer {
            primer();
        }
        id
    }

    /// Install a task that runs once, when the first subscriber attaches.
    ///
    /// A primed container holds its pending work back until somebody is
    /// listening, which is how executor hops guarantee that the dispatched
    /// delivery finds the downstream subscriber already registered.
    pub(crate) fn prime(&self, task: Box<dyn FnOnce() + Send>) {
        if let Ok(mut core) = self.core.lock() {
            core.primer = Some(task);
        }
    }

    /// Remove a subscriber by ordinal.
    pub(crate) fn cancel(&self, id: u64) {
        if let Ok(mut core) = self.core.lock() {
            core.source.cancel(id);
        }
    }

    /// Number of registered subscribers. Exposed for tests.
    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.core.lock().unwrap().source.len()
    }

    /// Map the container to another container using a function.
    ///
    /// The derived container has the same options as its parent; every
    /// value pushed to the parent is transformed and pushed to it. If the
    /// parent replays a current value, the derived container is seeded with
    /// its transform.
    ///
    /// ```
    /// use hydroxyl::Observable;
    ///
    /// let celsius = Observable::new();
    /// let fahrenheit = celsius.map(|c: f64| c * 9.0 / 5.0 + 32.0);
    /// celsius.update(100.0);
    /// assert_eq!(fahrenheit.peek(), Some(212.0));
    /// ```
    pub fn map<B, F>(&self, f: F) -> Observable<B>
        where B: Clone + Send + 'static,
              F: Fn(A) -> B + Send + Sync + 'static,
    {
        let core = Arc::new(Mutex::new(Core::new(self.options())));
        let weak = Arc::downgrade(&core);
        self.subscribe_raw(Arc::new(move |a| {
            with_weak(&weak, |dst| deliver(dst, f(a)))
        }));
        Observable { core, keep_alive: Box::new(self.clone()) }
    }

    /// Splice the update streams of derived containers into one.
    ///
    /// For every value pushed to this container, `f` builds a new container
    /// whose entire future update stream is forwarded into the result. A
    /// later outer value does not cancel earlier inner subscriptions: this
    /// is merge semantics, not switch-to-latest. Inner containers live for
    /// as long as their producers keep them alive.
    ///
    /// ```
    /// use hydroxyl::{Observable, Options};
    ///
    /// let outer = Observable::with_options(Options::NO_REPLAY);
    /// let inner = Observable::with_options(Options::NO_REPLAY);
    /// let flat = {
    ///     let inner = inner.clone();
    ///     outer.flat_map(move |()| inner.clone())
    /// };
    /// let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    /// {
    ///     let seen = seen.clone();
    ///     flat.subscribe(move |n| seen.lock().unwrap().push(n));
    /// }
    /// outer.update(());
    /// inner.update(1);
    /// inner.update(2);
    /// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    /// ```
    pub fn flat_map<B, F>(&self, f: F) -> Observable<B>
        where B: Clone + Send + 'static,
              F: Fn(A) -> Observable<B> + Send + Sync + 'static,
    {
        let core = Arc::new(Mutex::new(Core::new(self.options())));
        let weak = Arc::downgrade(&core);
        self.subscribe_raw(Arc::new(move |a| {
            if weak.upgrade().is_none() {
                return Err(CallbackError::Disappeared);
            }
            let weak = weak.clone();
            f(a).subscribe_raw(Arc::new(move |b| {
                with_weak(&weak, |dst| deliver(dst, b))
            }));
            Ok(())
        }));
        Observable { core, keep_alive: Box::new(self.clone()) }
    }
}


/// An opaque handle identifying one subscriber of one container.
///
/// The token holds only a weak back-reference: it never keeps its container
/// alive, and [`unsubscribe`](Subscription::unsubscribe) on a token whose
/// container is gone is a safe no-op. Dropping a token does *not*
/// unsubscribe.
pub struct Subscription<A> {
    id: u64,
    core: Weak<Mutex<Core<A>>>,
}

impl<A> Subscription<A> {
    /// Remove the subscriber this token stands for. No-op if it was already
    /// removed or the container no longer exists.
    pub fn unsubscribe(&self) {
        if let Some(core) = self.core.upgrade() {
            if let Ok(mut core) = core.lock() {
                core.source.cancel(self.id);
            }
        }
    }
}

impl<A> Clone for Subscription<A> {
    fn clone(&self) -> Subscription<A> {
        Subscription { id: self.id, core: self.core.clone() }
    }
}

impl<A> PartialEq for Subscription<A> {
    fn eq(&self, other: &Subscription<A>) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.core, &other.core)
    }
}

impl<A> Eq for Subscription<A> {}

impl<A> fmt::Debug for Subscription<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
