//! Time-based and executor-hopping combinators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::executor::{after, hop, Executor};
use crate::observable::{deliver, Core, Observable};
use crate::source::{with_weak, CallbackError};


/// Bookkeeping for a debounced container. Consulted and updated under its
/// own per-combinator lock.
struct Debounce<A> {
    latest: Option<A>,
    generation: u64,
}

impl<A: Clone + Send + 'static> Observable<A> {
    /// Re-deliver every value after an interval, scheduled on an executor.
    ///
    /// Each update schedules its own independent timer, so deliveries keep
    /// the order in which timers fire. Overlapping delays of different
    /// lengths may therefore reorder relative to the source update order;
    /// that is a property of the combinator, not an accident.
    pub fn delay(&self, interval: Duration, executor: &Arc<dyn Executor>) -> Observable<A> {
        let core = Arc::new(Mutex::new(Core::new(self.options())));
        let weak = Arc::downgrade(&core);
        let executor = executor.clone();
        self.subscribe_raw(Arc::new(move |a: A| {
            if weak.upgrade().is_none() {
                return Err(CallbackError::Disappeared);
            }
            let weak = weak.clone();
            executor.execute_after(interval, Box::new(move || {
                let _ = with_weak(&weak, |dst| deliver(dst, a));
            }));
            Ok(())
        }));
        Observable { core, keep_alive: Box::new(self.clone()) }
    }

    /// Suppress bursts of updates, delivering only the last value of a
    /// burst once the interval has passed without a newer one.
    ///
    /// Trailing-edge: every update stamps the latest value and restarts the
    /// window; a timer superseded by a newer update does nothing. The final
    /// update of a burst is always delivered eventually, no earlier than
    /// `interval` after it arrived.
    pub fn debounce(&self, interval: Duration) -> Observable<A> {
        let core = Arc::new(Mutex::new(Core::new(self.options())));
        let weak = Arc::downgrade(&core);
        let state = Arc::new(Mutex::new(Debounce { latest: None, generation: 0 }));
        self.subscribe_raw(Arc::new(move |a: A| {
            if weak.upgrade().is_none() {
                return Err(CallbackError::Disappeared);
            }
            let generation = {
                let mut state = match state.lock() {
                    Ok(guard) => guard,
                    Err(_) => return Err(CallbackError::Poisoned),
                };
                state.latest = Some(a);
                state.generation += 1;
                state.generation
            };
            let weak = weak.clone();
            let state = state.clone();
            after(interval, move || {
                let value = {
                    let mut state = match state.lock() {
                        Ok(guard) => guard,
                        Err(_) => return,
                    };
                    if state.generation != generation {
                        log::trace!("debounce timer superseded by a newer update");
                        return;
                    }
                    state.latest.take()
                };
                if let Some(value) = value {
                    let _ = with_weak(&weak, |dst| deliver(dst, value));
                }
            });
            Ok(())
        }));
        Observable { core, keep_alive: Box::new(self.clone()) }
    }

    /// Re-dispatch every delivery onto an executor.
    ///
    /// The derived container receives each source value as a task on the
    /// executor instead of synchronously on the updating thread. This is
    /// the only combinator that breaks synchronous delivery by design; it
    /// is a plain composition of [`flat_map`](Observable::flat_map) with
    /// fire-once hop containers.
    pub fn ensure(&self, executor: &Arc<dyn Executor>) -> Observable<A> {
        let executor = executor.clone();
        self.flat_map(move |a| hop(&executor)(a))
    }

    /// Like [`ensure`](Observable::ensure), resolving the executor through
    /// the named registry. Returns `None` for an unknown name.
    pub fn ensure_named(&self, name: &str) -> Option<Observable<A>> {
        crate::executor::executor(name).map(|executor| self.ensure(&executor))
    }
}


#[cfg(test)]
mod test {
    use std::sync::mpsc::channel;
    use std::time::Instant;

    use crate::executor::ThreadExecutor;
    use crate::observable::Options;
    use super::*;

    #[test]
    fn delay_re_delivers_after_the_interval() {
        let executor: Arc<dyn Executor> = Arc::new(ThreadExecutor);
        let source = Observable::with_options(Options::NO_REPLAY);
        let delayed = source.delay(Duration::from_millis(20), &executor);
        let (sender, receiver) = channel();
        delayed.subscribe(move |n: i32| sender.send(n).unwrap());
        let start = Instant::now();
        source.update(5);
        assert_eq!(receiver.recv_timeout(Duration::from_secs(1)).unwrap(), 5);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn delay_drops_with_its_container() {
        let executor: Arc<dyn Executor> = Arc::new(ThreadExecutor);
        let source: Observable<i32> = Observable::with_options(Options::NO_REPLAY);
        drop(source.delay(Duration::from_millis(5), &executor));
        source.update(1);
        source.update(2);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn debounce_delivers_an_isolated_update() {
        let source = Observable::with_options(Options::NO_REPLAY);
        let debounced = source.debounce(Duration::from_millis(20));
        let (sender, receiver) = channel();
        debounced.subscribe(move |n: i32| sender.send(n).unwrap());
        source.update(9);
        assert_eq!(receiver.recv_timeout(Duration::from_secs(1)).unwrap(), 9);
    }

    #[test]
    fn ensure_leaves_the_updating_thread() {
        // Repeated because the executor racing the downstream subscription
        // must lose every time, not just usually.
        let executor: Arc<dyn Executor> = Arc::new(ThreadExecutor);
        for n in 0..100 {
            let source = Observable::with_options(Options::NO_REPLAY);
            let hopped = source.ensure(&executor);
            let (sender, receiver) = channel();
            hopped.subscribe(move |_: i32| sender.send(std::thread::current().id()).unwrap());
            source.update(n);
            let delivered_on = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
            assert_ne!(delivered_on, std::thread::current().id());
        }
    }

    #[test]
    fn ensure_named_resolves_the_registry() {
        let source: Observable<i32> = Observable::new();
        assert!(source.ensure_named("background").is_some());
        assert!(source.ensure_named("nowhere").is_none());
    }
}
