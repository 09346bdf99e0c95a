//! Execution contexts for deferred delivery.
//!
//! Everything in this crate delivers synchronously on the updating thread
//! unless a combinator explicitly hops onto an executor. An [`Executor`] is
//! the "run this later, possibly on another thread" abstraction those
//! combinators are parameterized over. Hosts register their own executors
//! under well-known names (a UI framework would register its main-thread
//! dispatcher as `"main"`); a plain thread-spawning executor is
//! pre-registered as `"background"`.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

use lazy_static::lazy_static;

use crate::observable::{deliver, Observable, Options};

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that runs tasks later, possibly on another thread.
pub trait Executor: Send + Sync {
    /// Run a task as soon as possible.
    fn execute(&self, task: Task);

    /// Run a task after the given interval has elapsed.
    fn execute_after(&self, interval: Duration, task: Task);
}


/// Run a task on a throwaway thread once the interval has elapsed.
pub fn after<F>(interval: Duration, task: F)
    where F: FnOnce() + Send + 'static
{
    thread::spawn(move || {
        thread::sleep(interval);
        task();
    });
}


/// An executor that spawns a fresh thread per task.
///
/// Cheap to set up and good enough for background work, but it makes no
/// ordering promises across tasks: two tasks submitted back to back race
/// each other.
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) {
        thread::spawn(move || task());
    }

    fn execute_after(&self, interval: Duration, task: Task) {
        after(interval, task);
    }
}


/// An executor backed by a single dedicated worker thread.
///
/// Tasks run in submission order on one thread, which makes this the
/// executor of choice for "hop everything onto this context" setups akin to
/// a main-thread dispatcher.
pub struct WorkerExecutor {
    name: String,
    sender: Mutex<Sender<Task>>,
}

impl WorkerExecutor {
    /// Spawn the worker thread and return a handle to it.
    ///
    /// The thread shuts down once the executor (and every delayed task still
    /// holding a sender clone) has been dropped.
    pub fn new<N: Into<String>>(name: N) -> WorkerExecutor {
        let (sender, receiver) = channel::<Task>();
        thread::spawn(move || {
            for task in receiver {
                task();
            }
        });
        WorkerExecutor { name: name.into(), sender: Mutex::new(sender) }
    }

    /// The name this worker was created with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for WorkerExecutor {
    fn execute(&self, task: Task) {
        let _ = self.sender.lock().unwrap().send(task);
    }

    fn execute_after(&self, interval: Duration, task: Task) {
        let sender = self.sender.lock().unwrap().clone();
        after(interval, move || {
            let _ = sender.send(task);
        });
    }
}


lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Arc<dyn Executor>>> = {
        let mut executors: HashMap<String, Arc<dyn Executor>> = HashMap::new();
        executors.insert("background".to_string(), Arc::new(ThreadExecutor));
        RwLock::new(executors)
    };
}

/// Register an executor under a name, replacing any previous entry.
pub fn register_executor(name: &str, executor: Arc<dyn Executor>) {
    log::debug!("registering executor {:?}", name);
    REGISTRY.write().unwrap().insert(name.to_string(), executor);
}

/// Look up a registered executor. `"background"` is always available.
pub fn executor(name: &str) -> Option<Arc<dyn Executor>> {
    REGISTRY.read().unwrap().get(name).cloned()
}


/// Build a hop function for use with `flat_map`.
///
/// The returned closure turns a value into a fire-once container whose
/// single update is dispatched on the executor, the bridge between the
/// synchronous container world and an execution context.
///
/// The dispatch is held back until the first subscriber attaches, so the
/// hopped value always reaches its subscribers from the executor's context
/// and never synchronously on the updating thread.
///
/// ```
/// use std::sync::Arc;
/// use hydroxyl::{hop, Executor, Observable, Options, WorkerExecutor};
///
/// let worker: Arc<dyn Executor> = Arc::new(WorkerExecutor::new("sync"));
/// let source = Observable::with_options(Options::NO_REPLAY);
/// let hopped = source.flat_map(hop(&worker));
/// let (tx, rx) = std::sync::mpsc::channel();
/// hopped.subscribe(move |n| { let _ = tx.send(n); });
/// source.update(3);
/// assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap(), 3);
/// ```
pub fn hop<A>(executor: &Arc<dyn Executor>) -> impl Fn(A) -> Observable<A> + Send + Sync + 'static
    where A: Clone + Send + 'static
{
    let executor = executor.clone();
    move |a: A| {
        let cell = Observable::with_options(Options::ONCE);
        let weak = Arc::downgrade(&cell.core);
        let executor = executor.clone();
        cell.prime(Box::new(move || {
            // The primer runs during the first subscribe, while the cell is
            // certainly alive; the strong handle keeps it so until the
            // executor has delivered.
            if let Some(target) = weak.upgrade() {
                executor.execute(Box::new(move || {
                    let _ = deliver(&target, a);
                }));
            }
        }));
        cell
    }
}
