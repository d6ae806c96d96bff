//! Feedback queue implementation.
//!
//! One mutex guards the buffer and the observer table. The dispatch thread
//! takes the head item and its observer under the lock, releases it, then
//! invokes the observer, so observers may call back into the queue.
//!
//! Observers run on a dedicated OS thread, never on an async executor, so a
//! slow observer delays only later feedback.
//!
//! Observer panics are not caught. A panic unwinds the dispatch thread, the
//! queue is marked faulted, and `stop` reports the fault. A hung observer
//! blocks all later dispatch; callers own that risk.

use crate::error::QueueError;
use crate::feedback::{Feedback, FeedbackTag};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

const DISPATCH_THREAD_NAME: &str = "radiora-dispatch";

/// Observer callback invoked on the dispatch thread
pub type Observer = Arc<dyn Fn(&Feedback) + Send + Sync>;

/// Key an observer is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKey {
    /// Exactly this feedback variant
    Tag(FeedbackTag),
    /// Any variant without an exact observer
    Any,
}

impl From<FeedbackTag> for ObserverKey {
    fn from(tag: FeedbackTag) -> Self {
        Self::Tag(tag)
    }
}

impl fmt::Display for ObserverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{}", tag),
            Self::Any => write!(f, "*"),
        }
    }
}

struct QueueState {
    buffer: VecDeque<Feedback>,
    observers: HashMap<ObserverKey, Observer>,
    running: bool,
    faulted: bool,
}

impl QueueState {
    fn observer_for(&self, tag: FeedbackTag) -> Option<Observer> {
        self.observers
            .get(&ObserverKey::Tag(tag))
            .or_else(|| self.observers.get(&ObserverKey::Any))
            .cloned()
    }

    /// Error for operations that need a live queue
    fn check_live(&self) -> Result<(), QueueError> {
        if self.faulted {
            return Err(QueueError::Faulted);
        }
        if !self.running {
            return Err(QueueError::Stopped);
        }
        Ok(())
    }
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
}

/// Marks the queue faulted if the dispatch thread unwinds
struct FaultGuard(Arc<Shared>);

impl Drop for FaultGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.state.lock().faulted = true;
            tracing::error!("Feedback observer panicked, dispatch thread terminated");
        }
    }
}

/// Ordered feedback buffer drained by a dedicated dispatch thread
pub struct FeedbackQueue {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FeedbackQueue {
    /// Create a running queue and spawn its dispatch thread
    pub fn start() -> Result<Self, QueueError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                buffer: VecDeque::new(),
                observers: HashMap::new(),
                running: true,
                faulted: false,
            }),
            wake: Condvar::new(),
        });

        let loop_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || dispatch_loop(loop_shared))
            .map_err(|e| {
                tracing::error!("Failed to spawn dispatch thread: {}", e);
                QueueError::SpawnFailed {
                    reason: e.to_string(),
                }
            })?;
        tracing::debug!("Feedback dispatch thread started");

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Append feedback to the tail of the queue and wake the dispatch thread
    pub fn enqueue(&self, feedback: Feedback) -> Result<(), QueueError> {
        {
            let mut state = self.shared.state.lock();
            state.check_live()?;
            state.buffer.push_back(feedback);
        }
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Install the observer for a key, replacing any previous one
    pub fn set_observer<F>(&self, key: impl Into<ObserverKey>, observer: F) -> Result<(), QueueError>
    where
        F: Fn(&Feedback) + Send + Sync + 'static,
    {
        let key = key.into();
        let mut state = self.shared.state.lock();
        state.check_live()?;
        if state.observers.insert(key, Arc::new(observer)).is_some() {
            tracing::debug!("Observer for {} replaced", key);
        } else {
            tracing::debug!("Observer for {} added", key);
        }
        Ok(())
    }

    /// Remove the observer for a key
    ///
    /// Returns true if an observer was installed.
    pub fn remove_observer(&self, key: impl Into<ObserverKey>) -> bool {
        let key = key.into();
        let removed = self.shared.state.lock().observers.remove(&key).is_some();
        if removed {
            tracing::debug!("Observer for {} removed", key);
        }
        removed
    }

    /// Number of items waiting for dispatch
    pub fn pending(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    /// Whether the queue still accepts feedback
    pub fn is_running(&self) -> bool {
        let state = self.shared.state.lock();
        state.running && !state.faulted
    }

    /// Whether the dispatch thread died from an observer panic
    pub fn is_faulted(&self) -> bool {
        self.shared.state.lock().faulted
    }

    /// Stop the queue
    ///
    /// Undelivered items are discarded. Blocks until the dispatch thread has
    /// finished the observer it is running, if any, and exited. Called from
    /// an observer, it stops the queue without waiting for itself.
    pub fn stop(&self) -> Result<(), QueueError> {
        let discarded = {
            let mut state = self.shared.state.lock();
            if !state.running {
                return Err(QueueError::AlreadyStopped);
            }
            state.running = false;
            let discarded = state.buffer.len();
            state.buffer.clear();
            discarded
        };
        self.shared.wake.notify_all();

        if discarded > 0 {
            tracing::debug!("Discarded {} undelivered feedback items", discarded);
        }

        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return Ok(());
        };

        if worker.thread().id() == std::thread::current().id() {
            tracing::debug!("Feedback queue stopped from its own observer");
            return Ok(());
        }

        match worker.join() {
            Ok(()) => {
                tracing::debug!("Feedback dispatch thread stopped");
                Ok(())
            }
            Err(payload) => Err(QueueError::ObserverPanicked {
                message: panic_message(payload),
            }),
        }
    }
}

impl Drop for FeedbackQueue {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        if state.running {
            state.running = false;
            state.buffer.clear();
            drop(state);
            self.shared.wake.notify_all();
        }
    }
}

impl fmt::Debug for FeedbackQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("FeedbackQueue")
            .field("pending", &state.buffer.len())
            .field("observers", &state.observers.len())
            .field("running", &state.running)
            .field("faulted", &state.faulted)
            .finish()
    }
}

fn dispatch_loop(shared: Arc<Shared>) {
    let _guard = FaultGuard(shared.clone());

    loop {
        let (feedback, observer) = {
            let mut state = shared.state.lock();
            loop {
                if !state.running {
                    return;
                }
                if let Some(feedback) = state.buffer.pop_front() {
                    let observer = state.observer_for(feedback.tag());
                    break (feedback, observer);
                }
                shared.wake.wait(&mut state);
            }
        };

        match observer {
            Some(observer) => {
                tracing::debug!("Dispatching {}", feedback.tag());
                observer(&feedback);
            }
            None => tracing::debug!("No observer for {}, dropped", feedback.tag()),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::decode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!(
            "timed out waiting for {} deliveries, saw {}",
            expected,
            counter.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn test_exact_observer_preferred_over_wildcard() {
        let queue = FeedbackQueue::start().unwrap();
        let exact = Arc::new(AtomicUsize::new(0));
        let wildcard = Arc::new(AtomicUsize::new(0));

        let e = exact.clone();
        queue
            .set_observer(FeedbackTag::Prompt, move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let w = wildcard.clone();
        queue
            .set_observer(ObserverKey::Any, move |_| {
                w.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        queue.enqueue(Feedback::Prompt).unwrap();
        queue.enqueue(decode("LZC,1,OFF").unwrap()).unwrap();

        wait_for(&wildcard, 1);
        wait_for(&exact, 1);
        assert_eq!(exact.load(Ordering::SeqCst), 1);
        assert_eq!(wildcard.load(Ordering::SeqCst), 1);

        queue.stop().unwrap();
    }

    #[test]
    fn test_remove_observer() {
        let queue = FeedbackQueue::start().unwrap();
        queue.set_observer(ObserverKey::Any, |_| {}).unwrap();
        assert!(queue.remove_observer(ObserverKey::Any));
        assert!(!queue.remove_observer(ObserverKey::Any));
        queue.stop().unwrap();
    }

    #[test]
    fn test_double_stop_is_contract_violation() {
        let queue = FeedbackQueue::start().unwrap();
        queue.stop().unwrap();

        let err = queue.stop().unwrap_err();
        assert_eq!(err, QueueError::AlreadyStopped);
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_operations_after_stop_fail() {
        let queue = FeedbackQueue::start().unwrap();
        queue.stop().unwrap();

        assert!(!queue.is_running());
        assert_eq!(queue.enqueue(Feedback::Prompt), Err(QueueError::Stopped));
        assert_eq!(
            queue.set_observer(ObserverKey::Any, |_| {}),
            Err(QueueError::Stopped)
        );
    }

    #[test]
    fn test_observers_run_on_dispatch_thread() {
        let queue = FeedbackQueue::start().unwrap();
        let names = Arc::new(Mutex::new(Vec::new()));

        let n = names.clone();
        queue
            .set_observer(ObserverKey::Any, move |_| {
                n.lock()
                    .push(std::thread::current().name().map(str::to_string));
            })
            .unwrap();
        queue.enqueue(Feedback::Prompt).unwrap();

        for _ in 0..200 {
            if !names.lock().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            *names.lock(),
            vec![Some(DISPATCH_THREAD_NAME.to_string())]
        );

        queue.stop().unwrap();
    }

    #[test]
    fn test_observer_may_stop_its_own_queue() {
        let queue = Arc::new(FeedbackQueue::start().unwrap());
        let result = Arc::new(Mutex::new(None));

        let q = queue.clone();
        let r = result.clone();
        queue
            .set_observer(FeedbackTag::Prompt, move |_| {
                *r.lock() = Some(q.stop());
            })
            .unwrap();
        queue.enqueue(Feedback::Prompt).unwrap();

        for _ in 0..200 {
            if result.lock().is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*result.lock(), Some(Ok(())));
        assert!(!queue.is_running());
        assert_eq!(queue.stop(), Err(QueueError::AlreadyStopped));
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "non-string panic payload");
    }
}
