//! In-order command queue and completion events.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::{DeviceError, StatusCode};

type Command = Box<dyn FnOnce() -> StatusCode + Send + 'static>;

static NEXT_QUEUE_ID: AtomicUsize = AtomicUsize::new(0);

/// Settings for a [`CommandQueue`] worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Worker threads are named `{thread_name_prefix}-{queue id}`.
    pub thread_name_prefix: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: "batched-device".to_string(),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

struct EventState {
    status: Mutex<Option<StatusCode>>,
    done: Condvar,
}

/// Completion handle of one enqueued command.
#[derive(Clone)]
pub struct Event {
    state: Arc<EventState>,
}

impl Event {
    pub(crate) fn pending() -> Self {
        Self {
            state: Arc::new(EventState {
                status: Mutex::new(None),
                done: Condvar::new(),
            }),
        }
    }

    /// An event that has already completed with `status`.
    pub fn completed(status: StatusCode) -> Self {
        let event = Self::pending();
        event.complete(status);
        event
    }

    pub(crate) fn complete(&self, status: StatusCode) {
        let mut guard = self.state.status.lock();
        *guard = Some(status);
        self.state.done.notify_all();
    }

    /// Block until the command completes and return its status.
    pub fn wait(&self) -> StatusCode {
        let mut guard = self.state.status.lock();
        loop {
            if let Some(status) = *guard {
                return status;
            }
            self.state.done.wait(&mut guard);
        }
    }

    /// Status if completed, without blocking.
    pub fn status(&self) -> Option<StatusCode> {
        *self.state.status.lock()
    }

    pub fn is_complete(&self) -> bool {
        self.status().is_some()
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::completed(StatusCode::Success)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("status", &self.status()).finish()
    }
}

// ============================================================================
// CommandQueue
// ============================================================================

struct QueueInner {
    id: usize,
    sender: Option<Sender<(Command, Event)>>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is left and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                warn!("queue {}: worker thread panicked", self.id);
            }
        }
        debug!("queue {}: released", self.id);
    }
}

/// In-order command queue of the emulated accelerator.
///
/// Commands run one at a time on a dedicated worker thread, in enqueue
/// order. Handles are cheap to clone; the worker exits once the last handle
/// is dropped and every pending command has run.
#[derive(Clone)]
pub struct CommandQueue {
    inner: Arc<QueueInner>,
}

impl CommandQueue {
    pub fn new() -> Result<Self, DeviceError> {
        Self::with_config(DeviceConfig::default())
    }

    pub fn with_config(config: DeviceConfig) -> Result<Self, DeviceError> {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = thread::Builder::new()
            .name(format!("{}-{}", config.thread_name_prefix, id))
            .spawn(move || run_worker(id, receiver))?;
        debug!("queue {}: started", id);
        Ok(Self {
            inner: Arc::new(QueueInner {
                id,
                sender: Some(sender),
                worker: Some(worker),
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Whether both handles refer to the same queue.
    pub fn same_queue(&self, other: &CommandQueue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Append a command; the returned event completes with its status.
    ///
    /// Commands must not capture a `CommandQueue` handle.
    pub fn enqueue<F>(&self, command: F) -> Event
    where
        F: FnOnce() -> StatusCode + Send + 'static,
    {
        let event = Event::pending();
        let Some(sender) = &self.inner.sender else {
            return Event::completed(StatusCode::QueueClosed);
        };
        trace!("queue {}: enqueue command", self.inner.id);
        if sender.send((Box::new(command), event.clone())).is_err() {
            warn!("queue {}: worker is gone, command dropped", self.inner.id);
            return Event::completed(StatusCode::QueueClosed);
        }
        event
    }

    /// Block until every command enqueued so far has completed.
    pub fn finish(&self) -> StatusCode {
        self.enqueue(|| StatusCode::Success).wait()
    }
}

impl PartialEq for CommandQueue {
    fn eq(&self, other: &Self) -> bool {
        self.same_queue(other)
    }
}

impl Eq for CommandQueue {}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue").field("id", &self.inner.id).finish()
    }
}

fn run_worker(id: usize, receiver: Receiver<(Command, Event)>) {
    for (command, event) in receiver.iter() {
        let status = match panic::catch_unwind(AssertUnwindSafe(command)) {
            Ok(status) => status,
            Err(_) => {
                warn!("queue {}: command panicked", id);
                StatusCode::ExecutionFailed
            }
        };
        if !status.is_success() {
            warn!("queue {}: command failed: {}", id, status);
        }
        event.complete(status);
    }
    debug!("queue {}: worker exiting", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[test]
    fn test_commands_run_in_order() {
        let queue = CommandQueue::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut events = Vec::new();
        for i in 0..16 {
            let log = Arc::clone(&log);
            events.push(queue.enqueue(move || {
                if i % 4 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
                log.lock().push(i);
                StatusCode::Success
            }));
        }
        assert_eq!(queue.finish(), StatusCode::Success);
        assert!(events.iter().all(Event::is_complete));
        assert_eq!(*log.lock(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_command_reports_failure() {
        let queue = CommandQueue::new().unwrap();
        let failed = queue.enqueue(|| panic!("kernel fault"));
        let ok = queue.enqueue(|| StatusCode::Success);
        assert_eq!(failed.wait(), StatusCode::ExecutionFailed);
        assert_eq!(ok.wait(), StatusCode::Success);
    }

    #[test]
    fn test_status_is_propagated() {
        let queue = CommandQueue::new().unwrap();
        let event = queue.enqueue(|| StatusCode::InvalidDimension);
        assert_eq!(event.wait(), StatusCode::InvalidDimension);
        assert_eq!(event.status(), Some(StatusCode::InvalidDimension));
    }

    #[test]
    fn test_drop_drains_pending_commands() {
        let ran = Arc::new(AtomicBool::new(false));
        let event = {
            let queue = CommandQueue::new().unwrap();
            let ran = Arc::clone(&ran);
            queue.enqueue(move || {
                thread::sleep(Duration::from_millis(5));
                ran.store(true, Ordering::SeqCst);
                StatusCode::Success
            })
        };
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(event.status(), Some(StatusCode::Success));
    }

    #[test]
    fn test_queue_identity() {
        let a = CommandQueue::new().unwrap();
        let b = CommandQueue::new().unwrap();
        let a2 = a.clone();
        assert!(a.same_queue(&a2));
        assert!(!a.same_queue(&b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_worker_thread_name() {
        let queue = CommandQueue::with_config(DeviceConfig {
            thread_name_prefix: "unit-device".to_string(),
        })
        .unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        queue.enqueue(move || {
            let name = thread::current().name().map(str::to_string);
            let _ = tx.send(name);
            StatusCode::Success
        });
        let name = rx.recv().unwrap().unwrap();
        assert!(name.starts_with("unit-device-"));
    }

    #[test]
    fn test_completed_event() {
        let event = Event::completed(StatusCode::QueueClosed);
        assert!(event.is_complete());
        assert_eq!(event.wait(), StatusCode::QueueClosed);
        assert_eq!(Event::default().wait(), StatusCode::Success);
    }
}
