use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;

/// Unit of work posted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A serial execution context for observer callbacks.
///
/// Implementations must run tasks one at a time, in the order they were
/// posted. A host with its own UI loop implements this to receive events
/// on that loop; otherwise [`DispatchThread`] provides one.
pub trait EventExecutor: Send + Sync {
    fn post(&self, task: Task);
}

/// Default executor: one named background thread draining a FIFO queue.
pub struct DispatchThread {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    thread_id: Option<thread::ThreadId>,
}

impl DispatchThread {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Task>();

        let handle = thread::Builder::new()
            .name("capture-dispatch".into())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    // An observer that panics must not take the queue down with it.
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        log::error!("Capture observer panicked; event dropped");
                    }
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn dispatch thread, delivering inline: {}", e);
                None
            }
        };
        let thread_id = handle.as_ref().map(|h| h.thread().id());

        Self {
            sender: Mutex::new(handle.as_ref().map(|_| sender)),
            handle: Mutex::new(handle),
            thread_id,
        }
    }

    /// Block until every task posted before this call has run.
    ///
    /// Returns immediately when called from the dispatch thread itself.
    pub fn flush(&self) {
        if self.is_dispatch_thread() {
            return;
        }
        let (done_tx, done_rx) = mpsc::channel::<()>();
        self.post(Box::new(move || {
            let _ = done_tx.send(());
        }));
        let _ = done_rx.recv();
    }

    fn is_dispatch_thread(&self) -> bool {
        self.thread_id == Some(thread::current().id())
    }
}

impl Default for DispatchThread {
    fn default() -> Self {
        Self::new()
    }
}

impl EventExecutor for DispatchThread {
    fn post(&self, task: Task) {
        let rejected = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).err().map(|e| e.0),
            None => Some(task),
        };
        // No worker thread: run on the caller, which keeps ordering for a
        // single producer.
        if let Some(task) = rejected {
            task();
        }
    }
}

impl Drop for DispatchThread {
    fn drop(&mut self) {
        self.sender.lock().take();
        if self.is_dispatch_thread() {
            return;
        }
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}
