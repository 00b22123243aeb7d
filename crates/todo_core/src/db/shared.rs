//! Process-wide shared SQLite handle.
//!
//! # Responsibility
//! - Let concurrent async callers share one migrated connection.
//! - Run blocking SQL on the tokio blocking pool.
//! - Turn caller cancellation into `sqlite3_interrupt` on the in-flight call.
//! - Expose the cancellation state to the call so writes can refuse to commit.
//!
//! # Invariants
//! - At most one call uses the connection at a time.
//! - An interrupt is only ever issued while the cancelled call itself owns
//!   the connection, never against another caller's statements.
//! - `sqlite3_interrupt` is cleared when the next statement starts, so it
//!   cannot stop a call cancelled between statements; such calls observe
//!   [`CancelFlag::is_cancelled`] instead.

use log::debug;
use rusqlite::{Connection, InterruptHandle};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Failure of the blocking worker that executes a storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The call was cancelled before it produced a result.
    Cancelled,
    /// The worker panicked or was aborted by the runtime.
    Failed(String),
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "storage call cancelled"),
            Self::Failed(message) => write!(f, "storage worker failed: {message}"),
        }
    }
}

impl Error for WorkerError {}

/// Cancellation state of one storage call, set when its caller goes away.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `WorkerError::Cancelled` once the caller has dropped the call.
    pub fn check(&self) -> Result<(), WorkerError> {
        if self.is_cancelled() {
            Err(WorkerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Marks the call cancelled; every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Cloneable handle to the single store connection.
///
/// Acquired once at startup and passed to every service explicitly.
#[derive(Clone)]
pub struct SharedConnection {
    inner: Arc<Inner>,
}

struct Inner {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
    owner: Mutex<Option<u64>>,
    next_call_id: AtomicU64,
}

impl Inner {
    fn set_owner(&self, call_id: Option<u64>) {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = call_id;
    }
}

impl SharedConnection {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                interrupt,
                owner: Mutex::new(None),
                next_call_id: AtomicU64::new(1),
            }),
        }
    }

    /// Runs `f` with exclusive access to the connection on a blocking worker.
    ///
    /// Dropping the returned future cancels the call: if `f` has not started
    /// it is skipped, and if it is running its current statement is
    /// interrupted. `f` receives the call's [`CancelFlag`] and must check it
    /// before committing, since a cancel between statements interrupts
    /// nothing.
    pub async fn run<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        F: FnOnce(&Connection, &CancelFlag) -> T + Send + 'static,
        T: Send + 'static,
    {
        let call_id = self.inner.next_call_id.fetch_add(1, Ordering::Relaxed);
        let cancelled = CancelFlag::default();
        let mut guard = CancelOnDrop {
            inner: Arc::clone(&self.inner),
            cancelled: cancelled.clone(),
            call_id,
            armed: true,
        };

        let inner = Arc::clone(&self.inner);
        let handle = tokio::task::spawn_blocking(move || {
            if cancelled.is_cancelled() {
                return None;
            }
            let conn = inner.conn.lock().unwrap_or_else(PoisonError::into_inner);
            inner.set_owner(Some(call_id));
            if cancelled.is_cancelled() {
                inner.set_owner(None);
                return None;
            }
            let output = f(&conn, &cancelled);
            inner.set_owner(None);
            Some(output)
        });

        let joined = handle.await;
        guard.armed = false;

        match joined {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(WorkerError::Cancelled),
            Err(err) => Err(WorkerError::Failed(err.to_string())),
        }
    }
}

struct CancelOnDrop {
    inner: Arc<Inner>,
    cancelled: CancelFlag,
    call_id: u64,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancelled.cancel();

        let owner = self
            .inner
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *owner == Some(self.call_id) {
            self.inner.interrupt.interrupt();
            debug!(
                "event=storage_call_cancel module=db status=ok call_id={} interrupted=true",
                self.call_id
            );
        } else {
            debug!(
                "event=storage_call_cancel module=db status=ok call_id={} interrupted=false",
                self.call_id
            );
        }
    }
}
