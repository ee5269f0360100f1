//! In-flight request bookkeeping
//!
//! Every command sent over a session gets a fresh ID and a single-use waiter.
//! The read loop hands each `result` message to the waiter with the same ID.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{HaError, HaResult};

use super::types::InboundMessage;

/// Receiving side of a pending call
pub type Waiter = oneshot::Receiver<HaResult<InboundMessage>>;

/// Correlation registry for one WebSocket session
#[derive(Debug)]
pub struct PendingCalls {
    /// Last issued ID
    last_id: AtomicI64,
    /// Mirror of `Inner::closed` for lock-free liveness checks
    closed: AtomicBool,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    closed: bool,
    waiters: HashMap<i64, oneshot::Sender<HaResult<InboundMessage>>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            last_id: AtomicI64::new(0),
            closed: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Issue a new ID, strictly greater than every ID issued before
    pub fn next_id(&self) -> i64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Create the waiter for `id`
    pub fn register(&self, id: i64) -> HaResult<Waiter> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(HaError::ConnectionClosed);
        }
        if inner.waiters.contains_key(&id) {
            return Err(HaError::DuplicateId(id));
        }

        let (tx, rx) = oneshot::channel();
        inner.waiters.insert(id, tx);
        Ok(rx)
    }

    /// Hand `message` to the waiter for `id`
    ///
    /// Returns false when nobody is waiting (late, duplicate or unknown ID).
    /// Never blocks: a waiter whose caller has gone away is simply discarded.
    pub fn deliver(&self, id: i64, message: InboundMessage) -> bool {
        let waiter = self.lock().waiters.remove(&id);
        match waiter {
            Some(tx) => {
                if tx.send(Ok(message)).is_err() {
                    trace!(id, "Caller stopped waiting before delivery");
                }
                true
            }
            None => {
                trace!(id, "Dropping message for unknown request id");
                false
            }
        }
    }

    /// Forget `id` without delivering anything
    pub fn unregister(&self, id: i64) {
        if self.lock().waiters.remove(&id).is_some() {
            trace!(id, "Unregistered pending call");
        }
    }

    /// Fail every waiter with [`HaError::ConnectionClosed`] and refuse new ones
    ///
    /// Returns true only for the call that performed the close.
    pub fn close(&self) -> bool {
        let drained = {
            let mut inner = self.lock();
            if inner.closed {
                return false;
            }
            inner.closed = true;
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut inner.waiters)
        };

        for (id, tx) in drained {
            trace!(id, "Failing pending call: connection closed");
            let _ = tx.send(Err(HaError::ConnectionClosed));
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of calls still waiting for a response
    pub fn len(&self) -> usize {
        self.lock().waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}
