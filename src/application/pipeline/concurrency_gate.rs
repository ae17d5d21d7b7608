//! FIFO permit gate bounding simultaneous outbound probes.
//!
//! Waiters are queued as explicit tickets. `release` never bumps the free
//! count while someone is waiting: the permit is handed straight to the
//! oldest live ticket, so a burst of new callers cannot overtake the queue.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::trace;

#[derive(Debug)]
struct Waiter {
    ticket: u64,
    grant: oneshot::Sender<()>,
}

#[derive(Debug)]
struct GateState {
    capacity: usize,
    available: usize,
    next_ticket: u64,
    waiters: VecDeque<Waiter>,
}

impl GateState {
    /// Hand one permit to the oldest waiter still listening, or return it to the pool
    fn release_one(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.grant.send(()).is_ok() {
                trace!(ticket = waiter.ticket, "permit transferred");
                return;
            }
        }
        self.available = (self.available + 1).min(self.capacity);
    }
}

/// Counting gate with strict first-come, first-served grants
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    state: Arc<Mutex<GateState>>,
}

impl ConcurrencyGate {
    /// Default number of concurrent probes
    pub const DEFAULT_CAPACITY: usize = 5;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(GateState {
                capacity,
                available: capacity,
                next_ticket: 0,
                waiters: VecDeque::new(),
            })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    /// Callers currently queued
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Wait for a permit. The permit is returned when the guard drops.
    pub async fn acquire(&self) -> GatePermit {
        let (ticket, receiver) = {
            let mut state = self.state.lock();
            if state.available > 0 && state.waiters.is_empty() {
                state.available -= 1;
                return GatePermit {
                    state: Arc::clone(&self.state),
                };
            }
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            let (grant, receiver) = oneshot::channel();
            state.waiters.push_back(Waiter { ticket, grant });
            (ticket, receiver)
        };

        let mut pending = PendingTicket {
            state: Arc::clone(&self.state),
            ticket,
            armed: true,
        };
        // The sender is only dropped after a successful send or by our own
        // cancellation, so the result carries no information.
        let _ = receiver.await;
        pending.armed = false;

        GatePermit {
            state: Arc::clone(&self.state),
        }
    }

    /// Run `operation` while holding a permit; the permit is released on every path
    pub async fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await;
        operation().await
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Held permit; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    state: Arc<Mutex<GateState>>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.state.lock().release_one();
    }
}

/// Cleans up a ticket whose `acquire` future was dropped before completion
struct PendingTicket {
    state: Arc<Mutex<GateState>>,
    ticket: u64,
    armed: bool,
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if let Some(index) = state.waiters.iter().position(|w| w.ticket == self.ticket) {
            state.waiters.remove(index);
        } else {
            // Granted but never observed: pass it on.
            state.release_one();
        }
    }
}
