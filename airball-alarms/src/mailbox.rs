//! Single-slot, latest-wins hand-off between a signal callback and a worker
//!
//! Posting never blocks on the worker. A command that has not been picked
//! up yet is replaced by the next one, so a slow device only ever sees the
//! most recent danger level. Closing is sticky: a final command posted
//! with [`Mailbox::close_with`] cannot be overwritten.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ActuatorError, ActuatorResult};

/// What a wait on the mailbox produced
#[derive(Debug, PartialEq)]
pub enum Received<T> {
    /// A pending command
    Message(T),
    /// Nothing arrived in time
    Timeout,
    /// Closed and drained
    Closed,
}

#[derive(Debug)]
struct Slot<T> {
    pending: Option<T>,
    closed: bool,
    replaced: u64,
}

/// Latest-wins mailbox
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Empty, open mailbox
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
                replaced: 0,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave a command, replacing any that is still pending
    pub fn post(&self, message: T) -> ActuatorResult<()> {
        let mut slot = self.lock();
        if slot.closed {
            return Err(ActuatorError::SessionClosed);
        }
        if slot.pending.replace(message).is_some() {
            slot.replaced += 1;
        }
        drop(slot);
        self.ready.notify_one();
        Ok(())
    }

    /// Leave a last command and refuse everything after it
    pub fn close_with(&self, message: T) -> ActuatorResult<()> {
        let mut slot = self.lock();
        if slot.closed {
            return Err(ActuatorError::SessionClosed);
        }
        slot.pending = Some(message);
        slot.closed = true;
        drop(slot);
        self.ready.notify_all();
        Ok(())
    }

    /// Wait up to `timeout` for a command
    pub fn recv_timeout(&self, timeout: Duration) -> Received<T> {
        let slot = self.lock();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);

        match slot.pending.take() {
            Some(message) => Received::Message(message),
            None if slot.closed => Received::Closed,
            None => Received::Timeout,
        }
    }

    /// Wait for a command; `None` once closed and drained
    pub fn recv(&self) -> Option<T> {
        let slot = self.lock();
        let mut slot = self
            .ready
            .wait_while(slot, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.pending.take()
    }

    /// Whether the mailbox refuses new commands
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Commands overwritten before the worker picked them up
    pub fn replaced(&self) -> u64 {
        self.lock().replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latest_post_wins() {
        let mb = Mailbox::new();
        mb.post(1).unwrap();
        mb.post(2).unwrap();
        mb.post(3).unwrap();
        assert_eq!(mb.recv_timeout(Duration::from_millis(1)), Received::Message(3));
        assert_eq!(mb.replaced(), 2);
        assert_eq!(mb.recv_timeout(Duration::from_millis(1)), Received::Timeout);
    }

    #[test]
    fn close_with_delivers_then_closes() {
        let mb = Mailbox::new();
        mb.post("play").unwrap();
        mb.close_with("quit").unwrap();
        assert!(matches!(mb.post("late"), Err(ActuatorError::SessionClosed)));
        assert_eq!(mb.recv(), Some("quit"));
        assert_eq!(mb.recv(), None);
        assert_eq!(mb.recv_timeout(Duration::from_millis(1)), Received::Closed);
    }

    #[test]
    fn wakes_blocked_receiver() {
        let mb = Arc::new(Mailbox::new());
        let worker = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || mb.recv())
        };
        mb.post(42_u32).unwrap();
        assert_eq!(worker.join().unwrap(), Some(42));
    }
}
