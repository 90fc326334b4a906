//! Single-assignment, blocking-read broadcast cell.

use super::cancel::CancelToken;
use super::error::{ChannelError, ChannelResult};
use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// How often a blocked reader re-checks its cancel token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A cell written at most once; reads block until it is written.
pub struct Slot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T: Clone> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            ready: Condvar::new(),
        }
    }

    /// Publish the value. A second write fails and leaves the first intact.
    pub fn set(&self, value: T) -> ChannelResult<()> {
        let mut guard = self.value.lock();
        if guard.is_some() {
            return Err(ChannelError::AlreadyAssigned);
        }
        *guard = Some(value);
        self.ready.notify_all();
        Ok(())
    }

    /// Publish `value` only if nothing has been published yet.
    pub fn set_if_empty(&self, value: impl FnOnce() -> T) {
        let mut guard = self.value.lock();
        if guard.is_none() {
            *guard = Some(value());
            self.ready.notify_all();
        }
    }

    /// Block until the value is published or `cancel` fires.
    pub fn get(&self, cancel: &CancelToken) -> ChannelResult<T> {
        let mut guard = self.value.lock();
        loop {
            if let Some(value) = guard.as_ref() {
                return Ok(value.clone());
            }
            if cancel.is_cancelled() {
                return Err(ChannelError::Cancelled);
            }
            self.ready.wait_for(&mut guard, CANCEL_POLL_INTERVAL);
        }
    }

    pub fn try_get(&self) -> Option<T> {
        self.value.lock().clone()
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: Clone> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}
