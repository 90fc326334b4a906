//! Incrementally materialized sequences.
//!
//! A [`Lazy`] pairs a [`Queue`] with a backing store. Readers look in the
//! store first and only pop from the queue when the position they need has
//! not arrived yet. Every pop appends to the store while the queue's consumer
//! lock is held, so the store grows in arrival order no matter how many
//! threads read the same value.

use crate::channel::{ChannelResult, Queue};
use parking_lot::Mutex;
use std::sync::Arc;

struct Inner<T> {
    queue: Queue<T>,
    store: Mutex<Vec<T>>,
}

/// Shared handle to a lazily filled sequence.
pub struct Lazy<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Lazy<T> {
    /// Sequence fed by `queue`; nothing is read until someone asks.
    pub fn from_queue(queue: Queue<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue,
                store: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fully materialized sequence.
    pub fn from_vec(items: Vec<T>) -> Self {
        let queue = Queue::from_values(Vec::new());
        // Consume the terminator so the sequence reads as complete.
        let _ = queue.pop(false);
        Self {
            inner: Arc::new(Inner {
                queue,
                store: Mutex::new(items),
            }),
        }
    }

    /// Item at `index`, popping from the queue as needed. `Ok(None)` if the
    /// stream ended before reaching it.
    pub fn get(&self, index: usize) -> ChannelResult<Option<T>> {
        loop {
            if let Some(item) = self.inner.store.lock().get(index) {
                return Ok(Some(item.clone()));
            }
            if self.pop_one()?.is_none() {
                // Another reader may have stored the last item just before
                // the terminator was observed.
                return Ok(self.inner.store.lock().get(index).cloned());
            }
        }
    }

    /// Number of items already materialized, without blocking.
    pub fn available(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// Pop until end-of-stream and return every item.
    pub fn materialize(&self) -> ChannelResult<Vec<T>> {
        while self.pop_one()?.is_some() {}
        Ok(self.inner.store.lock().clone())
    }

    /// Like [`materialize`](Self::materialize), but a cancelled pipeline
    /// yields whatever has arrived so far.
    pub fn items(&self) -> Vec<T> {
        match self.materialize() {
            Ok(items) => items,
            Err(e) => {
                tracing::debug!("partial materialization: {}", e);
                self.inner.store.lock().clone()
            }
        }
    }

    pub fn len(&self) -> ChannelResult<usize> {
        while self.pop_one()?.is_some() {}
        Ok(self.available())
    }

    pub fn is_empty(&self) -> ChannelResult<bool> {
        Ok(self.get(0)?.is_none())
    }

    /// Whether the backing stream has ended and the store is final.
    pub fn is_complete(&self) -> bool {
        self.inner.queue.is_terminated()
    }

    fn pop_one(&self) -> ChannelResult<Option<()>> {
        let store = &self.inner.store;
        self.inner
            .queue
            .pop_map(true, |item| store.lock().push(item))
    }
}
