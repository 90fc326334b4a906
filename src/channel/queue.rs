//! Terminable FIFO queue, the value-carrying half of a channel.
//!
//! Two locks guard the two ends:
//! - the **producer lock** serializes `push`, `terminate` and `pull`, and
//!   holds the "input closed" flag;
//! - the **consumer lock** serializes `pop` and holds the "terminator observed"
//!   flag, so the terminator is seen by exactly one logical reader.
//!
//! The buffer itself is an unbounded crossbeam channel carrying either a value
//! or the terminator sentinel. Producers never block.

use super::cancel::CancelToken;
use super::error::{ChannelError, ChannelResult};
use crossbeam_channel::{select, unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Queue entry: a payload or the end-of-stream sentinel.
enum Item<T> {
    Value(T),
    Terminator,
}

struct Shared<T> {
    tx: Sender<Item<T>>,
    rx: Receiver<Item<T>>,
    /// Producer side: has the terminator been pushed?
    input_closed: Mutex<bool>,
    /// Consumer side: has the terminator been popped?
    terminated: Mutex<bool>,
    cancel: CancelToken,
}

/// Cloneable handle to a terminable, single-consumer FIFO.
pub struct Queue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Queue<T> {
    /// Create an open, empty queue observing `cancel`.
    pub fn new(cancel: CancelToken) -> Self {
        let (tx, rx) = unbounded();
        Self {
            shared: Arc::new(Shared {
                tx,
                rx,
                input_closed: Mutex::new(false),
                terminated: Mutex::new(false),
                cancel,
            }),
        }
    }

    /// Create an already-terminated queue holding `values`.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        let queue = Self::new(CancelToken::never());
        {
            let mut closed = queue.shared.input_closed.lock();
            for value in values {
                queue.send(Item::Value(value));
            }
            *closed = true;
            queue.send(Item::Terminator);
        }
        queue
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.shared.cancel
    }

    /// Append a value. Fails with [`ChannelError::Closed`] once terminated.
    pub fn push(&self, value: T) -> ChannelResult<()> {
        let closed = self.shared.input_closed.lock();
        if *closed {
            return Err(ChannelError::Closed);
        }
        self.send(Item::Value(value));
        Ok(())
    }

    /// Close the producer side and enqueue the terminator.
    ///
    /// A second call fails with [`ChannelError::Closed`] and enqueues nothing,
    /// so at most one terminator ever exists.
    pub fn terminate(&self) -> ChannelResult<()> {
        let mut closed = self.shared.input_closed.lock();
        if *closed {
            return Err(ChannelError::Closed);
        }
        *closed = true;
        self.send(Item::Terminator);
        Ok(())
    }

    /// Whether the producer side has been closed.
    pub fn is_input_closed(&self) -> bool {
        *self.shared.input_closed.lock()
    }

    /// Whether a reader has observed the end of the stream.
    pub fn is_terminated(&self) -> bool {
        *self.shared.terminated.lock()
    }

    /// Pop the next value. `Ok(None)` means end-of-stream, permanently.
    pub fn pop(&self, block: bool) -> ChannelResult<Option<T>> {
        self.pop_map(block, |value| value)
    }

    /// Pop the next value and hand it to `f` while still holding the
    /// consumer lock.
    ///
    /// Lazy values use this to append to their backing store in pop order
    /// even when several threads read the same value.
    pub fn pop_map<R>(&self, block: bool, f: impl FnOnce(T) -> R) -> ChannelResult<Option<R>> {
        let mut terminated = self.shared.terminated.lock();
        if *terminated {
            return Ok(None);
        }
        match self.recv(block)? {
            Item::Value(value) => Ok(Some(f(value))),
            Item::Terminator => {
                *terminated = true;
                Ok(None)
            }
        }
    }

    /// Move every remaining value of `from` into `self`, blocking until `from`
    /// ends, then optionally terminate `self`.
    ///
    /// The producer lock is held for the whole transfer, so no other push can
    /// interleave with the pulled values.
    pub fn pull(&self, from: &Queue<T>, terminate: bool) -> ChannelResult<()> {
        self.pull_until(from, |_| false, terminate).map(|_| ())
    }

    /// Like [`pull`](Self::pull), but stop right after moving the first value
    /// matching `stop`. The rest of `from` stays unread.
    ///
    /// Returns whether a stop value was moved.
    pub fn pull_until(
        &self,
        from: &Queue<T>,
        stop: impl Fn(&T) -> bool,
        terminate: bool,
    ) -> ChannelResult<bool> {
        let mut closed = self.shared.input_closed.lock();
        if *closed {
            return Err(ChannelError::Closed);
        }
        let mut stopped = false;
        while let Some(value) = from.pop(true)? {
            stopped = stop(&value);
            self.send(Item::Value(value));
            if stopped {
                break;
            }
        }
        if terminate {
            *closed = true;
            self.send(Item::Terminator);
        }
        Ok(stopped)
    }

    /// Blocking iterator over the remaining values.
    pub fn values(&self) -> Values<T> {
        Values {
            queue: self.clone(),
        }
    }

    fn send(&self, item: Item<T>) {
        // `shared` owns a receiver, so an unbounded send cannot fail.
        let _ = self.shared.tx.send(item);
    }

    fn recv(&self, block: bool) -> ChannelResult<Item<T>> {
        if !block {
            return match self.shared.rx.try_recv() {
                Ok(item) => Ok(item),
                Err(TryRecvError::Empty) => Err(ChannelError::WouldBlock),
                Err(TryRecvError::Disconnected) => Err(ChannelError::Closed),
            };
        }
        if self.shared.cancel.is_cancelled() {
            return Err(ChannelError::Cancelled);
        }
        select! {
            recv(self.shared.rx) -> item => item.map_err(|_| ChannelError::Closed),
            recv(self.shared.cancel.receiver()) -> _ => Err(ChannelError::Cancelled),
        }
    }

    /// Mark the queue terminated for direct readers and take everything
    /// currently buffered. Returns the buffered values and whether the
    /// terminator was among them.
    fn detach_buffered(&self) -> (Vec<T>, bool) {
        let mut terminated = self.shared.terminated.lock();
        if *terminated {
            return (Vec::new(), true);
        }
        *terminated = true;
        let mut buffered = Vec::new();
        loop {
            match self.shared.rx.try_recv() {
                Ok(Item::Value(value)) => buffered.push(value),
                Ok(Item::Terminator) => return (buffered, true),
                Err(_) => return (buffered, false),
            }
        }
    }
}

impl<T: Clone + Send + 'static> Queue<T> {
    /// Replicate this queue's unread and future content into `n` new queues.
    ///
    /// Values already buffered are copied into every replica immediately; a
    /// background worker forwards later values (and finally the terminator)
    /// to all replicas in lock-step. The original reads as terminated from
    /// now on.
    pub fn split(&self, n: usize) -> Vec<Queue<T>> {
        let (buffered, finished) = self.detach_buffered();
        let replicas: Vec<Queue<T>> = (0..n)
            .map(|_| Queue::new(self.shared.cancel.clone()))
            .collect();
        for replica in &replicas {
            for value in &buffered {
                replica.send(Item::Value(value.clone()));
            }
        }
        tracing::trace!(
            replicas = n,
            buffered = buffered.len(),
            finished,
            "split channel"
        );
        if finished {
            for replica in &replicas {
                let _ = replica.terminate();
            }
            return replicas;
        }

        let source = self.clone();
        let targets = replicas.clone();
        let spawned = std::thread::Builder::new()
            .name("jqsh-split".to_string())
            .spawn(move || source.spread(&targets));
        if let Err(e) = spawned {
            tracing::error!("failed to spawn split worker: {}", e);
            for replica in &replicas {
                let _ = replica.terminate();
            }
        }
        replicas
    }

    /// Worker body for `split`: broadcast every later item to all targets.
    fn spread(&self, targets: &[Queue<T>]) {
        loop {
            match self.recv(true) {
                Ok(Item::Value(value)) => {
                    for target in targets {
                        if target.push(value.clone()).is_err() {
                            tracing::warn!("split replica closed early, value dropped");
                        }
                    }
                }
                Ok(Item::Terminator) => break,
                Err(e) => {
                    tracing::trace!("split worker stopping: {}", e);
                    break;
                }
            }
        }
        for target in targets {
            let _ = target.terminate();
        }
    }
}

/// Blocking iterator returned by [`Queue::values`].
///
/// Ends at end-of-stream; a cancelled pipeline also ends the iteration.
pub struct Values<T> {
    queue: Queue<T>,
}

impl<T> Iterator for Values<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.queue.pop(true) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!("iteration stopped: {}", e);
                None
            }
        }
    }
}
