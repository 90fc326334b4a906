//! Terminable value channels with attached namespace slots.
//!
//! A [`Channel`] is one pipeline edge: a [`Queue`] of values plus the four
//! [`Namespaces`] slots. Handles are cheap to clone; by convention one worker
//! produces into a channel and one worker consumes it. Fan-out is explicit via
//! [`Channel::split`].
//!
//! # Architecture
//!
//! ```text
//!              ┌─────────── values ───────────┐
//! [producer] ──┤                              ├──► [consumer]
//!              └── globals/locals/fmt/ctx ────┘
//!                  (one relay thread per slot)
//! ```

pub mod cancel;
pub mod error;
pub mod namespace;
pub mod queue;
pub mod slot;

pub use cancel::CancelToken;
pub use error::{ChannelError, ChannelResult};
pub use namespace::{FormatStrings, NamespaceSet, Namespaces, Scope, SlotKind};
pub use queue::{Queue, Values};
pub use slot::Slot;

use crate::context::FilterContext;
use crate::values::{Exception, Value};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One pipeline edge: values plus namespace slots.
#[derive(Clone)]
pub struct Channel {
    queue: Queue<Value>,
    namespaces: Arc<Namespaces>,
}

impl Channel {
    /// Open channel with unset namespaces, observing `cancel`.
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            queue: Queue::new(cancel),
            namespaces: Arc::new(Namespaces::new()),
        }
    }

    /// Already-terminated, empty channel with empty namespaces.
    pub fn terminated() -> Self {
        Self::from_values(Vec::new())
    }

    /// Already-terminated channel holding `values`, with empty namespaces.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::with_namespaces(values, NamespaceSet::default())
    }

    /// Already-terminated channel holding `values` with the given namespaces.
    /// Used to seed a REPL turn with the previous turn's scope.
    pub fn with_namespaces(values: impl IntoIterator<Item = Value>, set: NamespaceSet) -> Self {
        Self {
            queue: Queue::from_values(values),
            namespaces: Arc::new(Namespaces::from_set(set)),
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        self.queue.cancel_token()
    }

    pub fn queue(&self) -> &Queue<Value> {
        &self.queue
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    // ── Values ──

    pub fn push(&self, value: Value) -> ChannelResult<()> {
        self.queue.push(value)
    }

    pub fn pop(&self, block: bool) -> ChannelResult<Option<Value>> {
        self.queue.pop(block)
    }

    pub fn terminate(&self) -> ChannelResult<()> {
        self.queue.terminate()
    }

    pub fn is_terminated(&self) -> bool {
        self.queue.is_terminated()
    }

    /// Move all remaining values of `from` here, then optionally terminate.
    pub fn pull(&self, from: &Channel, terminate: bool) -> ChannelResult<()> {
        self.queue.pull(&from.queue, terminate)
    }

    /// Pull like [`pull`](Self::pull), stopping after the first exception.
    /// Returns whether one was moved.
    pub fn pull_until_exception(&self, from: &Channel, terminate: bool) -> ChannelResult<bool> {
        self.queue.pull_until(&from.queue, Value::is_exception, terminate)
    }

    /// Pop until the first exception or the end of the stream, discarding
    /// plain values.
    pub fn next_exception(&self) -> ChannelResult<Option<Value>> {
        while let Some(value) = self.queue.pop(true)? {
            if value.is_exception() {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Blocking iterator over the remaining values.
    pub fn values(&self) -> Values<Value> {
        self.queue.values()
    }

    /// Push `value`, logging instead of failing if the channel already closed.
    pub fn emit(&self, value: Value) {
        if let Err(e) = self.queue.push(value) {
            tracing::warn!("dropped value on closed channel: {}", e);
        }
    }

    /// Terminate, tolerating a channel that is already closed.
    pub fn close(&self) {
        if self.queue.terminate().is_err() {
            tracing::trace!("channel already terminated");
        }
    }

    /// Push an exception (if still open), publish defaults into unset slots,
    /// and terminate. Leaves the channel fully usable for a downstream reader.
    pub fn throw(&self, exception: Exception) {
        let _ = self.queue.push(Value::Exception(exception));
        self.namespaces.fill_defaults();
        self.close();
    }

    // ── Namespaces ──

    pub fn globals(&self) -> ChannelResult<Scope> {
        self.namespaces.globals(self.cancel_token())
    }

    pub fn locals(&self) -> ChannelResult<Scope> {
        self.namespaces.locals(self.cancel_token())
    }

    pub fn format_strings(&self) -> ChannelResult<FormatStrings> {
        self.namespaces.format_strings(self.cancel_token())
    }

    pub fn context(&self) -> ChannelResult<Arc<FilterContext>> {
        self.namespaces.context(self.cancel_token())
    }

    /// Block until every slot is published.
    pub fn namespace_set(&self) -> ChannelResult<NamespaceSet> {
        self.namespaces.snapshot(self.cancel_token())
    }

    /// Start one relay worker per slot in `kinds`, copying this channel's
    /// slot values to every target. The caller joins the handles.
    pub fn relay_namespaces(&self, targets: &[Channel], kinds: &[SlotKind]) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let source = self.clone();
            let targets: Vec<Channel> = targets.to_vec();
            let spawned = std::thread::Builder::new()
                .name(format!("jqsh-ns-{}", kind.name()))
                .spawn(move || {
                    let sinks: Vec<&Namespaces> = targets.iter().map(|t| t.namespaces()).collect();
                    if let Err(e) = source
                        .namespaces
                        .relay(kind, &sinks, source.cancel_token())
                    {
                        tracing::trace!(slot = kind.name(), "relay stopped: {}", e);
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!(slot = kind.name(), "failed to spawn relay: {}", e),
            }
        }
        handles
    }

    /// Relay every slot to `targets` and wait for all of them.
    pub fn copy_namespaces_to(&self, targets: &[Channel]) {
        join_all(self.relay_namespaces(targets, &SlotKind::ALL));
    }

    // ── Split ──

    /// Replicate this channel into `n` channels.
    ///
    /// Every replica sees the same values in the same order: first everything
    /// buffered but unread, then everything pushed later. One background worker
    /// forwards values; another broadcasts the namespace slots independently,
    /// so a replica can learn its scope before any value arrives. After the
    /// split the original reads as terminated.
    pub fn split(&self, n: usize) -> Vec<Channel> {
        let replicas: Vec<Channel> = self
            .queue
            .split(n)
            .into_iter()
            .map(|queue| Channel {
                queue,
                namespaces: Arc::new(Namespaces::new()),
            })
            .collect();

        let source = self.clone();
        let targets = replicas.clone();
        let spawned = std::thread::Builder::new()
            .name("jqsh-split-ns".to_string())
            .spawn(move || source.copy_namespaces_to(&targets));
        if let Err(e) = spawned {
            tracing::error!("failed to spawn namespace broadcaster: {}", e);
            for replica in &replicas {
                replica.namespaces.fill_defaults();
            }
        }
        replicas
    }

    /// Split into exactly two replicas.
    pub fn split2(&self) -> (Channel, Channel) {
        let mut replicas = self.split(2).into_iter();
        match (replicas.next(), replicas.next()) {
            (Some(a), Some(b)) => (a, b),
            // `split(2)` always yields two replicas.
            _ => unreachable!("split(2) returned fewer than two channels"),
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("input_closed", &self.queue.is_input_closed())
            .field("terminated", &self.queue.is_terminated())
            .finish()
    }
}

/// Join worker handles, logging any that panicked.
pub fn join_all(handles: impl IntoIterator<Item = JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            tracing::warn!("worker thread panicked");
        }
    }
}
