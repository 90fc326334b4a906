//! Pipeline-wide cancellation.
//!
//! A `CancelToken` is shared by every channel a pipeline creates. Firing it
//! wakes every thread blocked in `pop`, `pull` or a namespace slot read, which
//! then observe [`ChannelError::Cancelled`](super::ChannelError::Cancelled).

use crossbeam_channel::{bounded, never, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation handle.
///
/// The wake-up mechanism is a zero-capacity channel that never carries a
/// message: cancelling drops its only sender, so every `select!` waiting on
/// the receiver returns immediately.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    detached: bool,
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl CancelToken {
    /// A token that can be fired with [`cancel`](Self::cancel).
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            detached: false,
            sender: Arc::new(Mutex::new(Some(tx))),
            receiver: rx,
        }
    }

    /// A token that never fires; `cancel` on it is a no-op. Used for
    /// standalone values and channels that do not belong to a pipeline.
    pub fn never() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            detached: true,
            sender: Arc::new(Mutex::new(None)),
            receiver: never(),
        }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        if self.detached {
            return;
        }
        if !self.flag.swap(true, Ordering::SeqCst) {
            tracing::debug!("pipeline cancelled");
        }
        self.sender.lock().take();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Receiver that becomes ready (disconnected) once the token fires.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
