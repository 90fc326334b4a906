//! Bridge wiring for nodes that only produce values.
//!
//! ```text
//!            ┌──────── namespace relays (one per slot) ───────┐
//!            │                                                ▼
//! [input] ──►┼─► caller thread ─► [bridge] ─► generator ─► [output]
//!            │   (stops at an exception)      worker
//!            └───────────────────────────────► [bridge slots]
//! ```

use super::Runtime;
use crate::channel::{join_all, Channel, ChannelError, SlotKind};
use crate::error::JqshError;
use crate::values::{Exception, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Output of a value-producing node. Returning ends the stream; an `Err`
/// becomes an `internal` exception.
pub type Generator = Box<dyn Iterator<Item = Result<Value, JqshError>> + Send>;

/// A single-value generator.
pub fn once(value: impl Into<Value>) -> Generator {
    Box::new(std::iter::once(Ok(value.into())))
}

/// A generator that yields nothing.
pub fn nothing() -> Generator {
    Box::new(std::iter::empty())
}

/// Drain a channel as a generator.
pub fn drain(channel: Channel) -> Generator {
    Box::new(channel.values().map(Ok))
}

impl Runtime {
    /// Run `make`'s generator between `input` and `output`.
    ///
    /// Values flow from `input` through a private bridge into the generator;
    /// namespace slots are copied to both the bridge and `output`
    /// independently of value traffic. An exception on `input` stops the
    /// relay and is forwarded once, after whatever the generator produced.
    /// Faults and panics inside the generator become `internal` exceptions.
    /// `output` is terminated only after every helper has been joined.
    pub(crate) fn run_generator<F>(&self, input: Channel, output: Channel, make: F)
    where
        F: FnOnce(Channel) -> Generator + Send + 'static,
    {
        let bridge = Channel::new(self.cancel_token().clone());
        let relays = input.relay_namespaces(&[bridge.clone(), output.clone()], &SlotKind::ALL);

        let finished = Arc::new(AtomicBool::new(false));
        let worker = {
            let bridge = bridge.clone();
            let output = output.clone();
            let finished = Arc::clone(&finished);
            self.spawn("gen", move || {
                let raised = drive(make, bridge, &output);
                finished.store(true, Ordering::Release);
                raised
            })
        };

        let mut pending = None;
        loop {
            if finished.load(Ordering::Acquire) {
                break;
            }
            match input.pop(true) {
                Ok(Some(value)) if value.is_exception() => {
                    pending = Some(value);
                    break;
                }
                Ok(Some(value)) => bridge.emit(value),
                Ok(None) => break,
                Err(e) => {
                    tracing::trace!("input relay stopped: {}", e);
                    break;
                }
            }
        }
        bridge.close();

        let raised = match worker {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                output.emit(Value::Exception(Exception::internal("generator worker panicked")));
                true
            }),
            None => {
                output.emit(Value::Exception(Exception::internal("failed to spawn generator")));
                true
            }
        };
        if let Some(exception) = pending {
            if !raised {
                output.emit(exception);
            }
        }
        join_all(relays);
        output.namespaces().fill_defaults();
        output.close();
    }
}

/// Generator worker body. Returns whether it forwarded an exception.
fn drive<F>(make: F, bridge: Channel, output: &Channel) -> bool
where
    F: FnOnce(Channel) -> Generator,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        for item in make(bridge) {
            match item {
                Ok(value) => {
                    let stop = value.is_exception();
                    output.emit(value);
                    if stop {
                        return true;
                    }
                }
                Err(e) if e.is_cancelled() => return false,
                Err(e) => {
                    tracing::warn!("converting generator fault: {}", e);
                    output.emit(Value::Exception(Exception::internal(e)));
                    return true;
                }
            }
        }
        false
    }));
    outcome.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!("converting generator panic: {}", message);
        output.emit(Value::Exception(Exception::internal(message)));
        true
    })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in worker".to_string()
    }
}

/// `Err` for a cancelled channel operation, in generator form.
pub(crate) fn channel_fault(e: ChannelError) -> Generator {
    Box::new(std::iter::once(Err(JqshError::from(e))))
}
