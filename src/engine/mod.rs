//! Execution engine.
//!
//! [`Runtime::start`] turns a [`Filter`] into a live worker tree: one thread
//! per evaluated node, connected by [`Channel`]s, returning the root's output
//! channel immediately. Nodes follow one of two contracts:
//!
//! - **generator**: the node only produces values; [`Runtime::run_generator`]
//!   relays namespaces and short-circuits on exceptions around it;
//! - **raw**: the node wires its own channels (name lookup, assignment,
//!   `;`, `$name`, identity, function calls).
//!
//! Every channel created here observes the runtime's [`CancelToken`]. Clones
//! share the token; [`Runtime::renewed`] starts over with a fresh one.

pub mod arith;
pub mod generator;
mod nodes;

pub use generator::Generator;

use crate::builtins::Builtins;
use crate::channel::{CancelToken, Channel};
use crate::command::{CommandRunner, SystemCommandRunner};
use crate::config::JqshConfig;
use crate::filter::Filter;
use crate::values::{Exception, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

struct Inner {
    builtins: Builtins,
    commands: Arc<dyn CommandRunner>,
    config: JqshConfig,
}

/// Shared evaluation context: builtins, cancellation, process runner and
/// configuration. Cheap to clone.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
    cancel: CancelToken,
}

impl Runtime {
    pub fn new(config: JqshConfig) -> Self {
        Self::with_parts(config, Builtins::standard(), Arc::new(SystemCommandRunner))
    }

    /// Runtime with a custom command runner.
    pub fn with_command_runner(config: JqshConfig, commands: Arc<dyn CommandRunner>) -> Self {
        Self::with_parts(config, Builtins::standard(), commands)
    }

    pub fn with_parts(
        config: JqshConfig,
        builtins: Builtins,
        commands: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                builtins,
                commands,
                config,
            }),
            cancel: CancelToken::new(),
        }
    }

    /// The same builtins, runner and config under a fresh cancellation
    /// token. Pipelines started by `self` are unaffected.
    pub fn renewed(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: CancelToken::new(),
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.inner.builtins
    }

    pub fn config(&self) -> &JqshConfig {
        &self.inner.config
    }

    pub fn commands(&self) -> &dyn CommandRunner {
        self.inner.commands.as_ref()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Abandon every pipeline started by this runtime.
    pub fn cancel(&self) {
        tracing::debug!("cancelling runtime");
        self.cancel.cancel();
    }

    /// A fresh open channel observing this runtime's cancellation.
    pub fn channel(&self) -> Channel {
        Channel::new(self.cancel.clone())
    }

    /// Start evaluating `filter` against `input` and return its output
    /// channel without waiting.
    pub fn start(&self, filter: &Arc<Filter>, input: Channel) -> Channel {
        let output = self.channel();
        let runtime = self.clone();
        let node = Arc::clone(filter);
        let out = output.clone();
        let spawned = self.spawn(filter.kind(), move || {
            tracing::debug!(node = node.kind(), "evaluating {}", node);
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                runtime.evaluate(&node, input, out.clone())
            }));
            if let Err(payload) = result {
                let message = generator::panic_message(payload.as_ref());
                tracing::warn!(node = node.kind(), "node panicked: {}", message);
                out.throw(Exception::internal(message));
            }
        });
        if spawned.is_none() {
            output.throw(Exception::internal("failed to spawn filter worker"));
        }
        output
    }

    /// Start `filter` with an empty, terminated input.
    pub fn start_empty(&self, filter: &Arc<Filter>) -> Channel {
        self.start(filter, Channel::terminated())
    }

    /// Evaluate `filter` for a name: names and string literals stand for
    /// themselves; anything else must produce exactly one string.
    pub fn sensible_string(&self, filter: &Arc<Filter>, input: Channel) -> Result<String, Exception> {
        match &**filter {
            Filter::Name(name) => return Ok(name.clone()),
            Filter::String(text) => return Ok(text.clone()),
            _ => {}
        }
        let output = self.start(filter, input);
        let first = output.pop(true).map_err(Exception::internal)?;
        match first {
            None => Err(Exception::sensible_string("filter produced no value")),
            Some(Value::Exception(e)) => Err(e),
            Some(Value::String(s)) => match output.pop(true).map_err(Exception::internal)? {
                None => Ok(s.text()),
                Some(_) => Err(Exception::sensible_string("filter produced more than one value")),
            },
            Some(other) => Err(Exception::sensible_string(&format!(
                "expected a string, got {}",
                other.kind().name()
            ))),
        }
    }

    /// Spawn a named worker thread. `None` if the OS refused.
    pub(crate) fn spawn<R, F>(&self, label: &str, body: F) -> Option<JoinHandle<R>>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let name = format!("{}-{}", self.inner.config.engine.thread_name_prefix, label);
        match std::thread::Builder::new().name(name).spawn(body) {
            Ok(handle) => {
                tracing::trace!(label, "spawned worker");
                Some(handle)
            }
            Err(e) => {
                tracing::error!(label, "failed to spawn worker: {}", e);
                None
            }
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(JqshConfig::default())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("builtins", &self.inner.builtins.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
