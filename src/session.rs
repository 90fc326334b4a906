//! Top-level driver.
//!
//! A [`Session`] runs one filter per turn. Each turn drains the root output
//! channel, then reads its final namespaces so the next turn starts with the
//! variables the previous one assigned (REPL continuation).
//!
//! Cancellation is per turn: once the current token has fired, the next turn
//! runs under a renewed runtime.

use crate::channel::{Channel, ChannelError, NamespaceSet};
use crate::config::JqshConfig;
use crate::context::FilterContext;
use crate::engine::Runtime;
use crate::error::Result;
use crate::filter::Filter;
use crate::values::Value;
use std::sync::Arc;

/// Values and namespaces produced by one turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub values: Vec<Value>,
    pub namespaces: NamespaceSet,
}

impl TurnOutput {
    /// Whether the turn ended with an uncaught exception.
    pub fn raised(&self) -> bool {
        self.values.iter().any(Value::is_exception)
    }
}

pub struct Session {
    runtime: Runtime,
    namespaces: NamespaceSet,
}

impl Session {
    pub fn new(config: JqshConfig) -> Self {
        Self::with_runtime(Runtime::new(config))
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        Self {
            runtime,
            namespaces: NamespaceSet::default(),
        }
    }

    /// Set the execution context seen by subsequent turns.
    pub fn with_context(mut self, context: FilterContext) -> Self {
        self.namespaces.context = Arc::new(context);
        self
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Scope carried into the next turn.
    pub fn namespaces(&self) -> &NamespaceSet {
        &self.namespaces
    }

    /// Run `filter` over `input` and wait for it to finish. Fails with
    /// [`ChannelError::Cancelled`] if the turn was cancelled; the scope is
    /// then left as it was.
    pub fn run(&mut self, filter: &Arc<Filter>, input: Vec<Value>) -> Result<TurnOutput> {
        let output = self.start(filter, input);
        let values: Vec<Value> = output.values().collect();
        if output.cancel_token().is_cancelled() {
            tracing::debug!("turn cancelled");
            return Err(ChannelError::Cancelled.into());
        }
        let namespaces = output.namespace_set()?;
        self.namespaces = namespaces.clone();
        tracing::debug!(
            values = values.len(),
            globals = namespaces.globals.len(),
            locals = namespaces.locals.len(),
            "turn finished"
        );
        Ok(TurnOutput { values, namespaces })
    }

    /// Start `filter` over `input` seeded with the carried scope. The caller
    /// drains the returned channel.
    pub fn start(&mut self, filter: &Arc<Filter>, input: Vec<Value>) -> Channel {
        if self.runtime.cancel_token().is_cancelled() {
            self.runtime = self.runtime.renewed();
        }
        let seeded = Channel::with_namespaces(input, self.namespaces.clone());
        self.runtime.start(filter, seeded)
    }

    /// Abandon the running turn, if any.
    pub fn cancel(&self) {
        self.runtime.cancel();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(JqshConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_carries_to_next_turn() {
        let mut session = Session::default();
        let assign = Filter::assign(Filter::name("x"), Filter::number(5));
        let first = session.run(&assign, vec![Value::from(1)]).unwrap();
        assert_eq!(first.values, vec![Value::from(1)]);
        assert!(session.namespaces().locals.contains("x"));

        let second = session.run(&Filter::name("x"), Vec::new()).unwrap();
        assert_eq!(second.values, vec![Value::from(5)]);
    }

    #[test]
    fn test_context_is_visible_in_namespaces() {
        let mut session =
            Session::default().with_context(FilterContext::command_line(["a", "b"]));
        let out = session.run(&Filter::identity(), Vec::new()).unwrap();
        assert_eq!(out.namespaces.context.argv, vec!["a", "b"]);
        assert!(!out.raised());
    }

    #[test]
    fn test_turn_after_cancel_runs() {
        let mut session = Session::default();
        session.cancel();
        let out = session.run(&Filter::number(1), Vec::new()).unwrap();
        assert_eq!(out.values, vec![Value::from(1)]);
        assert!(!session.runtime().cancel_token().is_cancelled());
    }

    #[test]
    fn test_raised_turn() {
        let mut session = Session::default();
        let out = session.run(&Filter::name("nope"), Vec::new()).unwrap();
        assert!(out.raised());
    }
}
