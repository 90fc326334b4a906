//! Per-node evaluation.

use super::arith::{self, Outcome};
use super::generator::{drain, nothing, once, Generator};
use super::Runtime;
use crate::channel::{join_all, Channel, SlotKind};
use crate::command::{decode_output, encode_input, launch_error};
use crate::error::JqshError;
use crate::filter::Filter;
use crate::values::{Exception, JqArray, Value};
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

impl Runtime {
    /// Evaluate `filter`, reading `input` and writing (then terminating)
    /// `output`.
    pub(crate) fn evaluate(&self, filter: &Arc<Filter>, input: Channel, output: Channel) {
        match &**filter {
            Filter::Name(name) => self.eval_name(name, input, output),
            Filter::Apply(_) if filter.is_identity() => self.eval_identity(input, output),
            Filter::Apply(attributes) if split_decimal(attributes).is_none() => {
                self.eval_call(attributes, input, output)
            }
            Filter::Assign(left, right) => self.eval_assign(left, right, input, output),
            Filter::Semicolon(left, right) => self.eval_semicolon(left, right, input, output),
            Filter::GlobalVariable(attribute) => self.eval_global(attribute, input, output),
            _ => {
                let runtime = self.clone();
                let node = Arc::clone(filter);
                self.run_generator(input, output, move |bridge| runtime.generate(&node, bridge));
            }
        }
    }

    /// Forward namespaces from `input`, push `exception`, terminate.
    pub(crate) fn raise(&self, input: &Channel, output: Channel, exception: Exception) {
        tracing::debug!(exception = exception.name(), "raising");
        let relays = input.relay_namespaces(&[output.clone()], &SlotKind::ALL);
        output.emit(Value::Exception(exception));
        join_all(relays);
        output.close();
    }

    // ── Raw nodes ──

    fn eval_identity(&self, input: Channel, output: Channel) {
        let relays = input.relay_namespaces(&[output.clone()], &SlotKind::ALL);
        if let Err(e) = output.pull_until_exception(&input, false) {
            tracing::trace!("identity pull stopped: {}", e);
        }
        join_all(relays);
        output.close();
    }

    fn eval_name(&self, name: &str, input: Channel, output: Channel) {
        let locals = match input.locals() {
            Ok(locals) => locals,
            Err(e) => return output.throw(Exception::internal(e)),
        };
        if let Some(values) = locals.get(name) {
            tracing::debug!(name, count = values.len(), "replaying local");
            let relays = input.relay_namespaces(&[output.clone()], &SlotKind::ALL);
            for value in values.iter() {
                output.emit(value.clone());
            }
            forward_exception(&input, &output);
            join_all(relays);
            output.close();
            return;
        }
        match self.builtins().lookup(name, 0) {
            Ok(builtin) => {
                tracing::debug!(name, "calling builtin");
                let runtime = self.clone();
                self.run_generator(input, output, move |bridge| builtin(&runtime, &[], bridge));
            }
            Err(exception) => self.raise(&input, output, exception),
        }
    }

    fn eval_call(&self, attributes: &[Arc<Filter>], input: Channel, output: Channel) {
        let Some((head, args)) = attributes.split_first() else {
            return self.eval_identity(input, output);
        };
        let (call_input, name) = if is_literal_name(head) {
            let name = self.sensible_string(head, Channel::terminated());
            (input, name)
        } else {
            let (call_input, name_input) = input.split2();
            let name = self.sensible_string(head, name_input);
            (call_input, name)
        };
        let name = match name {
            Ok(name) => name,
            Err(exception) => return self.raise(&call_input, output, exception),
        };
        match self.builtins().lookup(&name, args.len()) {
            Ok(builtin) => {
                tracing::debug!(name = %name, arity = args.len(), "calling builtin");
                let runtime = self.clone();
                let args = args.to_vec();
                self.run_generator(call_input, output, move |bridge| {
                    builtin(&runtime, &args, bridge)
                });
            }
            Err(exception) => self.raise(&call_input, output, exception),
        }
    }

    fn eval_assign(&self, left: &Arc<Filter>, right: &Arc<Filter>, input: Channel, output: Channel) {
        let (pass, source) = input.split2();
        let stored: Vec<Value> = self.start(right, source).values().collect();
        if let Some(exception) = stored.iter().find_map(Value::as_exception) {
            return self.raise(&pass, output, exception.clone());
        }
        match &**left {
            Filter::Name(name) => self.bind(pass, output, SlotKind::Locals, name, stored),
            Filter::GlobalVariable(attribute) => match self.name_in_scope(attribute, &pass) {
                Ok(name) => self.bind(pass, output, SlotKind::Globals, &name, stored),
                Err(exception) => self.raise(&pass, output, exception),
            },
            other => {
                let exception = Exception::assignment(other.kind(), &other.to_string());
                self.raise(&pass, output, exception)
            }
        }
    }

    /// Forward `pass` to `output` with `name` bound in the `kind` scope.
    fn bind(&self, pass: Channel, output: Channel, kind: SlotKind, name: &str, values: Vec<Value>) {
        let others: Vec<SlotKind> = SlotKind::ALL.into_iter().filter(|k| *k != kind).collect();
        let relays = pass.relay_namespaces(&[output.clone()], &others);
        let published = match kind {
            SlotKind::Globals => pass
                .globals()
                .and_then(|scope| output.namespaces().set_globals(scope.bind(name, values))),
            _ => pass
                .locals()
                .and_then(|scope| output.namespaces().set_locals(scope.bind(name, values))),
        };
        if let Err(e) = published {
            tracing::warn!(name, "binding not published: {}", e);
        }
        if let Err(e) = output.pull_until_exception(&pass, false) {
            tracing::trace!("assignment pass-through stopped: {}", e);
        }
        join_all(relays);
        output.namespaces().fill_defaults();
        output.close();
    }

    fn eval_semicolon(&self, left: &Arc<Filter>, right: &Arc<Filter>, input: Channel, output: Channel) {
        let (left_input, right_input) = input.split2();
        let left_output = self.start(left, left_input);
        if let Some(exception) = left_output.values().find(Value::is_exception) {
            let relays = left_output.relay_namespaces(&[output.clone()], &SlotKind::ALL);
            output.emit(exception);
            join_all(relays);
            return output.close();
        }

        // Left's scopes, right's format strings and context.
        let carried = self.channel();
        let inherited = right_input.relay_namespaces(
            &[carried.clone()],
            &[SlotKind::FormatStrings, SlotKind::Context],
        );
        let scopes = left_output.globals().and_then(|globals| {
            carried.namespaces().set_globals(globals)?;
            carried.namespaces().set_locals(left_output.locals()?)
        });
        if let Err(e) = scopes {
            tracing::warn!("left scope not carried: {}", e);
        }

        let right_output = self.start(right, carried.clone());
        let relays = right_output.relay_namespaces(&[output.clone()], &SlotKind::ALL);
        if let Err(e) = carried.pull(&right_input, true) {
            tracing::trace!("semicolon input relay stopped: {}", e);
            carried.close();
        }
        join_all(inherited);
        carried.namespaces().fill_defaults();
        if let Err(e) = output.pull(&right_output, false) {
            tracing::trace!("semicolon output relay stopped: {}", e);
        }
        join_all(relays);
        output.close();
    }

    fn eval_global(&self, attribute: &Arc<Filter>, input: Channel, output: Channel) {
        let relays = input.relay_namespaces(&[output.clone()], &SlotKind::ALL);
        let literal = is_literal_name(attribute);
        let name = if literal {
            self.sensible_string(attribute, Channel::terminated())
        } else {
            self.sensible_string(attribute, input.clone())
        };
        match name {
            Ok(name) => match input.globals() {
                Ok(globals) => match globals.get(&name) {
                    Some(values) => {
                        for value in values.iter() {
                            output.emit(value.clone());
                        }
                    }
                    None => output.emit(Value::Exception(Exception::undefined_name(&name))),
                },
                Err(e) => output.emit(Value::Exception(Exception::internal(e))),
            },
            Err(exception) => output.emit(Value::Exception(exception)),
        }
        // A computed name already consumed the input.
        if literal {
            forward_exception(&input, &output);
        }
        join_all(relays);
        output.close();
    }

    /// Resolve a variable name, evaluating non-literal filters against an
    /// empty input that carries `scope_source`'s namespaces.
    fn name_in_scope(&self, filter: &Arc<Filter>, scope_source: &Channel) -> Result<String, Exception> {
        if is_literal_name(filter) {
            return self.sensible_string(filter, Channel::terminated());
        }
        let namespaces = scope_source.namespace_set().map_err(Exception::internal)?;
        self.sensible_string(filter, Channel::with_namespaces(Vec::new(), namespaces))
    }

    // ── Generator nodes ──

    fn generate(&self, filter: &Arc<Filter>, bridge: Channel) -> Generator {
        match &**filter {
            Filter::Empty => nothing(),
            Filter::Parens(attribute) => drain(self.start(attribute, bridge)),
            Filter::Array(attribute) => {
                let elements = self.start(attribute, bridge);
                once(Value::Array(JqArray::from_queue(elements.queue().clone())))
            }
            Filter::Object(attribute) => self.object_literal(attribute, bridge),
            Filter::Number(text) => number_literal(text),
            Filter::String(text) => once(Value::from(text.as_str())),
            Filter::Pipe(left, right) => drain(self.start(right, self.start(left, bridge))),
            Filter::Comma(left, right) => {
                let (left_input, right_input) = bridge.split2();
                let right_output = self.start(right, right_input);
                let left_output = self.start(left, left_input);
                Box::new(left_output.values().chain(right_output.values()).map(Ok))
            }
            Filter::Add(left, right) => self.binary(left, right, bridge, arith::add),
            Filter::Multiply(left, right) => self.binary(left, right, bridge, arith::multiply),
            Filter::Pair(left, right) => self.binary(left, right, bridge, arith::pair),
            Filter::Command(attribute) => self.command(attribute, bridge),
            Filter::Apply(attributes) => match split_decimal(attributes) {
                Some(text) => number_literal(&text),
                None => internal_fault(filter),
            },
            Filter::Name(_) | Filter::Assign(..) | Filter::Semicolon(..) | Filter::GlobalVariable(_) => {
                internal_fault(filter)
            }
        }
    }

    fn binary(
        &self,
        left: &Arc<Filter>,
        right: &Arc<Filter>,
        bridge: Channel,
        op: fn(&Value, &Value) -> Outcome,
    ) -> Generator {
        let (left_input, right_input) = bridge.split2();
        let left_output = self.start(left, left_input);
        let right_output = self.start(right, right_input);
        let left_values = match collect_until_exception(&left_output) {
            Ok(values) => values,
            Err(exception) => return once(exception),
        };
        let right_values = match collect_until_exception(&right_output) {
            Ok(values) => values,
            Err(exception) => return once(exception),
        };
        Box::new(
            arith::pairwise(left_values, right_values, op)
                .into_iter()
                .map(Ok),
        )
    }

    fn object_literal(&self, attribute: &Arc<Filter>, bridge: Channel) -> Generator {
        let mut entries = Vec::new();
        for value in self.start(attribute, bridge).values() {
            if value.is_exception() {
                return once(value);
            }
            match entry_of(&value) {
                Some(entry) => entries.push(entry),
                None => return once(Exception::type_error()),
            }
        }
        once(Value::object(entries))
    }

    fn command(&self, attribute: &Arc<Filter>, bridge: Channel) -> Generator {
        let (values_input, name_input) = bridge.split2();
        let program = match self.sensible_string(attribute, name_input) {
            Ok(program) => program,
            Err(exception) => return once(exception),
        };
        let values: Vec<Value> = values_input.values().collect();
        let settings = &self.config().command;
        let stdin = match encode_input(&values, settings) {
            Ok(bytes) => bytes,
            Err(exception) => return once(exception),
        };
        tracing::debug!(program = %program, values = values.len(), "running command");
        match self.commands().run(&program, &stdin) {
            Err(e) => once(launch_error(&program, &e)),
            Ok(bytes) => match decode_output(&bytes, settings) {
                Ok(values) => Box::new(values.into_iter().map(Ok)),
                Err(exception) => once(exception),
            },
        }
    }
}

/// Nodes that replay stored values ignore plain input but still forward the
/// first input exception, after their own output.
fn forward_exception(input: &Channel, output: &Channel) {
    match input.next_exception() {
        Ok(Some(exception)) => output.emit(exception),
        Ok(None) => {}
        Err(e) => tracing::trace!("input scan stopped: {}", e),
    }
}

fn is_literal_name(filter: &Filter) -> bool {
    matches!(filter, Filter::Name(_) | Filter::String(_))
}

/// `1.5` arrives as `Apply(Number(1), Number(5))`.
fn split_decimal(attributes: &[Arc<Filter>]) -> Option<String> {
    match attributes {
        [a, b] => match (&**a, &**b) {
            (Filter::Number(whole), Filter::Number(fraction)) => {
                Some(format!("{}.{}", whole, fraction))
            }
            _ => None,
        },
        _ => None,
    }
}

fn number_literal(text: &str) -> Generator {
    match BigDecimal::from_str(text) {
        Ok(n) => once(Value::Number(n)),
        Err(e) => Box::new(std::iter::once(Err(JqshError::Internal(format!(
            "invalid number literal {}: {}",
            text, e
        ))))),
    }
}

fn internal_fault(filter: &Filter) -> Generator {
    Box::new(std::iter::once(Err(JqshError::Internal(format!(
        "{} node has no generator form",
        filter.kind()
    )))))
}

/// All values of `channel`, or the first exception among them.
fn collect_until_exception(channel: &Channel) -> Result<Vec<Value>, Exception> {
    let mut values = Vec::new();
    for value in channel.values() {
        match value {
            Value::Exception(e) => return Err(e),
            other => values.push(other),
        }
    }
    Ok(values)
}

/// `[key, value]` with a string key.
fn entry_of(value: &Value) -> Option<(String, Value)> {
    let Value::Array(pair) = value else {
        return None;
    };
    let items = pair.items();
    match items.as_slice() {
        [key, item] => Some((key.as_text()?, item.clone())),
        _ => None,
    }
}
