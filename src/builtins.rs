//! Builtin function table.
//!
//! Built once per [`Runtime`] and never mutated afterwards. Each entry is a
//! generator: it reads the bridge channel handed to it by the engine and
//! yields output values.

use crate::channel::{Channel, Values};
use crate::engine::generator::{channel_fault, drain, nothing, once, Generator};
use crate::engine::Runtime;
use crate::filter::Filter;
use crate::values::{Exception, Value};
use bigdecimal::BigDecimal;
use num_traits::{Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A builtin: runtime, filter arguments, input bridge.
pub type BuiltinFn = fn(&Runtime, &[Arc<Filter>], Channel) -> Generator;

/// Immutable `(name, arity) → implementation` table.
#[derive(Clone, Default)]
pub struct Builtins {
    table: BTreeMap<String, BTreeMap<usize, BuiltinFn>>,
}

impl Builtins {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard library.
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        builtins.register("each", 1, each);
        builtins.register("empty", 0, |_, _, _| nothing());
        builtins.register("false", 0, |_, _, _| once(false));
        builtins.register("for", 2, jqsh_for);
        builtins.register("implode", 0, implode);
        builtins.register("nth", 1, nth);
        builtins.register("null", 0, |_, _, _| once(Value::Null));
        builtins.register("range", 0, range);
        builtins.register("reduce", 2, reduce);
        builtins.register("true", 0, |_, _, _| once(true));
        builtins
    }

    pub fn register(&mut self, name: &str, arity: usize, function: BuiltinFn) {
        self.table
            .entry(name.to_string())
            .or_default()
            .insert(arity, function);
    }

    /// Resolve `name` called with `arity` arguments.
    pub fn lookup(&self, name: &str, arity: usize) -> Result<BuiltinFn, Exception> {
        let arities = self
            .table
            .get(name)
            .ok_or_else(|| Exception::undefined_name(name))?;
        arities
            .get(&arity)
            .copied()
            .ok_or_else(|| Exception::num_args(arities.keys().copied(), arity))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Number of `(name, arity)` entries.
    pub fn len(&self) -> usize {
        self.table.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

/// Integer value of `value`, or the exception to raise.
fn integer_of(value: &Value) -> Result<&BigDecimal, Exception> {
    let n = value.as_number().ok_or_else(Exception::type_error)?;
    if n.is_integer() {
        Ok(n)
    } else {
        Err(Exception::integer())
    }
}

/// `each(f)`: run `f` once per input value, in the caller's scope.
fn each(runtime: &Runtime, args: &[Arc<Filter>], input: Channel) -> Generator {
    let namespaces = match input.namespace_set() {
        Ok(namespaces) => namespaces,
        Err(e) => return channel_fault(e),
    };
    let runtime = runtime.clone();
    let body = Arc::clone(&args[0]);
    Box::new(
        input
            .values()
            .flat_map(move |value| {
                let single = Channel::with_namespaces(vec![value], namespaces.clone());
                runtime.start(&body, single).values()
            })
            .map(Ok),
    )
}

/// `nth(i)`: the input value at index `i`.
fn nth(runtime: &Runtime, args: &[Arc<Filter>], input: Channel) -> Generator {
    let (values, index_input) = input.split2();
    let index_output = runtime.start(&args[0], index_input);
    let index = match index_output.pop(true) {
        Ok(Some(index)) => index,
        Ok(None) => return once(Exception::new("empty")),
        Err(e) => return channel_fault(e),
    };
    if index.is_exception() {
        return once(index);
    }
    let skip = match integer_of(&index) {
        Ok(n) if n.is_negative() => return once(Exception::new("numValues")),
        Ok(n) => match n.to_usize() {
            Some(skip) => skip,
            None => return once(Exception::new("numValues")),
        },
        Err(exception) => return once(exception),
    };
    match values.values().nth(skip) {
        Some(value) => once(value),
        None => once(Exception::new("numValues")),
    }
}

/// `range`: `0, 1, …, n-1` for every input `n`.
fn range(_: &Runtime, _: &[Arc<Filter>], input: Channel) -> Generator {
    Box::new(input.values().flat_map(|value| {
        let upper = match integer_of(&value) {
            Ok(n) => n.clone(),
            Err(exception) => {
                return Box::new(std::iter::once(Ok(Value::Exception(exception)))) as Generator
            }
        };
        let mut next = BigDecimal::zero();
        Box::new(std::iter::from_fn(move || {
            if next >= upper {
                return None;
            }
            let current = next.clone();
            next += BigDecimal::from(1);
            Some(Ok(Value::Number(current)))
        })) as Generator
    }))
}

/// `implode`: code points to one string.
fn implode(_: &Runtime, _: &[Arc<Filter>], input: Channel) -> Generator {
    let mut text = String::new();
    for value in input.values() {
        let code = match integer_of(&value) {
            Ok(n) => n,
            Err(exception) => return once(exception),
        };
        match code.to_u32().and_then(char::from_u32) {
            Some(c) => text.push(c),
            None => return once(Exception::new("unicode")),
        }
    }
    once(text)
}

/// `reduce(init, body)`: thread `init`'s output through `body` once per
/// input value; yield the final output.
fn reduce(runtime: &Runtime, args: &[Arc<Filter>], input: Channel) -> Generator {
    let (values, init_input) = input.split2();
    let mut state = runtime.start(&args[0], init_input);
    for _ in values.values() {
        state = runtime.start(&args[1], state);
    }
    drain(state)
}

/// `for(init, body)`: like `reduce`, yielding every intermediate output.
fn jqsh_for(runtime: &Runtime, args: &[Arc<Filter>], input: Channel) -> Generator {
    let (values, init_input) = input.split2();
    Box::new(
        ForSteps {
            runtime: runtime.clone(),
            body: Arc::clone(&args[1]),
            inputs: values.values(),
            state: runtime.start(&args[0], init_input),
            current: None,
        }
        .map(Ok),
    )
}

struct ForSteps {
    runtime: Runtime,
    body: Arc<Filter>,
    inputs: Values<Value>,
    state: Channel,
    current: Option<Values<Value>>,
}

impl Iterator for ForSteps {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(value) = current.next() {
                    return Some(value);
                }
                self.current = None;
            }
            self.inputs.next()?;
            let stepped = self.runtime.start(&self.body, self.state.clone());
            let (state, shown) = stepped.split2();
            self.state = state;
            self.current = Some(shown.values());
        }
    }
}
