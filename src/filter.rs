//! Filter AST.
//!
//! Nodes are immutable data. Behavior lives in [`crate::engine`], which
//! matches on the variant; children are shared through `Arc` so worker
//! threads can hold on to their subtree.
//!
//! The serde form is the interchange format between an external parser and
//! the `jqsh` binary.

use crate::values::quote;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One node of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Yields nothing.
    Empty,
    Parens(Arc<Filter>),
    /// Collects the attribute's output into one array.
    Array(Arc<Filter>),
    /// Collects `[key, value]` pairs into one object.
    Object(Arc<Filter>),
    Name(String),
    /// Decimal literal, kept as written.
    Number(String),
    String(String),
    Pipe(Arc<Filter>, Arc<Filter>),
    /// Dot/juxtaposition: identity, a split decimal, or a function call.
    Apply(Vec<Arc<Filter>>),
    Comma(Arc<Filter>, Arc<Filter>),
    Add(Arc<Filter>, Arc<Filter>),
    Multiply(Arc<Filter>, Arc<Filter>),
    Assign(Arc<Filter>, Arc<Filter>),
    Semicolon(Arc<Filter>, Arc<Filter>),
    Pair(Arc<Filter>, Arc<Filter>),
    /// `!name`: run an external command.
    Command(Arc<Filter>),
    /// `$name`
    GlobalVariable(Arc<Filter>),
}

impl Filter {
    pub fn name(name: impl Into<String>) -> Arc<Filter> {
        Arc::new(Filter::Name(name.into()))
    }

    pub fn number(literal: impl fmt::Display) -> Arc<Filter> {
        Arc::new(Filter::Number(literal.to_string()))
    }

    pub fn string(text: impl Into<String>) -> Arc<Filter> {
        Arc::new(Filter::String(text.into()))
    }

    pub fn empty() -> Arc<Filter> {
        Arc::new(Filter::Empty)
    }

    /// `.`
    pub fn identity() -> Arc<Filter> {
        Arc::new(Filter::Apply(Vec::new()))
    }

    pub fn apply(attributes: Vec<Arc<Filter>>) -> Arc<Filter> {
        Arc::new(Filter::Apply(attributes))
    }

    pub fn array(attribute: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Array(attribute))
    }

    pub fn object(attribute: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Object(attribute))
    }

    pub fn parens(attribute: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Parens(attribute))
    }

    pub fn pipe(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Pipe(left, right))
    }

    pub fn comma(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Comma(left, right))
    }

    pub fn add(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Add(left, right))
    }

    pub fn multiply(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Multiply(left, right))
    }

    pub fn assign(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Assign(left, right))
    }

    pub fn semicolon(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Semicolon(left, right))
    }

    pub fn pair(left: Arc<Filter>, right: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Pair(left, right))
    }

    pub fn command(attribute: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::Command(attribute))
    }

    pub fn global(attribute: Arc<Filter>) -> Arc<Filter> {
        Arc::new(Filter::GlobalVariable(attribute))
    }

    /// Short node label for thread names and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Filter::Empty => "empty",
            Filter::Parens(_) => "parens",
            Filter::Array(_) => "array",
            Filter::Object(_) => "object",
            Filter::Name(_) => "name",
            Filter::Number(_) => "number",
            Filter::String(_) => "string",
            Filter::Pipe(..) => "pipe",
            Filter::Apply(_) => "apply",
            Filter::Comma(..) => "comma",
            Filter::Add(..) => "add",
            Filter::Multiply(..) => "multiply",
            Filter::Assign(..) => "assign",
            Filter::Semicolon(..) => "semicolon",
            Filter::Pair(..) => "pair",
            Filter::Command(_) => "command",
            Filter::GlobalVariable(_) => "global",
        }
    }

    pub fn is_empty_filter(&self) -> bool {
        matches!(self, Filter::Empty)
    }

    /// `Apply` with no attributes, or only empty ones, is the identity.
    pub fn is_identity(&self) -> bool {
        match self {
            Filter::Apply(attributes) => attributes.iter().all(|a| a.is_empty_filter()),
            _ => false,
        }
    }
}

fn binary(f: &mut fmt::Formatter<'_>, left: &Filter, op: &str, right: &Filter) -> fmt::Result {
    write!(f, "{}{}{}", left, op, right)
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Empty => Ok(()),
            Filter::Parens(a) => write!(f, "({})", a),
            Filter::Array(a) => write!(f, "[{}]", a),
            Filter::Object(a) => write!(f, "{{{}}}", a),
            Filter::Name(name) => f.write_str(name),
            Filter::Number(text) => f.write_str(text),
            Filter::String(text) => f.write_str(&quote(text)),
            Filter::Pipe(l, r) => binary(f, l, " | ", r),
            Filter::Comma(l, r) => binary(f, l, ", ", r),
            Filter::Add(l, r) => binary(f, l, " + ", r),
            Filter::Multiply(l, r) => binary(f, l, " * ", r),
            Filter::Assign(l, r) => binary(f, l, " = ", r),
            Filter::Semicolon(l, r) => binary(f, l, "; ", r),
            Filter::Pair(l, r) => binary(f, l, ": ", r),
            Filter::Apply(attributes) => {
                if self.is_identity() {
                    return f.write_str(".");
                }
                if let [a, b] = attributes.as_slice() {
                    if matches!((&**a, &**b), (Filter::Number(_), Filter::Number(_))) {
                        return write!(f, "{}.{}", a, b);
                    }
                }
                let parts: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
            Filter::Command(a) => write!(f, "!{}", a),
            Filter::GlobalVariable(a) => write!(f, "${}", a),
        }
    }
}
