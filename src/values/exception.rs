//! Exception values: named, data-carrying errors that travel through channels
//! like any other value.

use super::Value;
use bigdecimal::BigDecimal;
use std::collections::BTreeMap;
use std::fmt;

/// A typed exception value. Two exceptions are equal when their names are;
/// auxiliary fields are diagnostic only.
#[derive(Clone)]
pub struct Exception {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl Exception {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::String(s) => Some(s.text()),
            other => Some(other.to_string()),
        }
    }

    // ── Well-known kinds ──

    /// Unknown variable or function.
    pub fn undefined_name(missing: &str) -> Self {
        Self::new("name").with_field("missing_name", Value::from(missing))
    }

    /// Known function called with an unsupported number of arguments.
    pub fn num_args(expected: impl IntoIterator<Item = usize>, received: usize) -> Self {
        let expected = expected
            .into_iter()
            .map(|n| Value::Number(BigDecimal::from(n as u64)))
            .collect::<Vec<_>>();
        Self::new("numArgs")
            .with_field("expected", Value::array(expected))
            .with_field("received", Value::Number(BigDecimal::from(received as u64)))
    }

    pub fn type_error() -> Self {
        Self::new("type")
    }

    pub fn integer() -> Self {
        Self::new("integer")
    }

    /// Assignment to a filter that cannot be assigned to.
    pub fn assignment(target_kind: &str, target_filter: &str) -> Self {
        Self::new("assignment")
            .with_field("target_kind", Value::from(target_kind))
            .with_field("target_filter", Value::from(target_filter))
    }

    pub fn path(command: &str) -> Self {
        Self::new("path").with_field("command", Value::from(command))
    }

    pub fn permission(command: &str) -> Self {
        Self::new("permission").with_field("command", Value::from(command))
    }

    pub fn command_output(detail: &str) -> Self {
        Self::new("commandOutput").with_field("detail", Value::from(detail))
    }

    /// A defect inside the engine, with diagnostic text.
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::new("internal").with_field("message", Value::from(message.to_string().as_str()))
    }

    /// A result sequence too long to build.
    pub fn size(length: usize, times: usize) -> Self {
        Self::new("size")
            .with_field("length", Value::Number(BigDecimal::from(length as u64)))
            .with_field("times", Value::Number(BigDecimal::from(times as u64)))
    }

    pub fn sensible_string(reason: &str) -> Self {
        Self::new("sensibleString").with_field("reason", Value::from(reason))
    }

    /// Lines shown to the user for an uncaught exception.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("jqsh: uncaught exception: {}", self.name)];
        match self.name.as_str() {
            "name" => {
                if let Some(missing) = self.text_field("missing_name") {
                    lines.push(format!("name {} is not defined", missing));
                }
            }
            "numArgs" => {
                if let (Some(Value::Array(expected)), Some(received)) =
                    (self.field("expected"), self.text_field("received"))
                {
                    let expected: Vec<String> =
                        expected.items().iter().map(|v| v.to_string()).collect();
                    let any_of = if expected.len() > 1 { "any of " } else { "" };
                    lines.push(format!(
                        "wrong number of function arguments: received {}, expected {}{}",
                        received,
                        any_of,
                        expected.join(", ")
                    ));
                }
            }
            "assignment" => {
                if let Some(kind) = self.text_field("target_kind") {
                    lines.push(format!("cannot assign to filter of type {}", kind));
                }
            }
            "internal" => {
                if let Some(message) = self.text_field("message") {
                    lines.extend(message.lines().map(str::to_string));
                }
            }
            "size" => {
                if let (Some(length), Some(times)) =
                    (self.text_field("length"), self.text_field("times"))
                {
                    lines.push(format!("cannot repeat a sequence of length {} {} times", length, times));
                }
            }
            "path" | "permission" => {
                if let Some(command) = self.text_field("command") {
                    lines.push(format!("cannot run command {}", command));
                }
            }
            "commandOutput" | "sensibleString" => {
                let key = if self.name == "commandOutput" { "detail" } else { "reason" };
                if let Some(detail) = self.text_field(key) {
                    lines.push(detail);
                }
            }
            _ => {}
        }
        lines
    }
}

impl PartialEq for Exception {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Exception {}

impl PartialOrd for Exception {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Exception {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report_lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_fields() {
        let a = Exception::new("testException");
        let b = Exception::new("testException").with_field("extra", Value::Null);
        assert_eq!(a, b);
        assert_ne!(a, Exception::new("other"));
    }

    #[test]
    fn test_name_report() {
        let lines = Exception::undefined_name("foo").report_lines();
        assert_eq!(
            lines,
            vec!["jqsh: uncaught exception: name", "name foo is not defined"]
        );
    }

    #[test]
    fn test_num_args_report() {
        let single = Exception::num_args([1], 0).report_lines();
        assert_eq!(
            single[1],
            "wrong number of function arguments: received 0, expected 1"
        );
        let many = Exception::num_args([0, 2], 1).report_lines();
        assert_eq!(
            many[1],
            "wrong number of function arguments: received 1, expected any of 0, 2"
        );
    }

    #[test]
    fn test_internal_report_keeps_lines() {
        let e = Exception::internal("first\nsecond");
        assert_eq!(e.report_lines().len(), 3);
        assert_eq!(e.name(), "internal");
    }

    #[test]
    fn test_size_report() {
        let lines = Exception::size(2, 7).report_lines();
        assert_eq!(lines[1], "cannot repeat a sequence of length 2 7 times");
    }
}
