//! Text rendering of values.

use super::Value;
use std::fmt::{self, Write};

/// Quote `text` as a jqsh string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) <= 0x1f => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders values as text, compact or indented.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    /// Spaces per nesting level; `0` renders on one line.
    pub indent: usize,
}

impl Renderer {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    pub fn render(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value, 0);
        out
    }

    fn newline(&self, out: &mut String, depth: usize) {
        if self.indent > 0 {
            out.push('\n');
            out.push_str(&" ".repeat(self.indent * depth));
        }
    }

    fn write_value(&self, out: &mut String, value: &Value, depth: usize) {
        match value {
            Value::Exception(e) => out.push_str(&e.report_lines().join("\n")),
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => {
                let _ = write!(out, "{}", n);
            }
            Value::String(s) => out.push_str(&quote(&s.text())),
            Value::Array(a) => {
                let items = a.items();
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                        if self.indent == 0 {
                            out.push(' ');
                        }
                    }
                    self.newline(out, depth + 1);
                    self.write_value(out, item, depth + 1);
                }
                self.newline(out, depth);
                out.push(']');
            }
            Value::Object(o) => {
                let entries = o.entries();
                if entries.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push('{');
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                        if self.indent == 0 {
                            out.push(' ');
                        }
                    }
                    self.newline(out, depth + 1);
                    out.push_str(&quote(key));
                    out.push_str(": ");
                    self.write_value(out, item, depth + 1);
                }
                self.newline(out, depth);
                out.push('}');
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Renderer::default().render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_controls() {
        assert_eq!(quote("a\"b\\c\n\u{1}"), "\"a\\\"b\\\\c\\n\\u0001\"");
    }

    #[test]
    fn test_compact_rendering() {
        let v = Value::object(vec![
            ("b".to_string(), Value::array(vec![Value::from(1), Value::Null])),
            ("a".to_string(), Value::from("x")),
        ]);
        assert_eq!(v.to_string(), "{\"a\": \"x\", \"b\": [1, null]}");
    }

    #[test]
    fn test_indented_rendering() {
        let v = Value::array(vec![Value::from(1), Value::array(vec![])]);
        assert_eq!(Renderer::new(2).render(&v), "[\n  1,\n  []\n]");
    }
}
