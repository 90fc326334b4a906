//! Binary value operators: `+`, `*` and `:`.
//!
//! Operands are paired index-wise with the shorter side repeated cyclically.
//! If one side is empty the other passes through unchanged.

use crate::values::{Exception, JqObject, Value};
use bigdecimal::BigDecimal;
use num_traits::{Signed, ToPrimitive};

/// Outcome of one pairwise operation.
pub type Outcome = Result<Value, Exception>;

/// Pair `left` and `right` cyclically and apply `op` to each pair.
pub fn pairwise(left: Vec<Value>, right: Vec<Value>, op: fn(&Value, &Value) -> Outcome) -> Vec<Value> {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => left,
        (true, false) => right,
        (false, false) => {
            let count = left.len().max(right.len());
            (0..count)
                .map(|i| {
                    let l = &left[i % left.len()];
                    let r = &right[i % right.len()];
                    op(l, r).unwrap_or_else(Value::Exception)
                })
                .collect()
        }
    }
}

pub fn add(left: &Value, right: &Value) -> Outcome {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => {
            let mut text = a.text();
            text.push_str(&b.text());
            Ok(Value::from(text))
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut items = a.items();
            items.extend(b.items());
            Ok(Value::array(items))
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut entries = a.entries();
            entries.extend(b.entries());
            Ok(Value::Object(JqObject::from(entries)))
        }
        _ => Err(Exception::type_error()),
    }
}

pub fn multiply(left: &Value, right: &Value) -> Outcome {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (sequence @ (Value::String(_) | Value::Array(_)), Value::Number(n))
        | (Value::Number(n), sequence @ (Value::String(_) | Value::Array(_))) => {
            repeat(sequence, repeat_count(n)?)
        }
        _ => Err(Exception::type_error()),
    }
}

/// `[left, right]`
pub fn pair(left: &Value, right: &Value) -> Outcome {
    Ok(Value::array(vec![left.clone(), right.clone()]))
}

/// Negative factors repeat zero times.
fn repeat_count(n: &BigDecimal) -> Result<usize, Exception> {
    if !n.is_integer() {
        return Err(Exception::integer());
    }
    if n.is_negative() {
        return Ok(0);
    }
    n.to_usize().ok_or_else(Exception::integer)
}

/// Longest sequence `*` may build, in elements (code points for strings).
pub const MAX_REPEAT_LEN: usize = 1 << 24;

fn repeat(sequence: &Value, times: usize) -> Outcome {
    match sequence {
        Value::String(s) => {
            let chars = s.chars();
            let len = repeated_len(chars.len(), times)?;
            Ok(Value::from(chars.iter().cycle().take(len).collect::<String>()))
        }
        Value::Array(a) => {
            let items = a.items();
            let len = repeated_len(items.len(), times)?;
            Ok(Value::array(items.iter().cycle().take(len).cloned().collect()))
        }
        _ => Err(Exception::type_error()),
    }
}

fn repeated_len(len: usize, times: usize) -> Result<usize, Exception> {
    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(total),
        _ => Err(Exception::size(len, times)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(text: &str) -> Value {
        Value::Number(BigDecimal::from_str(text).unwrap())
    }

    #[test]
    fn test_pairwise_cycles_shorter_side() {
        let left = vec![Value::from(1), Value::from(2), Value::from(3)];
        let right = vec![Value::from(10)];
        let out = pairwise(left, right, add);
        assert_eq!(out, vec![Value::from(11), Value::from(12), Value::from(13)]);
    }

    #[test]
    fn test_pairwise_one_side_empty_passes_through() {
        let left = vec![Value::from("x")];
        assert_eq!(pairwise(left.clone(), vec![], add), left);
        assert_eq!(pairwise(vec![], left.clone(), multiply), left);
        assert!(pairwise(vec![], vec![], add).is_empty());
    }

    #[test]
    fn test_add_kinds() {
        assert_eq!(add(&dec("1.5"), &dec("2.25")).unwrap(), dec("3.75"));
        assert_eq!(
            add(&Value::from("ab"), &Value::from("c")).unwrap(),
            Value::from("abc")
        );
        let a = Value::array(vec![Value::from(1), Value::from(2)]);
        let b = Value::array(vec![Value::from(3)]);
        assert_eq!(
            add(&a, &b).unwrap(),
            Value::array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
        let err = add(&Value::Null, &Value::Null).unwrap_err();
        assert_eq!(err.name(), "type");
        assert_eq!(add(&Value::from(1), &Value::from("1")).unwrap_err().name(), "type");
    }

    #[test]
    fn test_object_union_right_wins() {
        let a = Value::object(vec![("a".to_string(), Value::from(1))]);
        let b = Value::object(vec![
            ("a".to_string(), Value::from(2)),
            ("b".to_string(), Value::from(3)),
        ]);
        assert_eq!(add(&a, &b).unwrap(), b);
    }

    #[test]
    fn test_multiply_repeats_sequences() {
        assert_eq!(
            multiply(&Value::from("ab"), &Value::from(3)).unwrap(),
            Value::from("ababab")
        );
        assert_eq!(
            multiply(&Value::from(2), &Value::array(vec![Value::Null])).unwrap(),
            Value::array(vec![Value::Null, Value::Null])
        );
        assert_eq!(
            multiply(&Value::from("ab"), &Value::from(-1)).unwrap(),
            Value::from("")
        );
        assert_eq!(multiply(&dec("1.5"), &dec("2")).unwrap(), dec("3"));
    }

    #[test]
    fn test_multiply_errors() {
        let err = multiply(&Value::from("ab"), &dec("1.5")).unwrap_err();
        assert_eq!(err.name(), "integer");
        let err = multiply(&Value::from("ab"), &Value::from("c")).unwrap_err();
        assert_eq!(err.name(), "type");
        let err = multiply(&Value::Boolean(true), &Value::from(2)).unwrap_err();
        assert_eq!(err.name(), "type");
    }

    #[test]
    fn test_multiply_rejects_oversized_repeat() {
        let huge = dec("100000000000000");
        let err = multiply(&Value::from("ab"), &huge).unwrap_err();
        assert_eq!(err.name(), "size");
        let err = multiply(&huge, &Value::array(vec![Value::Null])).unwrap_err();
        assert_eq!(err.name(), "size");
        // Overflowing the element count is rejected, not wrapped.
        let max = Value::Number(BigDecimal::from(usize::MAX as u64));
        assert_eq!(multiply(&Value::from("ab"), &max).unwrap_err().name(), "size");
    }

    #[test]
    fn test_multiply_empty_sequence_by_huge_factor() {
        let huge = dec("100000000000000");
        assert_eq!(multiply(&Value::from(""), &huge).unwrap(), Value::from(""));
        assert_eq!(
            multiply(&Value::array(vec![]), &huge).unwrap(),
            Value::array(vec![])
        );
    }
}
