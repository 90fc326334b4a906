//! Total order over all values.
//!
//! Kinds sort as Exception < Null < Boolean < Number < String < Array <
//! Object. Comparing composites forces full materialization.

use super::{JqObject, Value};
use std::cmp::Ordering;

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Exception(a), Value::Exception(b)) => a.cmp(b),
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.chars().cmp(&b.chars()),
            (Value::Array(a), Value::Array(b)) => a.items().cmp(&b.items()),
            (Value::Object(a), Value::Object(b)) => compare_objects(a, b),
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

/// Key sets first, then values in key order.
fn compare_objects(a: &JqObject, b: &JqObject) -> Ordering {
    let a = a.entries();
    let b = b.entries();
    a.keys()
        .cmp(b.keys())
        .then_with(|| a.values().cmp(b.values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Exception;
    use bigdecimal::BigDecimal;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn ladder() -> Vec<Value> {
        vec![
            Value::Exception(Exception::new("testException")),
            Value::Null,
            Value::Boolean(false),
            Value::Boolean(true),
            Value::from(-3),
            Value::from(0),
            Value::Number(BigDecimal::from_str(&format!("{}.5", "813".repeat(40))).unwrap()),
            Value::from(""),
            Value::from("a"),
            Value::from("this is an example"),
            Value::array(vec![]),
            Value::array(vec![Value::from(1)]),
            Value::array(vec![Value::from("foo"), Value::from("bar")]),
            Value::object(vec![]),
            Value::object(vec![("a".to_string(), Value::from(1))]),
            Value::object(vec![
                ("bar".to_string(), Value::Boolean(false)),
                ("foo".to_string(), Value::Boolean(true)),
            ]),
        ]
    }

    #[test]
    fn test_fixed_order() {
        let values = ladder();
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                assert!(values[i] < values[j], "{:?} < {:?}", values[i], values[j]);
                assert!(values[j] > values[i]);
            }
            assert_eq!(values[i].cmp(&values[i]), Ordering::Equal);
        }
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let a = Value::Number(BigDecimal::from_str("1.50").unwrap());
        let b = Value::Number(BigDecimal::from_str("1.5").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_object_key_sets_compare_first() {
        let small_keys = Value::object(vec![("a".to_string(), Value::from(100))]);
        let big_keys = Value::object(vec![("b".to_string(), Value::from(0))]);
        assert!(small_keys < big_keys);
    }

    #[test]
    fn test_shorter_array_is_less_on_common_prefix() {
        let short = Value::array(vec![Value::from(1)]);
        let long = Value::array(vec![Value::from(1), Value::Null]);
        assert!(short < long);
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            "[a-c]{1,3}".prop_map(|n| Value::Exception(Exception::new(n))),
            Just(Value::Null),
            any::<bool>().prop_map(Value::Boolean),
            (-50i64..50).prop_map(Value::from),
            "[ab]{0,3}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
                prop::collection::btree_map("[ab]", inner, 0..3).prop_map(Value::from),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_order_is_total_and_transitive(a in arb_value(), b in arb_value(), c in arb_value()) {
            // Antisymmetry.
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            // Transitivity.
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }
    }
}
