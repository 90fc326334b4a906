//! Test data builders for creating values and filters

use jqsh::{Filter, Value};
use std::str::FromStr;
use std::sync::Arc;

/// Integer value
pub fn num(n: i64) -> Value {
    Value::from(n)
}

/// Decimal value from its text form
pub fn dec(text: &str) -> Value {
    Value::Number(bigdecimal::BigDecimal::from_str(text).expect("valid decimal"))
}

/// Array of integers
pub fn nums(ns: &[i64]) -> Vec<Value> {
    ns.iter().copied().map(Value::from).collect()
}

/// Builder for object values
#[derive(Default)]
pub struct ObjectBuilder {
    entries: Vec<(String, Value)>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: &str, value: Value) -> Self {
        self.entries.push((key.to_string(), value));
        self
    }

    pub fn build(self) -> Value {
        Value::object(self.entries)
    }
}

/// `[a, b, ...]` literal from a list of element filters
pub fn array_literal(elements: Vec<Arc<Filter>>) -> Arc<Filter> {
    let mut iter = elements.into_iter();
    let Some(first) = iter.next() else {
        return Filter::array(Filter::empty());
    };
    Filter::array(iter.fold(first, Filter::comma))
}

/// `{"k": v, ...}` literal from key/value filters
pub fn object_literal(entries: Vec<(&str, Arc<Filter>)>) -> Arc<Filter> {
    let pairs: Vec<Arc<Filter>> = entries
        .into_iter()
        .map(|(key, value)| Filter::pair(Filter::string(key), value))
        .collect();
    let mut iter = pairs.into_iter();
    let Some(first) = iter.next() else {
        return Filter::object(Filter::empty());
    };
    Filter::object(iter.fold(first, Filter::comma))
}

/// Function call `name arg...`
pub fn call(name: &str, args: Vec<Arc<Filter>>) -> Arc<Filter> {
    let mut attributes = vec![Filter::name(name)];
    attributes.extend(args);
    Filter::apply(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_builder() {
        let obj = ObjectBuilder::new().entry("a", num(1)).build();
        assert_eq!(obj, Value::object(vec![("a".to_string(), num(1))]));
    }
}
