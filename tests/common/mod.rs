//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use jqsh::{Channel, Filter, Runtime, Value};
use std::sync::Arc;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(100)
}

/// Run `filter` over `input` with a default runtime and collect its output
pub fn run(filter: &Arc<Filter>, input: Vec<Value>) -> Vec<Value> {
    run_with(&Runtime::default(), filter, input)
}

/// Run `filter` over `input` with `runtime` and collect its output
pub fn run_with(runtime: &Runtime, filter: &Arc<Filter>, input: Vec<Value>) -> Vec<Value> {
    runtime
        .start(filter, Channel::from_values(input))
        .values()
        .collect()
}

/// Assert that `values` is exactly one exception named `name`
pub fn assert_single_exception(values: &[Value], name: &str) {
    assert_eq!(values.len(), 1, "expected one value, got {:?}", values);
    match &values[0] {
        Value::Exception(e) => assert_eq!(e.name(), name),
        other => panic!("expected {} exception, got {:?}", name, other),
    }
}
