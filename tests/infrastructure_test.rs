//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{array_literal, nums, ObjectBuilder};
use jqsh::{Filter, Value};

#[test]
fn test_infrastructure_setup() {
    let obj = ObjectBuilder::new()
        .entry("b", Value::Null)
        .entry("a", Value::from(true))
        .build();
    assert_eq!(obj.to_string(), "{\"a\": true, \"b\": null}");
}

#[test]
fn test_run_helper_identity() {
    let out = common::run(&Filter::identity(), nums(&[1, 2]));
    assert_eq!(out, nums(&[1, 2]));
}

#[test]
fn test_array_literal_builder() {
    let filter = array_literal(vec![Filter::number(1), Filter::number(2)]);
    assert_eq!(filter.to_string(), "[1, 2]");
}

#[test]
#[should_panic]
fn test_single_exception_assertion_fails() {
    common::assert_single_exception(&nums(&[1]), "type");
}
