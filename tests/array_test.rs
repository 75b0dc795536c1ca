//! Integration tests for array and record schema validation.

use serde_json::json;
use sluice::{Flow, Options, Schema, SchemaLike, ValidationError, Value};

/// Helper to extract the success value from a Validation
fn unwrap_success<T, E: std::fmt::Debug>(v: stillwater::Validation<T, E>) -> T {
    v.into_result().unwrap()
}

/// Helper to extract the error value from a Validation
fn unwrap_failure<T: std::fmt::Debug>(v: stillwater::Validation<T, ValidationError>) -> ValidationError {
    v.into_result().unwrap_err()
}

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

#[test]
fn test_array_of_integers() {
    let schema = Schema::array(Schema::number::<i64>().positive());
    assert_eq!(unwrap_success(schema.validate(&v(json!([1, 2, 3])))), vec![1, 2, 3]);
}

#[test]
fn test_item_errors_carry_index_paths() {
    let schema = Schema::array(Schema::text().min_len(2));
    let errors = unwrap_failure(schema.validate(&v(json!(["ok", "x", "fine", ""]))));
    let paths: Vec<_> = errors.iter().map(|i| i.path()).collect();
    assert_eq!(paths, vec!["[1]", "[3]"]);
}

#[test]
fn test_nested_arrays() {
    let schema = Schema::array(Schema::array(Schema::number::<u8>()));
    let errors = unwrap_failure(schema.validate(&v(json!([[1], [2, "x"]]))));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "[1][1]");
    assert_eq!(errors.first().code(), "number.type");
}

#[test]
fn test_unique_reports_later_duplicate() {
    let schema = Schema::array(Schema::number::<i32>()).unique();
    let errors = unwrap_failure(schema.validate(&v(json!([1, 2, 1]))));
    assert_eq!(errors.len(), 1);
    let issue = errors.first();
    assert_eq!(issue.code(), "array.unique");
    assert_eq!(issue.path(), "[2]");
    assert_eq!(issue.meta().get("first"), Some(&json!(0)));
}

#[test]
fn test_unique_compares_numbers_by_value() {
    let schema = Schema::array(Schema::number::<f64>()).unique();
    assert!(schema.validate(&v(json!([1, 1.0]))).is_failure());
    assert!(schema.validate(&v(json!([1, 2.5]))).is_success());
}

#[test]
fn test_unique_keeps_large_integers_apart() {
    let schema = Schema::array(Schema::number::<u64>()).unique();
    let out = unwrap_success(schema.validate(&v(json!([9007199254740992u64, 9007199254740993u64]))));
    assert_eq!(out, vec![9007199254740992, 9007199254740993]);

    let errors = unwrap_failure(schema.validate(&v(json!([u64::MAX, u64::MAX]))));
    assert_eq!(errors.first().code(), "array.unique");

    let record = Schema::record(Schema::number::<u64>()).unique_values();
    let input = v(json!({"a": 9007199254740992u64, "b": 9007199254740993u64}));
    assert!(record.validate(&input).is_success());
}

#[test]
fn test_unique_objects_ignore_key_order() {
    let schema = Schema::array(Schema::record(Schema::number::<i32>())).unique();
    let input = v(json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}]));
    let errors = unwrap_failure(schema.validate(&input));
    assert_eq!(errors.first().code(), "array.unique");
}

#[test]
fn test_length_failure_stops_under_fail_fast() {
    let schema = Schema::array(Schema::text().min_len(3)).min_len(5);
    let input = v(json!(["a", "b"]));

    let errors = unwrap_failure(schema.validate(&input));
    assert_eq!(errors.len(), 3);

    let options = Options::default().fail_fast(true);
    let errors = unwrap_failure(schema.validate_with(&input, &options));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "array.min_length");
}

#[test]
fn test_missing_array_is_empty_unless_required() {
    let schema = Schema::array(Schema::text());
    assert!(unwrap_success(schema.validate(&Value::missing())).is_empty());

    let errors = unwrap_failure(Schema::array(Schema::text()).required().validate(&Value::null()));
    assert_eq!(errors.first().code(), "array.required");
}

#[test]
fn test_array_custom_rule() {
    let schema = Schema::array(Schema::number::<u32>()).custom(|items, ctx| {
        if items.iter().sum::<u32>() > 10 {
            ctx.add_issue("array.budget", "total exceeds budget")
        } else {
            Flow::Continue
        }
    });
    assert!(schema.validate(&v(json!([3, 4]))).is_success());
    let errors = unwrap_failure(schema.validate(&v(json!([6, 7]))));
    assert_eq!(errors.first().code(), "array.budget");
    assert_eq!(errors.first().path(), "");
}

#[test]
fn test_record_values_and_key_paths() {
    let schema = Schema::record(Schema::number::<u16>().max(100));
    let input = v(json!({"cpu": 50, "disk usage": 150}));
    let errors = unwrap_failure(schema.validate(&input));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "[\"disk usage\"]");
    assert_eq!(errors.first().code(), "number.max");
}

#[test]
fn test_record_keeps_input_order() {
    let schema = Schema::record(Schema::text());
    let out = unwrap_success(schema.validate(&v(json!({"z": "1", "a": "2"}))));
    let keys: Vec<_> = out.keys().cloned().collect();
    assert_eq!(keys, vec!["z", "a"]);
}

#[test]
fn test_record_key_schema() {
    let schema = Schema::record(Schema::boolean()).keys(Schema::text().max_len(3));
    let errors = unwrap_failure(schema.validate(&v(json!({"ok": true, "toolong": false}))));
    assert_eq!(errors.first().code(), "text.max_length");
    assert_eq!(errors.first().path(), "toolong");
}

#[test]
fn test_record_unique_values() {
    let schema = Schema::record(Schema::text()).unique_values();
    let errors = unwrap_failure(schema.validate(&v(json!({"a": "x", "b": "y", "c": "x"}))));
    assert_eq!(errors.first().code(), "record.unique");
    assert_eq!(errors.first().path(), "c");
    assert_eq!(errors.first().meta().get("first"), Some(&json!("a")));
}

#[test]
fn test_record_reports_first_duplicate_only() {
    let schema = Schema::record(Schema::number::<i32>()).unique_values();
    let errors = unwrap_failure(schema.validate(&v(json!({"a": 1, "b": 1, "c": 1}))));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "b");
    assert_eq!(errors.first().meta().get("first"), Some(&json!("a")));
}

#[test]
fn test_record_type_mismatch() {
    let errors = unwrap_failure(Schema::record(Schema::text()).validate(&v(json!(["a"]))));
    let issue = errors.first();
    assert_eq!(issue.code(), "record.type");
    assert_eq!(issue.meta().get("actual"), Some(&json!("array")));
}
