//! Integration tests for number schema validation.

use serde_json::json;
use sluice::{Flow, Options, Schema, SchemaLike, ValidationError, Value};

fn unwrap_success<T, E: std::fmt::Debug>(v: stillwater::Validation<T, E>) -> T {
    v.into_result().unwrap()
}

fn unwrap_failure<T: std::fmt::Debug>(v: stillwater::Validation<T, ValidationError>) -> ValidationError {
    v.into_result().unwrap_err()
}

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

#[test]
fn test_integer_accepts_integral_text() {
    let schema = Schema::number::<i64>();
    assert_eq!(unwrap_success(schema.validate(&v(json!(1.0)))), 1);
    assert_eq!(unwrap_success(schema.validate(&v(json!(1e3)))), 1000);
}

#[test]
fn test_fraction_is_invalid_for_integers() {
    let errors = unwrap_failure(Schema::number::<u32>().validate(&v(json!(2.5))));
    assert_eq!(errors.first().code(), "number.invalid");
}

#[test]
fn test_out_of_range_for_type() {
    let errors = unwrap_failure(Schema::number::<i8>().validate(&v(json!(128))));
    assert_eq!(errors.first().code(), "number.invalid");
    assert!(Schema::number::<i8>().validate(&v(json!(-128))).is_success());
}

#[test]
fn test_large_integers_keep_precision() {
    let out = unwrap_success(Schema::number::<u64>().validate(&v(json!(18446744073709551615u64))));
    assert_eq!(out, u64::MAX);
}

#[test]
fn test_floats() {
    let schema = Schema::number::<f64>().gt(0.0).lt(1.0);
    assert_eq!(unwrap_success(schema.validate(&v(json!(0.5)))), 0.5);
    let errors = unwrap_failure(schema.validate(&v(json!(1.0))));
    assert_eq!(errors.first().code(), "number.lt");
}

#[test]
fn test_rule_stages_run_in_fixed_order() {
    // Declared relational first, value set last; reported value set first.
    let schema = Schema::number::<i32>().ne(7).max(5).one_of([1, 2, 3]);
    let errors = unwrap_failure(schema.validate(&v(json!(7))));
    let codes: Vec<_> = errors.iter().map(|i| i.code()).collect();
    assert_eq!(codes, vec!["number.one_of", "number.max", "number.ne"]);
}

#[test]
fn test_redefining_bound_keeps_position() {
    let schema = Schema::number::<i32>().min(10).max(20).min(0);
    assert!(schema.validate(&v(json!(5))).is_success());
    let errors = unwrap_failure(schema.validate(&v(json!(-1))));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().meta().get("min"), Some(&json!(0)));
}

#[test]
fn test_coercion_sub_flags() {
    let schema = Schema::number::<i32>();
    let strict = Options::default().coerce(true);
    assert_eq!(unwrap_success(schema.validate_with(&v(json!("12")), &strict)), 12);
    assert!(schema.validate_with(&v(json!(" 12 ")), &strict).is_failure());
    assert!(schema.validate_with(&v(json!("1_000")), &strict).is_failure());

    let relaxed = strict.coerce_trim_space(true).coerce_number_underscore(true);
    assert_eq!(unwrap_success(schema.validate_with(&v(json!(" 1_000 ")), &relaxed)), 1000);
}

#[test]
fn test_custom_rule_stop_skips_later_rules() {
    let schema = Schema::number::<i32>()
        .custom(|n, ctx| {
            if *n == 13 {
                ctx.add_issue("number.unlucky", "unlucky");
                Flow::Stop
            } else {
                Flow::Continue
            }
        })
        .custom(|_, ctx| ctx.add_issue("number.never", "should not run"));
    let errors = unwrap_failure(schema.validate(&v(json!(13))));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "number.unlucky");
}

#[test]
fn test_default_and_required() {
    let schema = Schema::number::<u16>().default_value(8080).max(9000);
    assert_eq!(unwrap_success(schema.validate(&Value::missing())), 8080);

    let errors = unwrap_failure(Schema::number::<u16>().required().validate(&Value::null()));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "number.required");
}
