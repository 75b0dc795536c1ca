//! Integration tests for conditional and cross-field object rules.

use serde_json::json;
use sluice::{bind, Flow, Options, Rule, Schema, SchemaLike, ValidationError, Value};

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

#[derive(Debug, Default, Clone, PartialEq)]
struct Signup {
    password: String,
    confirm: String,
    email: String,
    phone: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Booking {
    start: i64,
    end: i64,
    kind: String,
    voucher: String,
    invoice: String,
}

#[test]
fn test_password_confirmation() {
    let schema = Schema::object::<Signup>()
        .field(bind!(Signup, password), Schema::text().min_len(8))
        .field(bind!(Signup, confirm), Schema::text())
        .eq_field("password")
        .build()
        .unwrap();

    assert!(schema
        .validate(&v(json!({"password": "s3cret-pw", "confirm": "s3cret-pw"})))
        .is_success());

    let errors = unwrap_failure(schema.validate(&v(json!({"password": "s3cret-pw", "confirm": "other"}))));
    assert_eq!(errors.len(), 1);
    let issue = errors.first();
    assert_eq!(issue.path(), "confirm");
    assert_eq!(issue.code(), "object.field.eqfield");
    assert_eq!(issue.meta().get("field"), Some(&json!("password")));
    assert_eq!(issue.meta().get("value"), Some(&json!("s3cret-pw")));
}

#[test]
fn test_required_with() {
    let schema = Schema::object::<Signup>()
        .field(bind!(Signup, email), Schema::text())
        .field(bind!(Signup, phone), Schema::text())
        .required_with("email")
        .build()
        .unwrap();

    assert!(schema.validate(&v(json!({}))).is_success());

    let errors = unwrap_failure(schema.validate(&v(json!({"email": "a@b.c"}))));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "phone");
    assert_eq!(errors.first().code(), "object.field.required_with");

    assert!(schema
        .validate(&v(json!({"email": "a@b.c", "phone": "555"})))
        .is_success());
}

#[test]
fn test_gt_field_only_runs_when_present() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, start), Schema::number::<i64>())
        .field(bind!(Booking, end), Schema::number::<i64>())
        .gt_field("start")
        .build()
        .unwrap();

    let out = unwrap_success(schema.validate(&v(json!({"start": 1, "end": 5}))));
    assert_eq!((out.start, out.end), (1, 5));

    let errors = unwrap_failure(schema.validate(&v(json!({"start": 5, "end": 5}))));
    assert_eq!(errors.first().code(), "object.field.gtfield");
    assert_eq!(errors.first().meta().get("value"), Some(&json!(5)));

    assert!(schema.validate(&v(json!({"start": 5}))).is_success());
}

#[test]
fn test_required_if_and_unless() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, kind), Schema::text())
        .field(bind!(Booking, voucher), Schema::text())
        .required_if("kind", "gift")
        .field(bind!(Booking, invoice), Schema::text())
        .required_unless("kind", "gift")
        .build()
        .unwrap();

    let errors = unwrap_failure(schema.validate(&v(json!({"kind": "gift"}))));
    let found: Vec<_> = errors.iter().map(|i| (i.path(), i.code())).collect();
    assert_eq!(found, vec![("voucher", "object.field.required_if")]);

    let errors = unwrap_failure(schema.validate(&v(json!({"kind": "business"}))));
    let found: Vec<_> = errors.iter().map(|i| (i.path(), i.code())).collect();
    assert_eq!(found, vec![("invoice", "object.field.required_unless")]);
}

#[test]
fn test_excluded_with_and_without() {
    let schema = Schema::object::<Signup>()
        .field(bind!(Signup, email), Schema::text())
        .field(bind!(Signup, phone), Schema::text())
        .excluded_with("email")
        .build()
        .unwrap();

    assert!(schema.validate(&v(json!({"phone": "555"}))).is_success());
    let errors = unwrap_failure(schema.validate(&v(json!({"email": "a@b.c", "phone": "555"}))));
    assert_eq!(errors.first().code(), "object.field.excluded_with");

    let schema = Schema::object::<Signup>()
        .field(bind!(Signup, email), Schema::text())
        .field(bind!(Signup, phone), Schema::text())
        .excluded_without("email")
        .build()
        .unwrap();
    let errors = unwrap_failure(schema.validate(&v(json!({"phone": "555"}))));
    assert_eq!(errors.first().code(), "object.field.excluded_without");
}

#[test]
fn test_skip_unless_suppresses_validation() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, kind), Schema::text())
        .field(bind!(Booking, voucher), Schema::text().len(8))
        .skip_unless("kind", "gift")
        .required()
        .build()
        .unwrap();

    assert!(schema.validate(&v(json!({"kind": "business", "voucher": 12}))).is_success());

    let errors = unwrap_failure(schema.validate(&v(json!({"kind": "gift"}))));
    assert_eq!(errors.first().code(), "object.field.required");
}

#[test]
fn test_skip_unless_with_predicate() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, start), Schema::number::<i64>())
        .field(bind!(Booking, end), Schema::number::<i64>().max(100))
        .skip_unless_with("start", |start| start.as_f64().is_some_and(|n| n > 0.0))
        .build()
        .unwrap();

    assert!(schema.validate(&v(json!({"start": 0, "end": 500}))).is_success());
    assert!(schema.validate(&v(json!({"start": 1, "end": 500}))).is_failure());
}

#[test]
fn test_nested_query_paths() {
    #[derive(Debug, Default, Clone)]
    struct Order {
        shipping: Value,
        address: String,
    }

    let schema = Schema::object::<Order>()
        .field(bind!(Order, shipping), sluice::Erased::new(Schema::record(Schema::text())))
        .field(bind!(Order, address), Schema::text())
        .required_if("shipping.method", "post")
        .build()
        .unwrap();

    let errors = unwrap_failure(schema.validate(&v(json!({"shipping": {"method": "post"}}))));
    assert_eq!(errors.first().path(), "address");
    assert!(schema
        .validate(&v(json!({"shipping": {"method": "pickup"}})))
        .is_success());
}

#[test]
fn test_struct_level_rules_run_after_fields() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, start), Schema::number::<i64>())
        .field(bind!(Booking, end), Schema::number::<i64>())
        .custom(|booking, ctx| {
            if booking.end - booking.start > 10 {
                ctx.push_field("end");
                let flow = ctx.add_issue("booking.too_long", "booking is too long");
                ctx.pop();
                flow
            } else {
                Flow::Continue
            }
        })
        .rule(Rule::new(|mut booking: Booking, _ctx| {
            booking.kind = "standard".to_string();
            (booking, Flow::Continue)
        }))
        .build()
        .unwrap();

    let out = unwrap_success(schema.validate(&v(json!({"start": 0, "end": 3}))));
    assert_eq!(out.kind, "standard");

    let errors = unwrap_failure(schema.validate(&v(json!({"start": 0, "end": 30}))));
    assert_eq!(errors.first().code(), "booking.too_long");
    assert_eq!(errors.first().path(), "end");
}

#[test]
fn test_no_struct_level_skips_rules() {
    let schema = Schema::object::<Booking>()
        .field(bind!(Booking, start), Schema::number::<i64>())
        .custom(|_, ctx| ctx.add_issue("booking.never", "never"))
        .no_struct_level()
        .build()
        .unwrap();
    assert!(schema.validate(&v(json!({"start": 1}))).is_success());
}

#[test]
fn test_fail_fast_stops_after_first_field() {
    let schema = Schema::object::<Signup>()
        .field(bind!(Signup, password), Schema::text().required())
        .field(bind!(Signup, email), Schema::text().required())
        .build()
        .unwrap();

    let errors = unwrap_failure(schema.validate(&v(json!({}))));
    assert_eq!(errors.len(), 2);

    let options = Options::default().fail_fast(true);
    let errors = unwrap_failure(schema.validate_with(&v(json!({})), &options));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "password");
}

#[test]
fn test_condition_before_field_is_build_error() {
    let result = Schema::object::<Signup>().required_with("email").build();
    assert!(result.is_err());
}
