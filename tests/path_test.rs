//! Integration tests for JsonPath and QueryPath.

use serde_json::json;
use sluice::{JsonPath, PathSegment, QueryPath, QuerySegment, Value};

fn path_of(segments: Vec<PathSegment>) -> String {
    JsonPath::from_segments(segments).to_string()
}

#[test]
fn test_path_construction_and_display() {
    assert_eq!(JsonPath::root().to_string(), "");
    assert_eq!(path_of(vec![PathSegment::field("name")]), "name");
    assert_eq!(path_of(vec![PathSegment::index(0)]), "[0]");
    assert_eq!(
        path_of(vec![
            PathSegment::field("users"),
            PathSegment::index(0),
            PathSegment::field("address"),
            PathSegment::field("city"),
        ]),
        "users[0].address.city"
    );
}

#[test]
fn test_map_keys_are_quoted_when_needed() {
    let path = path_of(vec![
        PathSegment::field("user"),
        PathSegment::index(0),
        PathSegment::key("weird key"),
    ]);
    assert_eq!(path, r#"user[0]["weird key"]"#);

    assert_eq!(path_of(vec![PathSegment::field("m"), PathSegment::key("plain")]), "m.plain");
    assert_eq!(path_of(vec![PathSegment::key("1st")]), r#"["1st"]"#);
    assert_eq!(path_of(vec![PathSegment::key("say \"hi\"")]), r#"["say \"hi\""]"#);
}

#[test]
fn test_push_and_pop() {
    let mut path = JsonPath::root();
    path.push_field("data");
    path.push_index(42);
    path.push_key("a-b");
    assert_eq!(path.to_string(), r#"data[42]["a-b"]"#);
    assert_eq!(path.last(), Some(&PathSegment::key("a-b")));

    path.pop();
    path.pop();
    assert_eq!(path.to_string(), "data");
    path.pop();
    path.pop();
    assert!(path.is_root());
}

#[test]
fn test_snapshot_and_restore() {
    let mut path = JsonPath::root();
    path.push_field("a");
    let snapshot = path.snapshot();
    path.push_field("b");
    path.push_index(1);
    path.restore(snapshot);
    assert_eq!(path.to_string(), "a");
}

#[test]
fn test_query_parsing() {
    let query = QueryPath::parse(r#"items[2].meta["x.y"]"#).unwrap();
    assert_eq!(
        query.segments(),
        &[
            QuerySegment::Key("items".into()),
            QuerySegment::Index(2),
            QuerySegment::Key("meta".into()),
            QuerySegment::Key("x.y".into()),
        ]
    );
    assert_eq!(query.to_string(), r#"items[2].meta["x.y"]"#);
}

#[test]
fn test_root_queries() {
    let root = Value::from(json!({"a": 1}));
    assert_eq!(QueryPath::parse(".").unwrap().resolve(&root), root);
    assert_eq!(QueryPath::parse("$").unwrap().resolve(&root), root);
    assert_eq!(QueryPath::root().to_string(), "$");
}

#[test]
fn test_query_resolution_misses() {
    let root = Value::from(json!({"list": [1, 2]}));
    assert!(QueryPath::parse("list[5]").unwrap().resolve(&root).is_missing());
    assert!(QueryPath::parse("list[-1]").unwrap().resolve(&root).is_missing());
    assert!(QueryPath::parse("nope.deeper").unwrap().resolve(&root).is_missing());
    assert_eq!(QueryPath::parse("list[1]").unwrap().resolve(&root), Value::from(2));
}

#[test]
fn test_malformed_queries() {
    assert!(QueryPath::parse("").is_err());
    assert!(QueryPath::parse("a[").is_err());
    assert!(QueryPath::parse(r#"a["unterminated"#).is_err());
}
