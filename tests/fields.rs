//! Integration tests for structured fields and the flat map projection.

use errchain::{
    EXC_FILE_NAME, EXC_FUNC_NAME, EXC_LINE_NUM, EXC_TYPE, EXC_VALUE, Fields, HasFields, Leaf,
    NodeKind, WithFields, expose, fields, first, is_kind, kind_of, last, last_map, new, stack_of,
    to_json, to_map, with_message, wrap, wrap_fields_fmt,
};
use serde_json::json;

#[derive(Debug)]
struct ErrTest {
    msg: &'static str,
}

impl std::fmt::Display for ErrTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.msg)
    }
}

impl std::error::Error for ErrTest {}

#[derive(Debug, thiserror::Error)]
#[error("query failed on {table}")]
struct QueryError {
    table: &'static str,
    rows: u64,
}

impl HasFields for QueryError {
    fn fields(&self) -> Fields {
        Fields::new().with("table", self.table).with("rows", self.rows)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("I have no stack trace: {source}")]
struct Plain {
    #[source]
    source: WithFields,
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn nested_fields_are_merged() {
    let err = new("query error");
    let wrap1 = Fields::new().with("key1", "value1").wrap(err, "message1");
    let wrap2 = Fields::new().with("key2", "value2").wrap(wrap1, "message2");

    let merged = errchain::fields(&wrap2);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get("key1"), Some(&json!("value1")));
    assert_eq!(merged.get("key2"), Some(&json!("value2")));
    assert_eq!(wrap2.fields(), merged);
}

#[test]
fn deeper_field_wins_on_collision() {
    let inner = fields!("key" => "inner", "only_inner" => 1).wrap(new("e"), "a");
    let outer = fields!("key" => "outer", "only_outer" => 2).wrap(inner, "b");

    let m = to_map(&outer);
    assert_eq!(m["key"], "inner");
    assert_eq!(m["only_inner"], 1);
    assert_eq!(m["only_outer"], 2);
}

#[test]
fn fields_found_through_foreign_wrapper() {
    let wrapped = Fields::new().with("key1", "value1").wrap(new("query error"), "message");
    let err = Plain { source: wrapped };

    let merged = errchain::fields(&err);
    assert_eq!(merged.get("key1"), Some(&json!("value1")));
    assert_eq!(to_map(&err)[EXC_VALUE], "I have no stack trace: message: query error");
}

#[test]
fn chain_without_fields_merges_to_empty() {
    let err = wrap(with_message(new("x"), "y"), "z");
    assert!(errchain::fields(&err).is_empty());
    assert!(errchain::own_fields(&err).is_none());
}

#[test]
fn exposed_error_contributes_fields() {
    let err = fields!("request" => "abc").wrap(
        expose(QueryError {
            table: "users",
            rows: 0,
        }),
        "loading",
    );

    assert_eq!(err.to_string(), "loading: query failed on users");
    let merged = err.fields();
    assert_eq!(merged.get("table"), Some(&json!("users")));
    assert_eq!(merged.get("rows"), Some(&json!(0)));
    assert_eq!(merged.get("request"), Some(&json!("abc")));

    let found = first::<QueryError>(&err).expect("matched through the adapter");
    assert_eq!(found.table, "users");
    assert_eq!(last::<QueryError>(&err).map(|e| e.rows), Some(0));
}

#[test]
fn exposed_reports_inner_type() {
    let err = wrap(
        expose(QueryError {
            table: "t",
            rows: 1,
        }),
        "ctx",
    );
    assert!(to_map(&err)[EXC_TYPE].as_str().unwrap().ends_with("QueryError"));
}

#[test]
fn exposed_fields_node_keeps_its_stack() {
    let (inner, line) = (fields!("k" => 1).wrap(new("e"), "m"), line!());
    let err = expose(inner);

    assert_eq!(kind_of(&err), Some(NodeKind::Fields));
    assert!(is_kind(&err, NodeKind::Fields));
    assert!(last_map(&err, stack_of).is_some());

    let m = to_map(&err);
    assert_eq!(m[EXC_VALUE], "m: e");
    assert_eq!(m[EXC_LINE_NUM], json!(line));
    assert!(m[EXC_FILE_NAME].as_str().unwrap().ends_with("fields.rs"));
    assert_eq!(m[EXC_TYPE], std::any::type_name::<Leaf>());
    assert_eq!(m["k"], 1);
}

// ============================================================================
// Formatted constructors
// ============================================================================

#[test]
fn fields_wrap_fmt_formats_message() {
    let ctx = fields!("shard" => 7);
    let (err, line) = (ctx.wrap_fmt(new("timeout"), format_args!("query {} of {}", 2, 5)), line!());

    assert_eq!(err.message(), Some("query 2 of 5"));
    assert_eq!(err.to_string(), "query 2 of 5: timeout");
    assert_eq!(format!("{:#}", err), "query 2 of 5: timeout (shard=7)");
    assert_eq!(err.stack().origin().line(), line);
}

#[test]
fn fields_error_fmt_builds_formatted_leaf() {
    let ctx = fields!("limit" => 100);
    let (err, line) = (ctx.error_fmt(format_args!("quota {} exceeded", "disk")), line!());

    assert!(err.message().is_none());
    assert_eq!(err.to_string(), "quota disk exceeded");
    assert_eq!(format!("{:#}", err), "quota disk exceeded (limit=100)");
    assert_eq!(first::<Leaf>(&err).map(Leaf::text), Some("quota disk exceeded"));
    assert_eq!(to_map(&err)[EXC_LINE_NUM], json!(line));
}

#[test]
fn wrap_fields_fmt_matches_method_form() {
    let ctx = fields!("user" => "alice");
    let (err, line) = (wrap_fields_fmt(new("denied"), &ctx, format_args!("try {}", 3)), line!());

    assert_eq!(err.to_string(), "try 3: denied");
    assert_eq!(format!("{:#}", err), "try 3: denied (user=alice)");
    assert_eq!(err.own_fields(), &ctx);
    assert_eq!(err.stack().origin().line(), line);
}

// ============================================================================
// to_map
// ============================================================================

#[test]
fn to_map_without_stack_has_value_and_type() {
    let err = new("this is an error");
    let m = to_map(&err);

    assert_eq!(m.len(), 2);
    assert_eq!(m[EXC_VALUE], "this is an error");
    assert_eq!(m[EXC_TYPE], std::any::type_name::<Leaf>());
    assert!(!m.contains_key(EXC_LINE_NUM));
}

#[test]
fn to_map_with_stack_has_location() {
    let err = wrap(new("query error"), "message");
    let m = to_map(&err);

    assert_eq!(m.len(), 5);
    assert_eq!(m[EXC_VALUE], "message: query error");
    assert!(m[EXC_LINE_NUM].is_u64());
    assert!(m[EXC_FILE_NAME].as_str().unwrap().ends_with("fields.rs"));
    // Function names need symbols for the calling frame
    if cfg!(debug_assertions) {
        assert!(
            m[EXC_FUNC_NAME]
                .as_str()
                .unwrap()
                .ends_with("to_map_with_stack_has_location")
        );
    }
}

#[test]
fn to_map_includes_fields_and_root_type() {
    let err = Fields::new()
        .with("key1", "value1")
        .wrap(ErrTest { msg: "query error" }, "message");
    let m = to_map(&err);

    assert_eq!(m.len(), 6);
    assert_eq!(m["key1"], "value1");
    assert_eq!(m[EXC_VALUE], "message: query error");
    assert!(m[EXC_TYPE].as_str().unwrap().ends_with("ErrTest"));
}

#[test]
fn to_map_root_type_below_foreign_wrapper() {
    let err = Plain {
        source: Fields::new()
            .with("key1", "value1")
            .wrap(ErrTest { msg: "query error" }, "message"),
    };
    let m = to_map(&err);
    assert!(m[EXC_TYPE].as_str().unwrap().ends_with("ErrTest"), "{:?}", m);
    assert_eq!(m["key1"], "value1");
}

#[test]
fn to_map_of_lone_foreign_error_names_its_type() {
    let err = std::io::Error::other("disk");
    let m = to_map(&err);

    assert_eq!(m.len(), 2);
    assert_eq!(m[EXC_VALUE], "disk");
    assert_eq!(m[EXC_TYPE], std::any::type_name::<std::io::Error>());
}

#[test]
fn to_json_is_an_object() {
    let err = fields!("attempt" => 3).error("timed out");
    let value = to_json(&err);

    assert!(value.is_object());
    assert_eq!(value["attempt"], 3);
    assert_eq!(value[EXC_VALUE], "timed out");
}

#[test]
fn field_values_keep_their_json_type() {
    let err = fields!(
        "n" => 1.5,
        "flag" => false,
        "list" => json!(["a", "b"]),
        "nothing" => serde_json::Value::Null,
    )
    .error("e");
    let m = to_map(&err);
    assert_eq!(m["n"], 1.5);
    assert_eq!(m["flag"], false);
    assert_eq!(m["list"], json!(["a", "b"]));
    assert!(m["nothing"].is_null());
}
