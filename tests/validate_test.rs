//! Request validation through the middleware with the default parser.

use std::sync::Arc;

use route_apispec::types::Location;
use route_apispec::{
    Endpoint, Field, FieldKind, HandlerTable, Rejection, Request, RequestSchema, Schema,
    ValidateError, ValidationMiddleware, ViewHandlers,
};
use serde_json::json;

fn request_schema() -> Schema {
    Schema::new("RequestSchema")
        .field(Field::integer("id").required())
        .field(Field::string("name"))
        .field(Field::boolean("bool_field"))
        .field(Field::list("list_field", FieldKind::Integer))
}

fn endpoint(method: &str, handler: &str) -> Endpoint {
    Endpoint::Function {
        method: method.into(),
        handler: handler.into(),
    }
}

fn middleware(table: HandlerTable) -> ValidationMiddleware {
    ValidationMiddleware::new(Arc::new(table), "data")
}

#[test]
fn query_values_are_coerced() {
    let mut table = HandlerTable::new();
    table.querystring_schema("h", request_schema()).unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET")
        .query_string("id=7&name=max&bool_field=true&list_field=1&list_field=2");
    mw.handle(&endpoint("GET", "h"), &mut req).unwrap();

    assert_eq!(
        req.get("data"),
        Some(&json!({ "id": 7, "name": "max", "bool_field": true, "list_field": [1, 2] }))
    );
}

#[test]
fn missing_required_field_rejected() {
    let mut table = HandlerTable::new();
    table.querystring_schema("h", request_schema()).unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET").query_string("name=max");
    let rejection = mw.handle(&endpoint("GET", "h"), &mut req).unwrap_err();

    assert_eq!(rejection.status, 422);
    let messages = rejection.body["querystring"]["_schema"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].as_str().unwrap().contains("id"));
    assert!(req.get("data").is_none());
}

#[test]
fn bad_integer_reports_field() {
    let mut table = HandlerTable::new();
    table.querystring_schema("h", request_schema()).unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET").query_string("id=seven");
    let rejection = mw.handle(&endpoint("GET", "h"), &mut req).unwrap_err();
    assert_eq!(
        rejection.body,
        json!({ "querystring": { "id": ["Not a valid integer."] } })
    );
}

#[test]
fn partial_schema_allows_missing_fields() {
    let mut table = HandlerTable::new();
    table
        .json_schema("patch", request_schema().partial())
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("PATCH").body(r#"{"name": "renamed"}"#);
    mw.handle(&endpoint("PATCH", "patch"), &mut req).unwrap();
    assert_eq!(req.get("data"), Some(&json!({ "name": "renamed" })));
}

#[test]
fn json_body_type_errors() {
    let mut table = HandlerTable::new();
    table.json_schema("post", request_schema()).unwrap();
    let mw = middleware(table);

    let mut req = Request::new("POST").body(r#"{"id": "x"}"#);
    let rejection = mw.handle(&endpoint("POST", "post"), &mut req).unwrap_err();
    assert_eq!(rejection.status, 422);
    assert!(rejection.body["json"].get("id").is_some());
}

#[test]
fn malformed_body_is_bad_request() {
    let mut table = HandlerTable::new();
    table.json_schema("post", request_schema()).unwrap();
    let mw = middleware(table);

    let mut req = Request::new("POST").body("{not json");
    let rejection = mw.handle(&endpoint("POST", "post"), &mut req).unwrap_err();
    assert_eq!(rejection.status, 400);
}

#[test]
fn put_into_slots_are_separate() {
    let mut table = HandlerTable::new();
    table
        .request_schema(
            "h",
            RequestSchema::new(Schema::new("Auth").field(Field::string("x-token").required()))
                .location(Location::Headers)
                .put_into("auth"),
        )
        .unwrap()
        .json_schema("h", Schema::new("Body").field(Field::integer("count")))
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("POST")
        .header("X-Token", "secret")
        .body(r#"{"count": 3}"#);
    mw.handle(&endpoint("POST", "h"), &mut req).unwrap();

    assert_eq!(req.get("auth"), Some(&json!({ "x-token": "secret" })));
    assert_eq!(req.get("data"), Some(&json!({ "count": 3 })));
}

#[test]
fn later_mapping_overwrites_earlier() {
    let mut table = HandlerTable::new();
    table
        .querystring_schema("h", Schema::new("Q").field(Field::integer("page")))
        .unwrap()
        .match_info_schema("h", Schema::new("P").field(Field::integer("id")))
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET")
        .query_param("page", "2")
        .match_param("id", "9");
    mw.handle(&endpoint("GET", "h"), &mut req).unwrap();
    assert_eq!(req.get("data"), Some(&json!({ "id": 9 })));
}

#[test]
fn empty_location_keeps_previous_result() {
    let mut table = HandlerTable::new();
    table
        .querystring_schema("h", Schema::new("Q").field(Field::integer("page")))
        .unwrap()
        .cookies_schema("h", Schema::new("C").field(Field::string("session")))
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET").query_param("page", "2");
    mw.handle(&endpoint("GET", "h"), &mut req).unwrap();
    assert_eq!(req.get("data"), Some(&json!({ "page": 2 })));
}

#[test]
fn nothing_parsed_stores_empty_list() {
    let mut table = HandlerTable::new();
    table
        .querystring_schema("h", Schema::new("Q").field(Field::integer("page")))
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("GET");
    mw.handle(&endpoint("GET", "h"), &mut req).unwrap();
    assert_eq!(req.get("data"), Some(&json!([])));
}

#[test]
fn view_selects_sub_handler_by_method() {
    let mut table = HandlerTable::new();
    table
        .json_schema("Echo.post", Schema::new("Body").field(Field::integer("n").required()))
        .unwrap();
    let mw = middleware(table);
    let view = Endpoint::View(
        ViewHandlers::new()
            .method("get", "Echo.get")
            .method("post", "Echo.post"),
    );

    let mut get = Request::new("GET");
    mw.handle(&view, &mut get).unwrap();
    assert!(get.get("data").is_none());

    let mut post = Request::new("POST").body("{}");
    assert!(mw.handle(&view, &mut post).is_err());
}

#[test]
fn custom_error_callback() {
    let mut table = HandlerTable::new();
    table.querystring_schema("h", request_schema()).unwrap();
    let mw = middleware(table).with_error_callback(|err: &ValidateError| Rejection {
        status: 400,
        body: json!({ "error": err.to_string() }),
    });

    let mut req = Request::new("GET");
    let rejection = mw.handle(&endpoint("GET", "h"), &mut req).unwrap_err();
    assert_eq!(rejection.status, 400);
    assert_eq!(
        rejection.body["error"],
        "validation failed for querystring with 1 error(s)"
    );
}

#[test]
fn custom_data_name() {
    let mut table = HandlerTable::new();
    table
        .json_schema("h", Schema::new("Body").field(Field::string("s")))
        .unwrap();
    let mw = ValidationMiddleware::new(Arc::new(table), "payload");

    let mut req = Request::new("POST").body(r#"{"s": "v"}"#);
    mw.handle(&endpoint("POST", "h"), &mut req).unwrap();
    assert_eq!(req.get("payload"), Some(&json!({ "s": "v" })));
    assert!(req.get("data").is_none());
}

#[test]
fn undeclared_body_field_rejected() {
    let mut table = HandlerTable::new();
    table
        .json_schema("post", Schema::new("Body").field(Field::string("name").required()))
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("POST").body(r#"{"name": "n", "is_admin": true}"#);
    let rejection = mw.handle(&endpoint("POST", "post"), &mut req).unwrap_err();
    assert_eq!(rejection.status, 422);
    let messages = rejection.body["json"]["_schema"].as_array().unwrap();
    assert!(messages[0].as_str().unwrap().contains("is_admin"));
    assert!(req.get("data").is_none());
}

#[test]
fn malformed_body_keyed_by_declared_location() {
    let mut table = HandlerTable::new();
    table
        .request_schema(
            "post",
            RequestSchema::new(request_schema()).location(Location::Body),
        )
        .unwrap();
    let mw = middleware(table);

    let mut req = Request::new("POST").body("{not json");
    let rejection = mw.handle(&endpoint("POST", "post"), &mut req).unwrap_err();
    assert_eq!(rejection.status, 400);
    assert_eq!(
        rejection.body,
        json!({ "body": { "_schema": ["Invalid JSON body."] } })
    );
}
