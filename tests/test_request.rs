use std::sync::Arc;

use restwire::http::request::{Method, Request, RequestBuilder};
use restwire::http::{Body, Cookie, Entity};
use restwire::session::SessionStore;
use serde::Deserialize;

fn get(path: &str) -> RequestBuilder {
    RequestBuilder::new().method(Method::GET).path(path)
}

#[test]
fn test_request_header_retrieval() {
    let req = get("/")
        .header("Host", "example.com")
        .header("Content-Type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let req = get("/api").header("Content-Length", "42").build().unwrap();

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = get("/").build().unwrap();

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    let req = get("/api").header("Content-Length", "not-a-number").build().unwrap();

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_keep_alive_default() {
    let req = get("/").build().unwrap();

    assert!(req.keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    let req = get("/").header("Connection", "close").build().unwrap();

    assert!(!req.keep_alive());
}

#[test]
fn test_request_keep_alive_explicit() {
    let req = get("/").header("connection", "Keep-Alive").build().unwrap();

    assert!(req.keep_alive());
}

#[test]
fn test_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_builder_defaults() {
    let req = get("/").build().unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert!(req.body.is_none());
    assert!(req.query.is_empty());
    assert_eq!(req.header("Accept"), Some("*/*"));
}

#[test]
fn test_method_from_str() {
    assert_eq!(Method::from_str("TRACE"), Some(Method::TRACE));
    assert_eq!(Method::from_str("patch"), None);
    assert_eq!(Method::DELETE.to_string(), "DELETE");
}

#[test]
fn test_query_param_lookup() {
    let req = get("/GetUsername").query("id", "2").build().unwrap();

    assert_eq!(req.query_param("id"), Some("2"));
    assert_eq!(req.query_param("name"), None);
}

#[test]
fn test_cookie_lookup_through_entity() {
    let req = get("/")
        .cookie(Cookie::new("theme", "dark"))
        .cookie(Cookie::new("lang", "en"))
        .build()
        .unwrap();

    assert_eq!(req.cookie("lang").unwrap().value, "en");
    assert!(req.cookie("missing").is_none());
}

#[derive(Deserialize)]
struct Lookup {
    id: usize,
}

#[test]
fn test_body_as_typed_value() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/GetEmployee")
        .body(Body::Json(serde_json::json!({"id": 3})))
        .build()
        .unwrap();

    let lookup: Lookup = req.body_as().unwrap();
    assert_eq!(lookup.id, 3);

    let empty = get("/").build().unwrap();
    assert!(empty.body_as::<Lookup>().is_err());
}

#[test]
fn test_session_created_lazily_in_store() {
    let store = Arc::new(SessionStore::new());
    let mut req: Request = get("/").sessions(store.clone()).build().unwrap();

    assert!(!req.has_session());
    let session = req.session();
    assert!(req.has_session());
    assert!(store.get(&session.id()).is_some());

    // asking again returns the same session
    assert!(req.session().same_as(&session));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_invalidated_session_is_replaced() {
    let store = Arc::new(SessionStore::new());
    let mut req: Request = get("/").sessions(store.clone()).build().unwrap();

    let first = req.session();
    first.invalidate();
    let second = req.session();

    assert!(!second.same_as(&first));
    assert!(second.is_valid());
    assert_eq!(store.list_active().len(), 1);
}
