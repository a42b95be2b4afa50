use std::io::Read;

use flate2::read::GzDecoder;
use restwire::codec::{BodyCodec, JsonCodec};
use restwire::http::parser::parse_http_response;
use restwire::http::writer::{Framing, ResponseWriter, WriteError, serialize_response};
use restwire::http::{Body, BodyType, Cookie, MediaType, Response, ResponseBuilder, StatusCode};

fn keep_alive() -> Framing<'static> {
    Framing {
        server_name: "test-server",
        keep_alive_timeout_secs: 5,
        keep_alive_remaining: 99,
        close: false,
        head_only: false,
    }
}

fn wire(resp: &Response, produces: &MediaType, payload: &str) -> String {
    let bytes = serialize_response(resp, produces, payload.as_bytes(), &keep_alive()).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::CREATED.as_u16(), 201);
    assert_eq!(StatusCode::NO_CONTENT.as_u16(), 204);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED.as_u16(), 405);
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::NO_CONTENT.reason_phrase(), "No Content");
    assert_eq!(StatusCode::IM_A_TEAPOT.reason_phrase(), "I'm a teapot");
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .body("Hello, World!")
        .build();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Some(Body::text("Hello, World!")));
}

#[test]
fn test_response_builder_with_headers_and_cookies() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .header("X-Custom", "value")
        .cookie(Cookie::new("a", "1"))
        .build();

    assert_eq!(response.headers.get("X-Custom").unwrap(), "value");
    assert_eq!(response.cookies.len(), 1);
}

#[test]
fn test_response_helpers() {
    assert_eq!(Response::not_found().status, StatusCode::NOT_FOUND);
    assert_eq!(Response::internal_error().status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(Response::ok("x").with_status(StatusCode::ACCEPTED).status, StatusCode::ACCEPTED);
    assert!(Response::new(StatusCode::NO_CONTENT).body.is_none());
}

#[test]
fn test_serialize_line_order() {
    let mut response = ResponseBuilder::new(StatusCode::OK)
        .header("X-B", "2")
        .header("X-A", "1")
        .build();
    response.set_cookie(Cookie::new("c", "3").path("/"));

    let text = wire(&response, &MediaType::TEXT_PLAIN, "hello");
    let lines: Vec<&str> = text.split("\r\n").collect();

    assert_eq!(lines[0], "HTTP/1.1 200 OK");
    assert_eq!(lines[1], "Keep-Alive: timeout=5, max=99");
    assert_eq!(lines[2], "Server: test-server");
    assert_eq!(lines[3], "Connection: Keep-Alive");
    // caller headers, sorted: Accept, Cache-Control, X-A, X-B
    assert_eq!(lines[4], "Accept: */*");
    assert_eq!(lines[5], "Cache-Control: no-cache");
    assert_eq!(lines[6], "X-A: 1");
    assert_eq!(lines[7], "X-B: 2");
    assert_eq!(lines[8], "Set-Cookie: c=3; Path=/");
    assert_eq!(lines[9], "Content-Length: 5");
    assert_eq!(lines[10], "Content-Type: text/plain");
    assert_eq!(lines[11], "");
    assert_eq!(lines[12], "hello");
}

#[test]
fn test_serialize_ignores_caller_content_headers() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .header("Content-Type", "text/csv")
        .header("Content-Length", "999")
        .build();

    let text = wire(&response, &MediaType::APPLICATION_JSON, "{}");

    assert!(!text.contains("text/csv"));
    assert!(!text.contains("999"));
    assert!(text.contains("Content-Length: 2\r\n"));
    assert!(text.contains("Content-Type: application/json\r\n"));
}

#[test]
fn test_caller_headers_override_defaults() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .header("Server", "custom")
        .build();

    let text = wire(&response, &MediaType::TEXT_PLAIN, "");

    assert!(text.contains("Server: custom\r\n"));
    assert!(!text.contains("test-server"));
    assert!(text.contains("Content-Length: 0\r\n"));
}

#[test]
fn test_closing_connection_framing() {
    let framing = Framing {
        close: true,
        ..keep_alive()
    };
    let bytes = serialize_response(&Response::ok("x"), &MediaType::TEXT_PLAIN, b"x", &framing).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains("Connection: close\r\n"));
    assert!(!text.contains("Keep-Alive:"));
}

#[test]
fn test_keep_alive_advertises_remaining_requests() {
    let framing = Framing {
        keep_alive_remaining: 7,
        ..keep_alive()
    };
    let bytes = serialize_response(&Response::ok("x"), &MediaType::TEXT_PLAIN, b"x", &framing).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains("Keep-Alive: timeout=5, max=7\r\n"));
}

#[test]
fn test_head_only_keeps_length_but_drops_body() {
    let framing = Framing {
        head_only: true,
        ..keep_alive()
    };
    let bytes = serialize_response(&Response::ok("hello"), &MediaType::TEXT_PLAIN, b"hello", &framing).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
    assert!(!text.contains("hello"));
}

#[test]
fn test_gzip_body_is_compressed() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .content_encoding("gzip")
        .build();
    let payload = "compress me ".repeat(50);

    let bytes = serialize_response(&response, &MediaType::TEXT_PLAIN, payload.as_bytes(), &keep_alive()).unwrap();
    let split = bytes.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let head = String::from_utf8_lossy(&bytes[..split]);

    let mut decoded = String::new();
    GzDecoder::new(&bytes[split..]).read_to_string(&mut decoded).unwrap();
    assert_eq!(decoded, payload);
    assert!(head.contains(&format!("Content-Length: {}\r\n", bytes.len() - split)));
    assert!(head.contains("Content-Encoding: gzip\r\n"));
}

#[test]
fn test_brotli_is_rejected() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .content_encoding("br")
        .build();

    let result = serialize_response(&response, &MediaType::TEXT_PLAIN, b"x", &keep_alive());

    assert!(matches!(result, Err(WriteError::UnsupportedEncoding(_))));
}

#[test]
fn test_written_response_parses_back() {
    let response = ResponseBuilder::new(StatusCode::CREATED)
        .cookie(Cookie::new("token", "abc").http_only(true))
        .content_encoding("gzip")
        .json(&serde_json::json!({"name": "Nick"}))
        .unwrap()
        .build();
    let payload = JsonCodec
        .encode(response.body.as_ref().unwrap(), BodyType::Json)
        .unwrap();
    let writer = ResponseWriter::new(
        &response,
        &MediaType::APPLICATION_JSON,
        payload.as_bytes(),
        &keep_alive(),
    )
    .unwrap();

    let (raw, consumed) = parse_http_response(writer.bytes()).unwrap();
    assert_eq!(consumed, writer.bytes().len());
    assert_eq!(raw.status, StatusCode::CREATED);
    assert_eq!(raw.headers.get("Content-Type"), Some("application/json"));
    assert_eq!(raw.cookies, vec![Cookie::new("token", "abc").http_only(true)]);

    let parsed = raw.into_response(&JsonCodec, BodyType::Json);
    assert_eq!(parsed.body, Some(Body::Json(serde_json::json!({"name": "Nick"}))));
}

#[tokio::test]
async fn test_writer_streams_all_bytes() {
    let mut writer = ResponseWriter::new(
        &Response::ok("streamed"),
        &MediaType::TEXT_PLAIN,
        b"streamed",
        &keep_alive(),
    )
    .unwrap();
    let expected = writer.bytes().to_vec();

    let mut sink: Vec<u8> = Vec::new();
    writer.write_to_stream(&mut sink).await.unwrap();

    assert_eq!(sink, expected);
}
