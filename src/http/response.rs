use serde::Serialize;

use crate::codec::CodecError;
use crate::http::headers::CONTENT_ENCODING;
use crate::http::{Body, Cookie, Entity, Headers, StatusCode};

/// An HTTP response produced by an endpoint callback.
///
/// `Content-Type` and `Content-Length` are computed on the wire, so setting
/// them here has no effect.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: Headers,
    /// Undecoded body, encoded by the server codec when written
    pub body: Option<Body>,
    /// Cookies to set on the client
    pub cookies: Vec<Cookie>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use restwire::http::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::CREATED)
///     .header("X-Request-Id", "42")
///     .body("created")
///     .build();
/// assert_eq!(response.status, StatusCode::CREATED);
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Option<Body>,
    cookies: Vec<Cookie>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
            cookies: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body serialized from `value`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, CodecError> {
        self.body = Some(Body::json(value)?);
        Ok(self)
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Asks the writer to compress the body, e.g. `"gzip"`.
    pub fn content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.headers.insert(CONTENT_ENCODING, encoding);
        self
    }

    /// Builds the final Response.
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            cookies: self.cookies,
        }
    }
}

impl Response {
    /// Creates a response with the given status and no body.
    pub fn new(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        ResponseBuilder::new(StatusCode::OK).body(body).build()
    }

    /// Creates a 200 OK response with a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        Ok(ResponseBuilder::new(StatusCode::OK).json(value)?.build())
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NOT_FOUND)
            .body("404 Not Found")
            .build()
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
            .body("500 Internal Server Error")
            .build()
    }

    /// Same response with a different status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }
}

impl Entity for Response {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}
