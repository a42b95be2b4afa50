use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::codec::CodecError;
use crate::http::headers::CONTENT_LENGTH;
use crate::http::{Body, Cookie, Entity, Headers};
use crate::session::{Session, SessionStore};

/// HTTP request methods.
///
/// Every method is routable; an endpoint is registered for exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// TRACE - Message loop-back test
    TRACE,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use restwire::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a parsed HTTP request from a client.
///
/// The body has already been decoded according to the matched endpoint's
/// declared body type; for form-urlencoded endpoints the form fields are
/// merged into `query` and `body` stays empty.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path without the query string (e.g. "/index.html")
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Query (and form) parameters
    pub query: HashMap<String, String>,
    pub headers: Headers,
    pub body: Option<Body>,
    /// Cookies known to the connection, the session cookie excluded
    pub cookies: Vec<Cookie>,
    session: Option<Session>,
    store: Option<Arc<SessionStore>>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    query: HashMap<String, String>,
    headers: Headers,
    body: Option<Body>,
    cookies: Vec<Cookie>,
    session: Option<Session>,
    store: Option<Arc<SessionStore>>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            query: HashMap::new(),
            headers: Headers::new(),
            body: None,
            cookies: Vec::new(),
            session: None,
            store: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query_map(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn maybe_body(mut self, body: Option<Body>) -> Self {
        self.body = body;
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Store used when a handler asks for a session the client does not have.
    pub fn sessions(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            query: self.query,
            headers: self.headers,
            body: self.body,
            cookies: self.cookies,
            session: self.session,
            store: self.store,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.headers
            .get_ignore_case(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// Only an explicit `Connection: close` ends the connection.
    pub fn keep_alive(&self) -> bool {
        self.headers
            .connection()
            .map(|v| !v.trim().eq_ignore_ascii_case("close"))
            .unwrap_or(true)
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Reads the body into a typed value.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        self.body.as_ref().ok_or(CodecError::MissingBody)?.deserialize()
    }

    /// Returns the client's session, creating and registering a new one if the
    /// request did not carry a valid session cookie or it was invalidated.
    pub fn session(&mut self) -> Session {
        if let Some(session) = self.session.as_ref().filter(|s| s.is_valid()) {
            return session.clone();
        }
        let session = match &self.store {
            Some(store) => store.create(),
            None => Session::new(),
        };
        self.session = Some(session.clone());
        session
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The attached session, without creating one.
    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub(crate) fn attach_session(&mut self, session: Session) {
        self.session = Some(session);
    }
}

impl Entity for Request {
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

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.path, self.version)
    }
}
