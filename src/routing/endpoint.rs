use std::fmt;
use std::sync::Arc;

use crate::http::{BodyType, MediaType, Method, Request, Response, StatusCode};

/// Callback run for a matched request.
///
/// Returning an error (or panicking) turns into a 500 response.
pub type Handler = Arc<dyn Fn(&mut Request) -> anyhow::Result<Response> + Send + Sync>;

/// A registration for one `(path, method)` pair.
#[derive(Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub consumes: MediaType,
    pub produces: MediaType,
    pub request_body: BodyType,
    pub response_body: BodyType,
    pub(crate) handler: Handler,
}

impl Endpoint {
    /// Starts a registration. Both media types default to `text/plain` and
    /// both body types to [`BodyType::Any`].
    pub fn builder(method: Method, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder {
            method,
            path: path.into(),
            consumes: MediaType::TEXT_PLAIN,
            produces: MediaType::TEXT_PLAIN,
            request_body: BodyType::Any,
            response_body: BodyType::Any,
        }
    }

    pub fn get(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> EndpointBuilder {
        Self::builder(Method::DELETE, path)
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("request_body", &self.request_body)
            .field("response_body", &self.response_body)
            .finish_non_exhaustive()
    }
}

pub struct EndpointBuilder {
    method: Method,
    path: String,
    consumes: MediaType,
    produces: MediaType,
    request_body: BodyType,
    response_body: BodyType,
}

impl EndpointBuilder {
    pub fn consumes(mut self, media: MediaType) -> Self {
        self.consumes = media;
        self
    }

    pub fn produces(mut self, media: MediaType) -> Self {
        self.produces = media;
        self
    }

    /// Sets both the consumed and produced media type.
    pub fn media(self, media: MediaType) -> Self {
        self.consumes(media.clone()).produces(media)
    }

    pub fn request_body(mut self, ty: BodyType) -> Self {
        self.request_body = ty;
        self
    }

    pub fn response_body(mut self, ty: BodyType) -> Self {
        self.response_body = ty;
        self
    }

    /// Finishes the registration with its callback.
    pub fn handler<F>(self, handler: F) -> Endpoint
    where
        F: Fn(&mut Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        Endpoint {
            method: self.method,
            path: self.path,
            consumes: self.consumes,
            produces: self.produces,
            request_body: self.request_body,
            response_body: self.response_body,
            handler: Arc::new(handler),
        }
    }
}

/// Replaces every response carrying `status` with the output of its own
/// callback.
#[derive(Clone)]
pub struct StatusHandler {
    pub status: StatusCode,
    pub produces: MediaType,
    pub response_body: BodyType,
    pub(crate) handler: Handler,
}

impl StatusHandler {
    pub fn new<F>(status: StatusCode, produces: MediaType, handler: F) -> Self
    where
        F: Fn(&mut Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        Self {
            status,
            produces,
            response_body: BodyType::Any,
            handler: Arc::new(handler),
        }
    }

    pub fn response_body(mut self, ty: BodyType) -> Self {
        self.response_body = ty;
        self
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for StatusHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusHandler")
            .field("status", &self.status)
            .field("produces", &self.produces)
            .field("response_body", &self.response_body)
            .finish_non_exhaustive()
    }
}
