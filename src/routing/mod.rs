//! Exact-match routing.
//!
//! Endpoints are keyed by literal path and method. Registering the same pair
//! twice replaces the first registration. After an endpoint has produced its
//! response, a status handler registered for the response status replaces it
//! (once, never recursively).

pub mod endpoint;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info};

use crate::http::{BodyType, Cookie, CookieJar, MediaType, Method, Request, Response, StatusCode};

pub use endpoint::{Endpoint, EndpointBuilder, Handler, StatusHandler};

/// Outcome of dispatching a request.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Response,
    /// Media type written as `Content-Type`
    pub produces: MediaType,
    /// Shape the codec encodes the body as
    pub response_body: BodyType,
}

#[derive(Debug, Default)]
pub struct Router {
    endpoints: RwLock<HashMap<String, HashMap<Method, Arc<Endpoint>>>>,
    status_handlers: RwLock<HashMap<StatusCode, Arc<StatusHandler>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint, returning the one it replaced.
    pub fn register(&self, endpoint: Endpoint) -> Option<Arc<Endpoint>> {
        info!(method = %endpoint.method, path = %endpoint.path, "registering endpoint");
        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint.path.clone())
            .or_default()
            .insert(endpoint.method, Arc::new(endpoint))
    }

    /// Registers a status handler, returning the one it replaced.
    pub fn register_status_handler(&self, handler: StatusHandler) -> Option<Arc<StatusHandler>> {
        info!(status = handler.status.as_u16(), "registering response handler");
        self.status_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handler.status, Arc::new(handler))
    }

    pub fn endpoint(&self, path: &str, method: Method) -> Option<Arc<Endpoint>> {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .and_then(|methods| methods.get(&method))
            .cloned()
    }

    pub fn status_handler(&self, status: StatusCode) -> Option<Arc<StatusHandler>> {
        self.status_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&status)
            .cloned()
    }

    /// Every registered `(method, path)` pair, sorted.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let endpoints = self.endpoints.read().unwrap_or_else(PoisonError::into_inner);
        let mut routes: Vec<_> = endpoints
            .iter()
            .flat_map(|(path, methods)| methods.keys().map(move |m| (*m, path.clone())))
            .collect();
        routes.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        routes
    }

    /// Runs the endpoint matching `request`, then the status handler for the
    /// resulting status if there is one.
    ///
    /// An unknown route yields an empty 404 produced as `text/plain`. Any
    /// session the callbacks create is attached to `request` afterwards.
    pub fn dispatch(&self, request: &mut Request) -> Dispatched {
        let mut dispatched = match self.endpoint(&request.path, request.method) {
            Some(endpoint) => Dispatched {
                response: invoke(&endpoint.handler, request),
                produces: endpoint.produces.clone(),
                response_body: endpoint.response_body,
            },
            None => {
                debug!(method = %request.method, path = %request.path, "no endpoint registered");
                Dispatched {
                    response: Response::new(StatusCode::NOT_FOUND),
                    produces: MediaType::TEXT_PLAIN,
                    response_body: BodyType::Any,
                }
            }
        };

        if let Some(handler) = self.status_handler(dispatched.response.status) {
            debug!(status = handler.status.as_u16(), "replacing response");
            dispatched = Dispatched {
                response: invoke(&handler.handler, request),
                produces: handler.produces.clone(),
                response_body: handler.response_body,
            };
        }

        dispatched
    }
}

/// Calls `handler` on a copy of `request` and copies the session it ended up
/// with back. Failures become an empty 500.
fn invoke(handler: &Handler, request: &mut Request) -> Response {
    let mut scoped = request.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&mut scoped)));

    if let Some(session) = scoped.current_session() {
        request.attach_session(session.clone());
    }

    match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!(path = %request.path, error = %e, "endpoint failed");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            error!(path = %request.path, "endpoint panicked");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Settles the cookies sent back with `response`.
///
/// Response cookies are merged into the connection jar first; the result is
/// the jar's content plus the session cookie when the request holds a valid
/// session.
pub fn outgoing_cookies(jar: &mut CookieJar, request: &Request, response: &Response) -> Vec<Cookie> {
    jar.extend(response.cookies.iter().cloned());
    let mut cookies = jar.to_vec();
    if let Some(session) = request.current_session().filter(|s| s.is_valid()) {
        cookies.push(session.to_cookie());
    }
    cookies
}
