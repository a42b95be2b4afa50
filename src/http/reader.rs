//! Builds a routed [`Request`] from a parsed head and its raw body.

use tracing::{debug, warn};

use crate::http::parser::{parse_query, request_cookies, RequestHead};
use crate::http::{CookieJar, Request};
use crate::server::ServerContext;
use crate::session::SESSION_COOKIE;

/// Assembles the request a handler will see.
///
/// - the query string becomes the parameter map
/// - the session cookie is resolved against the session store and attached
///   only when the session is still valid; every other cookie goes into the
///   connection `jar`, and the request sees the whole jar
/// - the body is decoded following the endpoint registered for the path and
///   method: form-urlencoded bodies are merged into the parameters, anything
///   else goes through the server codec with the declared body type
pub fn assemble(
    head: RequestHead,
    raw_body: &[u8],
    ctx: &ServerContext,
    jar: &mut CookieJar,
) -> anyhow::Result<Request> {
    let decode = ctx.config.decode_query;
    let mut query = head
        .query
        .as_deref()
        .map(|q| parse_query(q, decode))
        .unwrap_or_default();

    let mut session = None;
    for cookie in request_cookies(&head.headers) {
        if cookie.name == SESSION_COOKIE {
            session = ctx.sessions.get_str(&cookie.value).filter(|s| s.is_valid());
            if session.is_none() {
                debug!(id = %cookie.value, "ignoring unknown or invalidated session");
            }
        } else {
            jar.add(cookie);
        }
    }

    let raw = String::from_utf8_lossy(raw_body);
    let body = match ctx.router.endpoint(&head.path, head.method) {
        Some(endpoint) if endpoint.consumes.is_form_urlencoded() => {
            query.extend(parse_query(raw.trim(), decode));
            None
        }
        Some(endpoint) => match ctx.codec.decode(&raw, endpoint.request_body) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %head.path, error = %e, "could not decode request body");
                None
            }
        },
        None => None,
    };

    let mut builder = Request::builder()
        .method(head.method)
        .path(head.path)
        .version(head.version)
        .headers(head.headers)
        .query_map(query)
        .maybe_body(body)
        .cookies(jar.to_vec())
        .sessions(ctx.sessions.clone());
    if let Some(session) = session {
        builder = builder.session(session);
    }

    builder.build().map_err(anyhow::Error::msg)
}
