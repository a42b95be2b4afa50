//! HTTP protocol implementation.
//!
//! This module implements an HTTP/1.1 server engine directly over TCP sockets,
//! with support for keep-alive connections, cookies and gzip bodies.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection worker implementing the request-response state machine
//! - **`parser`**: Splits raw bytes into message heads, query maps and cookies
//! - **`reader`**: Turns a parsed head and raw body into a routed [`Request`]
//! - **`request`** / **`response`**: The request and response data model
//! - **`writer`**: Serializes responses (status line, headers, cookies, body) onto the wire
//! - **`headers`**, **`cookie`**, **`media`**, **`status`**, **`body`**: plain value types
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait (bounded) for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route, run the endpoint, settle cookies
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod body;
pub mod connection;
pub mod cookie;
pub mod entity;
pub mod headers;
pub mod media;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;

pub use body::{Body, BodyType};
pub use cookie::{Cookie, CookieJar};
pub use entity::Entity;
pub use headers::Headers;
pub use media::MediaType;
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
pub use status::StatusCode;
