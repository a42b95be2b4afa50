//! Restwire - Lightweight REST server
//!
//! An HTTP/1.1 server and exact-match routing engine over raw TCP, with
//! keep-alive connections, cookies, server side sessions and pluggable body
//! codecs.

pub mod codec;
pub mod config;
pub mod http;
pub mod routing;
pub mod server;
pub mod session;

pub use config::Config;
pub use server::Server;
