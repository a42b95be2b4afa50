use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::http::parser::{parse_request_head, split_head, ParseError, RequestHead};
use crate::http::reader;
use crate::http::request::{Method, Request};
use crate::http::writer::{Framing, ResponseWriter};
use crate::http::CookieJar;
use crate::routing::{self, Dispatched};
use crate::server::ServerContext;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<ServerContext>,
    jar: CookieJar,
    shutdown: watch::Receiver<bool>,
    served: u32,
    idle_since: Instant,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// Result of one bounded read attempt.
pub enum ReadOutcome {
    Request(Request),
    /// Nothing usable arrived in time, or a malformed head was dropped
    NoRequest,
    /// The peer closed the connection, or the stream can no longer be framed
    Closed,
}

enum Fill {
    Data,
    Eof,
    TimedOut,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        ctx: Arc<ServerContext>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            ctx,
            jar: CookieJar::new(),
            shutdown,
            served: 0,
            idle_since: Instant::now(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
            self.state = match state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => ConnectionState::Processing(req),
                    ReadOutcome::NoRequest if self.idle_expired() => {
                        debug!(peer = %self.peer, "closing idle connection");
                        ConnectionState::Closed
                    }
                    ReadOutcome::NoRequest => ConnectionState::Reading,
                    ReadOutcome::Closed => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive()
                        && self.served + 1 < self.ctx.config.keep_alive_max
                        && !self.stopping();
                    let writer = self.process(req, keep_alive).await?;
                    ConnectionState::Writing(writer, keep_alive)
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.served += 1;
                    self.idle_since = Instant::now();

                    if keep_alive {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Waits up to the read timeout for a complete request.
    pub async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let deadline = Instant::now() + self.ctx.config.read_timeout();

        loop {
            // Try parsing whatever we already have
            match parse_request_head(&self.buffer) {
                Ok(head) => return self.finish_request(head).await,

                Err(ParseError::Incomplete) => {
                    if self.buffer.len() > self.ctx.config.max_head_bytes {
                        warn!(peer = %self.peer, size = self.buffer.len(), "request head too large, discarding");
                        self.buffer.clear();
                        return Ok(ReadOutcome::NoRequest);
                    }
                }

                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "discarding malformed request");
                    match split_head(&self.buffer) {
                        Some((_, head_len)) => self.buffer.advance(head_len),
                        None => self.buffer.clear(),
                    }
                    return Ok(ReadOutcome::NoRequest);
                }
            }

            match self.fill(deadline).await? {
                Fill::Data => continue,
                Fill::Eof => return Ok(ReadOutcome::Closed),
                Fill::TimedOut => return Ok(ReadOutcome::NoRequest),
            }
        }
    }

    /// Collects the body of a parsed head and assembles the request.
    ///
    /// With a `Content-Length` the worker waits (bounded) for that many
    /// bytes; without one the body is whatever already arrived.
    async fn finish_request(&mut self, head: RequestHead) -> anyhow::Result<ReadOutcome> {
        let head_len = head.head_len;
        let declared = head.content_length().unwrap_or_else(|e| {
            warn!(peer = %self.peer, error = %e, "ignoring content length");
            None
        });

        let body_len = match declared {
            Some(len) => {
                let end = match head_len.checked_add(len) {
                    Some(end) if len <= self.ctx.config.max_body_bytes => end,
                    _ => {
                        // the stream can no longer be framed
                        warn!(peer = %self.peer, length = len, "request body too large, closing");
                        self.buffer.clear();
                        return Ok(ReadOutcome::Closed);
                    }
                };
                let deadline = Instant::now() + self.ctx.config.read_timeout();
                while self.buffer.len() < end {
                    match self.fill(deadline).await? {
                        Fill::Data => continue,
                        Fill::Eof | Fill::TimedOut => break,
                    }
                }
                len.min(self.buffer.len() - head_len)
            }
            None => self.buffer.len() - head_len,
        };

        let frame = self.buffer.split_to(head_len + body_len);
        let request = reader::assemble(head, &frame[head_len..], &self.ctx, &mut self.jar)?;
        Ok(ReadOutcome::Request(request))
    }

    async fn fill(&mut self, deadline: Instant) -> anyhow::Result<Fill> {
        match tokio::time::timeout_at(deadline, self.stream.read_buf(&mut self.buffer)).await {
            Err(_) => Ok(Fill::TimedOut),
            Ok(Ok(0)) => Ok(Fill::Eof),
            Ok(Ok(_)) => Ok(Fill::Data),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Routes the request off the async runtime and prepares the response.
    async fn process(&mut self, request: Request, keep_alive: bool) -> anyhow::Result<ResponseWriter> {
        let ctx = self.ctx.clone();
        let (request, dispatched) = tokio::task::spawn_blocking(move || {
            let mut request = request;
            let dispatched = ctx.router.dispatch(&mut request);
            (request, dispatched)
        })
        .await?;

        let Dispatched {
            mut response,
            produces,
            response_body,
        } = dispatched;
        response.cookies = routing::outgoing_cookies(&mut self.jar, &request, &response);

        let payload = match &response.body {
            Some(body) => self.ctx.codec.encode(body, response_body).unwrap_or_else(|e| {
                warn!(path = %request.path, error = %e, "could not encode response body");
                String::new()
            }),
            None => String::new(),
        };

        if self.ctx.config.log_requests {
            info!(
                peer = %self.peer,
                method = %request.method,
                path = %request.path,
                status = response.status.as_u16(),
                "request served"
            );
        }

        let framing = Framing {
            server_name: &self.ctx.config.server_name,
            keep_alive_timeout_secs: self.ctx.config.keep_alive_timeout_secs,
            keep_alive_remaining: self.ctx.config.keep_alive_max.saturating_sub(self.served),
            close: !keep_alive,
            head_only: request.method == Method::HEAD,
        };
        ResponseWriter::new(&response, &produces, payload.as_bytes(), &framing).map_err(|e| {
            error!(path = %request.path, error = %e, "could not write response");
            anyhow::Error::from(e)
        })
    }

    fn stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn idle_expired(&self) -> bool {
        self.stopping() || self.idle_since.elapsed() >= self.ctx.config.keep_alive_timeout()
    }
}
