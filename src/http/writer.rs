use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::{
    CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, KEEP_ALIVE, SERVER, SET_COOKIE,
};
use crate::http::{MediaType, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("content encoding `{0}` is not supported")]
    UnsupportedEncoding(String),
    #[error("failed to compress body: {0}")]
    Compression(#[from] std::io::Error),
}

/// Connection level values written with every response.
#[derive(Debug, Clone)]
pub struct Framing<'a> {
    pub server_name: &'a str,
    pub keep_alive_timeout_secs: u64,
    /// Requests the connection will still accept, this one included
    pub keep_alive_remaining: u32,
    /// The connection closes after this response
    pub close: bool,
    /// Answering a `HEAD`: headers are computed as usual, the body is left out
    pub head_only: bool,
}

/// Serializes a response.
///
/// Lines come in this order: status line, default headers, caller headers
/// (sorted by name, overriding defaults of the same name), one `Set-Cookie`
/// line per cookie, then the computed `Content-Length` and `Content-Type`.
/// Caller supplied `Content-Length` and `Content-Type` are ignored. A
/// `Content-Encoding` containing `gzip` compresses `payload`. With
/// `head_only` the body bytes are dropped but still counted.
pub fn serialize_response(
    resp: &Response,
    produces: &MediaType,
    payload: &[u8],
    framing: &Framing<'_>,
) -> Result<Vec<u8>, WriteError> {
    let mut head: Vec<(String, String)> = if framing.close {
        vec![
            (SERVER.to_string(), framing.server_name.to_string()),
            (CONNECTION.to_string(), "close".to_string()),
        ]
    } else {
        vec![
            (
                KEEP_ALIVE.to_string(),
                format!(
                    "timeout={}, max={}",
                    framing.keep_alive_timeout_secs, framing.keep_alive_remaining
                ),
            ),
            (SERVER.to_string(), framing.server_name.to_string()),
            (CONNECTION.to_string(), "Keep-Alive".to_string()),
        ]
    };

    let mut caller: Vec<(&str, &str)> = resp
        .headers
        .iter()
        .filter(|(name, _)| {
            !name.eq_ignore_ascii_case(CONTENT_TYPE) && !name.eq_ignore_ascii_case(CONTENT_LENGTH)
        })
        .collect();
    caller.sort();
    for (name, value) in caller {
        match head.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value.to_string(),
            None => head.push((name.to_string(), value.to_string())),
        }
    }

    let body = encode_body(payload, resp.headers.get_ignore_case(CONTENT_ENCODING))?;

    let mut buf = Vec::with_capacity(256 + body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &head {
        push_header(&mut buf, k, v);
    }
    for cookie in &resp.cookies {
        push_header(&mut buf, SET_COOKIE, &cookie.to_string());
    }
    push_header(&mut buf, CONTENT_LENGTH, &body.len().to_string());
    push_header(&mut buf, CONTENT_TYPE, produces.as_str());

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if !framing.head_only {
        buf.extend_from_slice(&body);
    }

    Ok(buf)
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn encode_body(payload: &[u8], encoding: Option<&str>) -> Result<Vec<u8>, WriteError> {
    let Some(encoding) = encoding else {
        return Ok(payload.to_vec());
    };
    let has = |token: &str| {
        encoding
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    };

    if has("br") {
        return Err(WriteError::UnsupportedEncoding(encoding.to_string()));
    }
    if has("gzip") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload)?;
        return Ok(encoder.finish()?);
    }
    Ok(payload.to_vec())
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(
        response: &Response,
        produces: &MediaType,
        payload: &[u8],
        framing: &Framing<'_>,
    ) -> Result<Self, WriteError> {
        Ok(Self {
            buffer: serialize_response(response, produces, payload, framing)?,
            written: 0,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
