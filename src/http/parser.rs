use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::codec::BodyCodec;
use crate::http::headers::{CONTENT_ENCODING, CONTENT_LENGTH, COOKIE, SET_COOKIE};
use crate::http::request::Method;
use crate::http::{BodyType, Cookie, Headers, Response, StatusCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("incomplete message head")]
    Incomplete,
    #[error("malformed request line")]
    InvalidRequest,
    #[error("unknown method `{0}`")]
    InvalidMethod(String),
    #[error("message head has no header lines")]
    MissingHeaders,
    #[error("malformed status line")]
    InvalidStatus,
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("undecodable body: {0}")]
    InvalidBody(String),
}

/// Request line and headers of an incoming request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    /// Raw query string, without the `?`
    pub query: Option<String>,
    pub version: String,
    pub headers: Headers,
    /// Offset of the first body byte in the parsed buffer
    pub head_len: usize,
}

impl RequestHead {
    /// Declared body length. `Ok(None)` when the header is absent.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        self.headers
            .get_ignore_case(CONTENT_LENGTH)
            .map(|v| v.trim().parse().map_err(|_| ParseError::InvalidContentLength))
            .transpose()
    }
}

/// Splits a message head into lines.
///
/// `\r` bytes are dropped, `\n` closes a line and an empty line ends the head.
/// Returns the trimmed lines and the offset just past the terminating empty
/// line, or `None` when the head is not complete yet.
pub fn split_head(buf: &[u8]) -> Option<(Vec<String>, usize)> {
    let mut lines = Vec::new();
    let mut line = Vec::new();

    for (i, &b) in buf.iter().enumerate() {
        match b {
            b'\r' => {}
            b'\n' if line.is_empty() => return Some((lines, i + 1)),
            b'\n' => {
                lines.push(String::from_utf8_lossy(&line).trim().to_string());
                line.clear();
            }
            _ => line.push(b),
        }
    }

    None
}

/// Parses the head of a request.
///
/// A head needs the request line plus at least one header line. Header lines
/// without a `:` are ignored.
pub fn parse_request_head(buf: &[u8]) -> Result<RequestHead, ParseError> {
    let (lines, head_len) = split_head(buf).ok_or(ParseError::Incomplete)?;
    if lines.len() < 2 {
        return Err(ParseError::MissingHeaders);
    }

    let mut parts = lines[0].split_whitespace();
    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().unwrap_or("HTTP/1.1");

    let method = Method::from_str(method_str)
        .ok_or_else(|| ParseError::InvalidMethod(method_str.to_string()))?;

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };

    let mut headers = Headers::new();
    for line in &lines[1..] {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim(), value.trim());
        }
    }

    Ok(RequestHead {
        method,
        path: path.to_string(),
        query,
        version: version.to_string(),
        headers,
        head_len,
    })
}

/// Parses `k=v&k2=v2` pairs. Pairs without `=` are skipped and the last
/// duplicate wins. Values are percent-decoded only when `decode` is set.
pub fn parse_query(query: &str, decode: bool) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if decode {
            if let Some((k, v)) = url::form_urlencoded::parse(pair.as_bytes()).next() {
                params.insert(k.into_owned(), v.into_owned());
            }
        } else {
            params.insert(key.to_string(), value.to_string());
        }
    }

    params
}

/// Splits a `Cookie` request header into its cookies.
pub fn parse_cookie_header(value: &str) -> Vec<Cookie> {
    value.split(';').filter_map(Cookie::parse).collect()
}

/// Cookies sent in the `Cookie` header of a request head.
pub fn request_cookies(headers: &Headers) -> Vec<Cookie> {
    headers
        .get_ignore_case(COOKIE)
        .map(parse_cookie_header)
        .unwrap_or_default()
}

/// A response as read back from the wire, body still undecoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub version: String,
    pub headers: Headers,
    pub cookies: Vec<Cookie>,
    /// Body bytes, already gunzipped when `Content-Encoding` says gzip
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body with `codec` into a full [`Response`].
    ///
    /// A body the codec cannot decode is dropped.
    pub fn into_response(self, codec: &dyn BodyCodec, ty: BodyType) -> Response {
        let body = codec.decode(&self.body_text(), ty).ok().flatten();
        Response {
            status: self.status,
            headers: self.headers,
            body,
            cookies: self.cookies,
        }
    }
}

/// Parses a serialized response, returning it with the number of bytes used.
///
/// Without `Content-Length` the rest of the buffer is the body. Each
/// `Set-Cookie` line becomes one cookie.
pub fn parse_http_response(buf: &[u8]) -> Result<(RawResponse, usize), ParseError> {
    let (lines, head_len) = split_head(buf).ok_or(ParseError::Incomplete)?;
    let status_line = lines.first().ok_or(ParseError::InvalidStatus)?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(ParseError::InvalidStatus)?;
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(StatusCode::from_u16)
        .ok_or(ParseError::InvalidStatus)?;

    let mut headers = Headers::empty();
    let mut cookies = Vec::new();
    for line in &lines[1..] {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.eq_ignore_ascii_case(SET_COOKIE) {
            cookies.extend(Cookie::parse_set_cookie(value));
        } else {
            headers.insert(key, value);
        }
    }

    let rest = &buf[head_len..];
    let body_len = match headers.get_ignore_case(CONTENT_LENGTH) {
        Some(v) => v.trim().parse::<usize>().map_err(|_| ParseError::InvalidContentLength)?,
        None => rest.len(),
    };
    if rest.len() < body_len {
        return Err(ParseError::Incomplete);
    }

    let mut body = rest[..body_len].to_vec();
    let gzipped = headers
        .get_ignore_case(CONTENT_ENCODING)
        .is_some_and(|e| e.split(',').any(|t| t.trim().eq_ignore_ascii_case("gzip")));
    if gzipped && !body.is_empty() {
        let mut decoded = Vec::new();
        GzDecoder::new(body.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|e| ParseError::InvalidBody(e.to_string()))?;
        body = decoded;
    }

    let response = RawResponse {
        status,
        version: version.to_string(),
        headers,
        cookies,
        body,
    };
    Ok((response, head_len + body_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let head = parse_request_head(req).unwrap();

        assert_eq!(head.path, "/");
        assert_eq!(head.headers.get("Host").unwrap(), "example.com");
        assert_eq!(head.head_len, req.len());
    }

    #[test]
    fn split_head_drops_carriage_returns() {
        let (lines, len) = split_head(b"A\r\nB: c\n\nbody").unwrap();
        assert_eq!(lines, vec!["A".to_string(), "B: c".to_string()]);
        assert_eq!(len, 9);
        assert!(split_head(b"A\r\nB: c\r\n").is_none());
    }
}
