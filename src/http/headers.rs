//! HTTP header map shared by requests and responses.
//!
//! Names are stored exactly as given (case-sensitive) with a single value
//! each; inserting an existing name replaces its value.

use std::collections::HashMap;

use crate::http::media::MediaType;

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const AUTHORIZATION: &str = "Authorization";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONNECTION: &str = "Connection";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const COOKIE: &str = "Cookie";
pub const HOST: &str = "Host";
pub const KEEP_ALIVE: &str = "Keep-Alive";
pub const SERVER: &str = "Server";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const USER_AGENT: &str = "User-Agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    data: HashMap<String, String>,
}

impl Headers {
    /// Creates a header map pre-populated with `Accept: */*` and
    /// `Cache-Control: no-cache`.
    pub fn new() -> Self {
        let mut headers = Self::empty();
        headers.insert(ACCEPT, MediaType::ALL.as_str());
        headers.insert(CACHE_CONTROL, "no-cache");
        headers
    }

    /// Creates a header map without any defaults.
    pub fn empty() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    /// Looks a header up ignoring ASCII case, preferring an exact match.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| {
            self.data
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.data.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_ignore_case(CONTENT_TYPE)
    }

    pub fn set_content_type(&mut self, media: &MediaType) -> &mut Self {
        self.insert(CONTENT_TYPE, media.as_str())
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.get_ignore_case(CONTENT_ENCODING)
    }

    pub fn set_content_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.insert(CONTENT_ENCODING, encoding)
    }

    pub fn connection(&self) -> Option<&str> {
        self.get_ignore_case(CONNECTION)
    }

    pub fn accept_encoding(&self) -> Option<&str> {
        self.get_ignore_case(ACCEPT_ENCODING)
    }

    pub fn set_accept_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.insert(ACCEPT_ENCODING, encoding)
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::empty();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_defaults() {
        let headers = Headers::new();
        assert_eq!(headers.get("Accept"), Some("*/*"));
        assert_eq!(headers.get("Cache-Control"), Some("no-cache"));
        assert!(Headers::empty().is_empty());
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut headers = Headers::empty();
        headers.insert("X-Token", "a");
        assert_eq!(headers.get("x-token"), None);
        assert_eq!(headers.get_ignore_case("x-token"), Some("a"));
    }
}
