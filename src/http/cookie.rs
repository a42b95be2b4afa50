use std::fmt;

/// An HTTP cookie as sent in a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Parses a single `name=value` pair as found in a `Cookie` request header.
    ///
    /// Surrounding whitespace and double quotes around the value are dropped.
    /// Returns `None` when there is no `=` or the name is empty.
    pub fn parse(pair: &str) -> Option<Cookie> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some(Cookie::new(name, value))
    }

    /// Parses the value of a `Set-Cookie` header, attributes included.
    ///
    /// Unknown attributes are ignored.
    pub fn parse_set_cookie(line: &str) -> Option<Cookie> {
        let mut segments = line.split(';');
        let mut cookie = Cookie::parse(segments.next()?)?;

        for attr in segments.map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr, None),
            };
            match (key.to_ascii_lowercase().as_str(), value) {
                ("path", Some(v)) => cookie.path = Some(v.to_string()),
                ("domain", Some(v)) => cookie.domain = Some(v.to_string()),
                ("max-age", Some(v)) => cookie.max_age = v.parse().ok(),
                ("secure", _) => cookie.secure = true,
                ("httponly", _) => cookie.http_only = true,
                _ => {}
            }
        }

        Some(cookie)
    }
}

impl fmt::Display for Cookie {
    /// Renders the `Set-Cookie` header value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Per-connection cookie storage.
///
/// Keeps insertion order and holds at most one cookie per name; adding a
/// cookie whose name is already present replaces the old one in place.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(slot) => *slot = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        let index = self.cookies.iter().position(|c| c.name == name)?;
        Some(self.cookies.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Cookie> {
        self.cookies.clone()
    }
}

impl Extend<Cookie> for CookieJar {
    fn extend<I: IntoIterator<Item = Cookie>>(&mut self, iter: I) {
        for cookie in iter {
            self.add(cookie);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_strips_quotes() {
        let cookie = Cookie::parse(" theme=\"dark\" ").unwrap();
        assert_eq!(cookie.name, "theme");
        assert_eq!(cookie.value, "dark");
        assert!(Cookie::parse("novalue").is_none());
        assert!(Cookie::parse("=x").is_none());
    }

    #[test]
    fn set_cookie_renders_attributes() {
        let cookie = Cookie::new("id", "42")
            .path("/")
            .max_age(60)
            .secure(true)
            .http_only(true);
        assert_eq!(cookie.to_string(), "id=42; Path=/; Max-Age=60; Secure; HttpOnly");
    }

    #[test]
    fn set_cookie_parses_attributes() {
        let cookie = Cookie::parse_set_cookie("id=42; Path=/api; Domain=example.org; HttpOnly").unwrap();
        assert_eq!(cookie.value, "42");
        assert_eq!(cookie.path.as_deref(), Some("/api"));
        assert_eq!(cookie.domain.as_deref(), Some("example.org"));
        assert!(cookie.http_only);
        assert!(!cookie.secure);
    }

    #[test]
    fn jar_replaces_by_name() {
        let mut jar = CookieJar::new();
        jar.add(Cookie::new("a", "1"));
        jar.add(Cookie::new("b", "2"));
        jar.add(Cookie::new("a", "3"));
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.get("a").unwrap().value, "3");
        assert_eq!(jar.to_vec()[0].name, "a");
    }
}
