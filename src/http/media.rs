use std::borrow::Cow;
use std::fmt;

/// Media type label used for content negotiation.
///
/// Comparison is an exact string match. `*/*` is not a wildcard here, it is
/// just another label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(Cow<'static, str>);

impl MediaType {
    pub const ALL: MediaType = MediaType(Cow::Borrowed("*/*"));
    pub const APPLICATION_JSON: MediaType = MediaType(Cow::Borrowed("application/json"));
    pub const TEXT_PLAIN: MediaType = MediaType(Cow::Borrowed("text/plain"));
    pub const TEXT_HTML: MediaType = MediaType(Cow::Borrowed("text/html"));
    pub const APPLICATION_FORM_URLENCODED: MediaType =
        MediaType(Cow::Borrowed("application/x-www-form-urlencoded"));

    pub fn new(value: impl Into<String>) -> Self {
        MediaType(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether request bodies of this type are read as `key=value&...` pairs.
    pub fn is_form_urlencoded(&self) -> bool {
        *self == Self::APPLICATION_FORM_URLENCODED
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::TEXT_PLAIN
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        MediaType::new(value)
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        MediaType::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_and_constant_values_compare_equal() {
        assert_eq!(MediaType::new("application/json"), MediaType::APPLICATION_JSON);
        assert!(MediaType::from("application/x-www-form-urlencoded").is_form_urlencoded());
        assert!(!MediaType::ALL.is_form_urlencoded());
    }
}
