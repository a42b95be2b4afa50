use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::CodecError;

/// A decoded message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

/// The declared shape of a body on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Text,
    Json,
    /// Accept whatever the codec can make of the payload.
    #[default]
    Any,
}

impl Body {
    pub fn text(value: impl Into<String>) -> Self {
        Body::Text(value.into())
    }

    /// Serializes `value` into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            Body::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(v) => Some(v),
            Body::Text(_) => None,
        }
    }

    /// Reads the body into a typed value.
    ///
    /// Text bodies are parsed as JSON first.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        match self {
            Body::Json(v) => Ok(T::deserialize(v)?),
            Body::Text(s) => Ok(serde_json::from_str(s)?),
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}
