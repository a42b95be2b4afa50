//! Body codecs.
//!
//! A codec turns raw body text into a [`Body`] according to the declared
//! [`BodyType`] of an endpoint, and back again when a response is written.
//! One codec is chosen per server.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::http::{Body, BodyType};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the {codec} codec cannot handle {ty:?} bodies")]
    Unsupported { codec: &'static str, ty: BodyType },
    #[error("request has no body")]
    MissingBody,
}

pub trait BodyCodec: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decodes raw body text. An empty payload is no body at all.
    fn decode(&self, raw: &str, ty: BodyType) -> Result<Option<Body>, CodecError>;

    /// Encodes a body into the text that goes on the wire.
    fn encode(&self, body: &Body, ty: BodyType) -> Result<String, CodecError>;
}

/// JSON aware codec, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, raw: &str, ty: BodyType) -> Result<Option<Body>, CodecError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let body = match ty {
            BodyType::Text => Body::Text(raw.to_string()),
            BodyType::Json => Body::Json(serde_json::from_str(raw)?),
            BodyType::Any => match serde_json::from_str::<Value>(raw) {
                Ok(value) => Body::Json(value),
                Err(_) => Body::Text(raw.to_string()),
            },
        };
        Ok(Some(body))
    }

    fn encode(&self, body: &Body, ty: BodyType) -> Result<String, CodecError> {
        let encoded = match (body, ty) {
            (Body::Text(s), BodyType::Json) => serde_json::to_string(s)?,
            (Body::Text(s), _) => s.clone(),
            (Body::Json(Value::String(s)), BodyType::Text) => s.clone(),
            (Body::Json(v), _) => serde_json::to_string(v)?,
        };
        Ok(encoded)
    }
}

/// Plain text codec. Cannot parse JSON; structured values are written in
/// compact JSON form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl BodyCodec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn decode(&self, raw: &str, ty: BodyType) -> Result<Option<Body>, CodecError> {
        if ty == BodyType::Json {
            return Err(CodecError::Unsupported { codec: self.name(), ty });
        }
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Body::Text(raw.to_string())))
    }

    fn encode(&self, body: &Body, _ty: BodyType) -> Result<String, CodecError> {
        match body {
            Body::Text(s) | Body::Json(Value::String(s)) => Ok(s.clone()),
            Body::Json(v) => Ok(v.to_string()),
        }
    }
}

/// Codec selection as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Json,
    Text,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn BodyCodec> {
        match self {
            CodecKind::Json => Arc::new(JsonCodec),
            CodecKind::Text => Arc::new(TextCodec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_is_no_body() {
        assert_eq!(JsonCodec.decode("", BodyType::Json).unwrap(), None);
        assert_eq!(TextCodec.decode("  ", BodyType::Text).unwrap(), None);
    }

    #[test]
    fn any_falls_back_to_text() {
        let body = JsonCodec.decode("{\"id\":1}", BodyType::Any).unwrap().unwrap();
        assert_eq!(body, Body::Json(json!({"id": 1})));

        let body = JsonCodec.decode("id=1", BodyType::Any).unwrap().unwrap();
        assert_eq!(body, Body::Text("id=1".into()));
    }

    #[test]
    fn declared_json_must_parse() {
        assert!(matches!(
            JsonCodec.decode("not json", BodyType::Json),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn text_stays_raw_when_declared_text() {
        let body = JsonCodec.decode("{\"a\":1}", BodyType::Text).unwrap().unwrap();
        assert_eq!(body.as_text(), Some("{\"a\":1}"));
    }

    #[test]
    fn encode_crosses_shapes() {
        let quoted = JsonCodec.encode(&Body::text("hi"), BodyType::Json).unwrap();
        assert_eq!(quoted, "\"hi\"");

        let bare = JsonCodec
            .encode(&Body::Json(json!("Hello World!")), BodyType::Text)
            .unwrap();
        assert_eq!(bare, "Hello World!");

        let object = JsonCodec
            .encode(&Body::Json(json!({"name": "Nick"})), BodyType::Any)
            .unwrap();
        assert_eq!(object, "{\"name\":\"Nick\"}");
    }

    #[test]
    fn text_codec_cannot_parse_json() {
        assert!(TextCodec.decode("{}", BodyType::Json).is_err());
        assert_eq!(
            TextCodec.decode("{}", BodyType::Any).unwrap(),
            Some(Body::Text("{}".into()))
        );
    }

    #[test]
    fn text_codec_writes_compact_json() {
        let encoded = TextCodec.encode(&Body::Json(json!({"a": 1})), BodyType::Json).unwrap();
        assert_eq!(encoded, "{\"a\":1}");
        assert_eq!(TextCodec.encode(&Body::text("ok"), BodyType::Any).unwrap(), "ok");
    }
}
