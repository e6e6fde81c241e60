use crate::error::Result;
use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;

/// The body of a published event.
///
/// Text is framed as-is. Structured values are serialized to compact JSON
/// before framing, so `{"foo":42}` arrives on the wire verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    /// Serialize any `Serialize` value into a JSON payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    /// The text that ends up on `data:` lines.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Payload::Text(text) => Ok(text.clone()),
            Payload::Json(value) => Ok(serde_json::to_string(value)?),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// A history entry: one data-bearing frame exactly as it was sent.
///
/// Entries are never mutated after creation; replay writes `frame` unchanged.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub event: Option<String>,
    pub frame: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Reading {
        sensor: &'static str,
        value: u32,
    }

    #[test]
    fn test_text_payload_is_unchanged() {
        let payload = Payload::from("hello\nworld");
        assert_eq!(payload.to_text().unwrap(), "hello\nworld");
    }

    #[test]
    fn test_json_payload_is_compact() {
        let payload = Payload::from(json!({"foo": 42}));
        assert_eq!(payload.to_text().unwrap(), r#"{"foo":42}"#);
    }

    #[test]
    fn test_serializable_struct_becomes_json() {
        let payload = Payload::json(&Reading {
            sensor: "t1",
            value: 7,
        })
        .unwrap();
        assert_eq!(payload.to_text().unwrap(), r#"{"sensor":"t1","value":7}"#);
    }
}
