/// Opaque handler payloads attached to routes
///
/// Handlers are restricted to plain data: null, booleans, numbers, strings
/// and arrays of those. Anything that serializes to an object is rejected so
/// that a compiled table can always be encoded and decoded losslessly.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Rejection reason for a non plain-data handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NotPlainData(String);

/// A validated handler value
///
/// # Examples
///
/// ```
/// use pathway_router::Handler;
/// use std::collections::HashMap;
///
/// let handler = Handler::new(("users", "show")).unwrap();
/// assert_eq!(handler.as_value(), &serde_json::json!(["users", "show"]));
///
/// // Maps and structs serialize to objects and are rejected
/// let map: HashMap<&str, i32> = [("id", 1)].into_iter().collect();
/// assert!(Handler::new(map).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Handler(Value);

impl Handler {
    /// Serializes `value` and checks that the result is plain data
    pub fn new<T: Serialize>(value: T) -> Result<Self, NotPlainData> {
        let value = serde_json::to_value(value).map_err(|e| NotPlainData(e.to_string()))?;
        Self::try_from(value)
    }

    /// Returns the underlying JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the handler as a string slice when it is a string
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl TryFrom<Value> for Handler {
    type Error = NotPlainData;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if is_plain(&value) {
            Ok(Handler(value))
        } else {
            Err(NotPlainData(
                "expected null, a scalar or an array of plain values, found an object".to_string(),
            ))
        }
    }
}

impl From<Handler> for Value {
    fn from(handler: Handler) -> Self {
        handler.0
    }
}

fn is_plain(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
        Value::Array(items) => items.iter().all(is_plain),
        Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Controller {
        action: String,
    }

    #[test]
    fn test_scalars_are_plain() {
        assert!(Handler::new("handler.a").is_ok());
        assert!(Handler::new(42).is_ok());
        assert!(Handler::new(1.5).is_ok());
        assert!(Handler::new(true).is_ok());
        assert!(Handler::new(()).is_ok());
        assert!(Handler::new(Option::<i32>::None).is_ok());
    }

    #[test]
    fn test_nested_arrays_are_plain() {
        let handler = Handler::new(vec![vec!["a", "b"], vec!["c"]]).unwrap();
        assert_eq!(handler.as_value(), &json!([["a", "b"], ["c"]]));
    }

    #[test]
    fn test_struct_is_rejected() {
        let result = Handler::new(Controller {
            action: "index".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_object_inside_array_is_rejected() {
        assert!(Handler::try_from(json!(["ok", {"nested": 1}])).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Handler>(r#"["a", 1, null]"#).is_ok());
        assert!(serde_json::from_str::<Handler>(r#"{"a": 1}"#).is_err());
    }
}
