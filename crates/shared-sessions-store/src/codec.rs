//! Value codec
//!
//! A session entry's bytes are always the UTF-8 text of exactly one JSON
//! object.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SessionError};

/// JSON object stored under one session entry
pub type JsonObject = Map<String, Value>;

/// A named JSON value, the public shape of a session entry
///
/// Serialized as `{"key": "...", "jsonValue": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKeyJsonValue {
	pub key: String,
	pub json_value: JsonObject,
}

impl SessionKeyJsonValue {
	pub fn new(key: impl Into<String>, json_value: JsonObject) -> Self {
		Self {
			key: key.into(),
			json_value,
		}
	}
}

/// Encode a JSON object as UTF-8 text
pub fn encode(value: &JsonObject) -> Vec<u8> {
	Value::Object(value.clone()).to_string().into_bytes()
}

/// Decode UTF-8 JSON text into an object
///
/// # Errors
///
/// Returns [`SessionError::Parse`] when the bytes are not UTF-8, not JSON,
/// or a JSON value other than an object.
///
/// # Examples
///
/// ```
/// use shared_sessions_store::codec::{decode, encode};
/// use serde_json::json;
///
/// let object = json!({"theme": "dark"}).as_object().unwrap().clone();
/// assert_eq!(decode(&encode(&object)).unwrap(), object);
/// assert!(decode(b"[1, 2]").is_err());
/// ```
pub fn decode(bytes: &[u8]) -> Result<JsonObject> {
	let text = std::str::from_utf8(bytes)
		.map_err(|e| SessionError::Parse(format!("entry is not UTF-8: {}", e)))?;
	match serde_json::from_str(text)? {
		Value::Object(object) => Ok(object),
		other => Err(SessionError::Parse(format!(
			"entry is a JSON {}, expected an object",
			json_kind(&other)
		))),
	}
}

/// Encode a submitted collection; on duplicate keys the last one wins
pub fn encode_all(values: &[SessionKeyJsonValue]) -> IndexMap<String, Vec<u8>> {
	values
		.iter()
		.map(|value| (value.key.clone(), encode(&value.json_value)))
		.collect()
}

/// Decode one stored entry back into its public shape
pub fn decode_entry(name: &str, bytes: &[u8]) -> Result<SessionKeyJsonValue> {
	Ok(SessionKeyJsonValue::new(name, decode(bytes)?))
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	fn object(value: Value) -> JsonObject {
		value.as_object().cloned().unwrap()
	}

	#[rstest]
	fn test_wire_shape() {
		let value = SessionKeyJsonValue::new("cart", object(json!({"items": 2})));

		let text = serde_json::to_string(&value).unwrap();

		assert_eq!(text, r#"{"key":"cart","jsonValue":{"items":2}}"#);
	}

	#[rstest]
	#[case(r#"{"key": null, "jsonValue": {}}"#)]
	#[case(r#"{"key": "a", "jsonValue": [1]}"#)]
	#[case(r#"{"jsonValue": {}}"#)]
	fn test_rejects_invalid_wire_values(#[case] text: &str) {
		assert!(serde_json::from_str::<SessionKeyJsonValue>(text).is_err());
	}

	#[rstest]
	#[case(b"\xff\xfe".to_vec())]
	#[case(b"{not json".to_vec())]
	#[case(b"\"text\"".to_vec())]
	#[case(b"null".to_vec())]
	fn test_decode_rejects(#[case] bytes: Vec<u8>) {
		assert!(matches!(decode(&bytes), Err(SessionError::Parse(_))));
	}

	#[rstest]
	fn test_encode_all_last_duplicate_wins() {
		let values = vec![
			SessionKeyJsonValue::new("a", object(json!({"v": 1}))),
			SessionKeyJsonValue::new("b", object(json!({}))),
			SessionKeyJsonValue::new("a", object(json!({"v": 2}))),
		];

		let encoded = encode_all(&values);

		assert_eq!(encoded.len(), 2);
		assert_eq!(decode(&encoded["a"]).unwrap(), object(json!({"v": 2})));
	}

	fn arb_json() -> impl Strategy<Value = Value> {
		let leaf = prop_oneof![
			Just(Value::Null),
			any::<bool>().prop_map(Value::Bool),
			any::<i64>().prop_map(|n| json!(n)),
			".*".prop_map(Value::String),
		];
		leaf.prop_recursive(3, 24, 6, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
				prop::collection::btree_map(".*", inner, 0..6)
					.prop_map(|m| Value::Object(m.into_iter().collect())),
			]
		})
	}

	proptest! {
		#[test]
		fn prop_decode_inverts_encode(
			entries in prop::collection::btree_map("[a-z]{1,8}", arb_json(), 0..8)
		) {
			let object: JsonObject = entries.into_iter().collect();

			prop_assert_eq!(decode(&encode(&object)).unwrap(), object);
		}
	}
}
