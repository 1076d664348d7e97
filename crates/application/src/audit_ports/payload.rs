use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Encodes an audit payload as JSON text.
///
/// A value that serializes to a JSON string is already text and is stored
/// without quoting.
pub fn encode_payload<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value)? {
        Value::String(text) => Ok(text),
        other => serde_json::to_string(&other),
    }
}

/// Decodes JSON text written by [`encode_payload`].
pub fn decode_payload<T>(payload: &str) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_payload, encode_payload};

    #[test]
    fn string_payload_passes_through_unquoted() {
        let encoded = encode_payload(r#"{"already":"encoded"}"#);
        assert_eq!(encoded.ok().as_deref(), Some(r#"{"already":"encoded"}"#));
    }

    #[test]
    fn id_list_is_encoded_as_json_array() {
        let ids = vec!["101".to_owned(), "102".to_owned()];
        let encoded = encode_payload(&ids).unwrap_or_default();
        assert_eq!(encoded, r#"["101","102"]"#);
        assert_eq!(decode_payload::<Vec<String>>(&encoded).ok(), Some(ids));
    }

    #[test]
    fn malformed_payload_fails_to_decode() {
        assert!(decode_payload::<Vec<String>>("[\"101\"").is_err());
        assert!(decode_payload::<Vec<String>>(&json!({"a": 1}).to_string()).is_err());
    }
}
