//! JSON helpers for persisted state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Serializes a value to pretty JSON bytes with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(SerializationError::Serialize)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ecoroute_domain::{AuthTokens, Session};

    #[test]
    fn test_output_has_trailing_newline_and_two_space_indent() {
        let session = Session::new(AuthTokens::bearer("a", "r"), DateTime::UNIX_EPOCH);
        let json = String::from_utf8(to_json_pretty_bytes(&session).unwrap()).unwrap();

        assert!(json.ends_with("}\n"));
        assert!(json.contains("\n  \"access_token\": \"a\""));
    }

    #[test]
    fn test_reads_back_session() {
        let session = Session::new(AuthTokens::bearer("a", "r"), DateTime::UNIX_EPOCH);
        let bytes = to_json_pretty_bytes(&session).unwrap();
        let restored: Session = from_json_bytes(&bytes).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_invalid_json_is_a_deserialize_error() {
        let result: Result<Session, _> = from_json_bytes(b"{\"access_token\": }");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
