//! Structured decoding of response payloads into typed values.
//!
//! The target schema is whatever `serde` derives for the target type. Field
//! renames and optional fields are declared on the type itself, which keeps
//! the decoder generic:
//!
//! ```
//! use cryptocoins_net::decode::{Decoder, JsonDecoder};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Listing {
//!     name: String,
//!     #[serde(rename = "is_active")]
//!     active: bool,
//!     #[serde(default)]
//!     note: Option<String>,
//! }
//!
//! let listing: Listing = JsonDecoder::new()
//!     .decode(br#"{"name": "Bitcoin", "is_active": true}"#)
//!     .unwrap();
//! assert!(listing.active);
//! assert!(listing.note.is_none());
//! ```

use serde::de::DeserializeOwned;

/// Broad category of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The payload is not syntactically valid.
    Syntax,
    /// The payload is valid but does not match the target type.
    Data,
    /// The payload ended unexpectedly.
    Eof,
    /// The payload could not be read.
    Io,
}

impl From<serde_json::error::Category> for DecodeErrorKind {
    fn from(category: serde_json::error::Category) -> Self {
        match category {
            serde_json::error::Category::Syntax => Self::Syntax,
            serde_json::error::Category::Data => Self::Data,
            serde_json::error::Category::Eof => Self::Eof,
            serde_json::error::Category::Io => Self::Io,
        }
    }
}

/// A decode failure with the path of the offending value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at `{path}`)")]
pub struct DecodeError {
    /// Path to the value that failed, e.g. `[0].is_new`. `.` is the root.
    pub path: String,
    /// Failure category.
    pub kind: DecodeErrorKind,
    /// Human-readable description from the underlying parser.
    pub message: String,
}

impl DecodeError {
    fn from_json(path: String, err: serde_json::Error) -> Self {
        Self {
            path,
            kind: err.classify().into(),
            message: err.to_string(),
        }
    }
}

/// Decodes raw payload bytes into a typed value.
pub trait Decoder: Send + Sync {
    /// Decode `bytes` into `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

/// JSON decoder with path tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a new JSON decoder.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            DecodeError::from_json(path, err.into_inner())
        })?;
        // Reject trailing data after the top-level value.
        deserializer
            .end()
            .map_err(|err| DecodeError::from_json(".".to_string(), err))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        name: String,
        #[serde(rename = "is_new")]
        fresh: bool,
        #[serde(default)]
        rank: Option<u32>,
    }

    #[test]
    fn test_decode_with_renamed_and_optional_fields() {
        let entries: Vec<Entry> = JsonDecoder::new()
            .decode(br#"[{"name": "Bitcoin", "is_new": false}, {"name": "Pepe", "is_new": true, "rank": 7}]"#)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, None);
        assert_eq!(entries[1].rank, Some(7));
        assert!(entries[1].fresh);
    }

    #[test]
    fn test_missing_field_reports_element_path() {
        let err = JsonDecoder::new()
            .decode::<Vec<Entry>>(br#"[{"name": "Bitcoin", "is_new": false}, {"name": "Ethereum", "isNew": false}]"#)
            .unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Data);
        assert!(err.path.starts_with("[1]"), "path was {}", err.path);
        assert!(err.message.contains("is_new"));
    }

    #[test]
    fn test_type_mismatch_reports_field_path() {
        let err = JsonDecoder::new()
            .decode::<Vec<Entry>>(br#"[{"name": "Bitcoin", "is_new": "yes"}]"#)
            .unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Data);
        assert_eq!(err.path, "[0].is_new");
    }

    #[test]
    fn test_malformed_payload() {
        let err = JsonDecoder::new()
            .decode::<Vec<Entry>>(b"[{\"name\": ")
            .unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Eof);

        let err = JsonDecoder::new()
            .decode::<Vec<Entry>>(b"<html>502</html>")
            .unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Syntax);
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        let err = JsonDecoder::new().decode::<u32>(b"1 2").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Syntax);
        assert_eq!(err.path, ".");
    }
}
