//! CBOR wire format for document fields.
//!
//! Stores keep document bodies as CBOR maps. Decoding is the validation
//! boundary: a body that is not a map of text keys to JSON-representable
//! values is rejected with [`StoreError::Codec`].

use crate::document::{Document, DocumentId, Fields};
use crate::error::{StoreError, StoreResult};

/// Encodes a field map to CBOR bytes.
pub fn encode_fields(fields: &Fields) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(fields, &mut bytes)
        .map_err(|e| StoreError::codec(format!("encoding failed: {e}")))?;
    Ok(bytes)
}

/// Decodes a field map from CBOR bytes.
pub fn decode_fields(bytes: &[u8]) -> StoreResult<Fields> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::codec(format!("decoding failed: {e}")))
}

/// Decodes a stored body into a [`Document`] with the given id.
pub fn decode_document(id: &DocumentId, bytes: &[u8]) -> StoreResult<Document> {
    let fields = decode_fields(bytes)
        .map_err(|e| StoreError::codec(format!("document {id}: {e}")))?;
    Ok(Document::new(id.clone(), fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fields;
    use serde_json::json;

    #[test]
    fn roundtrip_mixed_fields() {
        let original = fields([
            ("subject", json!("Math")),
            ("value", json!(5.5)),
            ("term", json!(2)),
            ("read", json!(false)),
            ("comment", json!(null)),
            ("tags", json!(["oral", "midterm"])),
        ]);
        let bytes = encode_fields(&original).unwrap();
        assert_eq!(decode_fields(&bytes).unwrap(), original);
    }

    #[test]
    fn rejects_non_map_body() {
        let mut bytes = Vec::new();
        ciborium::into_writer(&vec![1, 2, 3], &mut bytes).unwrap();
        let err = decode_fields(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::Codec { .. }));
    }

    #[test]
    fn rejects_truncated_body() {
        let bytes = encode_fields(&fields([("title", json!("Essay"))])).unwrap();
        assert!(decode_fields(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn decode_document_keeps_id() {
        let bytes = encode_fields(&fields([("title", json!("Essay"))])).unwrap();
        let doc = decode_document(&DocumentId::from("h1"), &bytes).unwrap();
        assert_eq!(doc.id.as_str(), "h1");
        assert_eq!(doc.get_str("title"), Some("Essay"));
    }
}
