//! Change-tracking tags for stored documents.
//!
//! A tag is the SHA-256 digest of the document's canonical JSON, taken over
//! the user-visible fields only. Meta fields (`_id`, `_etag`, `_created`,
//! `_updated`) are excluded, so the tag changes exactly when the content does
//! and two documents with different content never share one.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::models::StoredDocument;

/// Computes the change-tracking tag for `document`.
pub fn document_etag<T: Serialize>(document: &T) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(document)?;
    if let Value::Object(fields) = &mut value {
        fields.retain(|key, _| !key.starts_with('_'));
    }

    let canonical = serde_json::to_vec(&sort_keys(value))?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}

/// Rebuilds every object with its keys in lexicographic order. Object key
/// order otherwise follows field declaration order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<(String, Value)> = fields.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Recomputes and stores the tag on `document`.
pub fn stamp<D: StoredDocument>(document: &mut D) -> Result<(), serde_json::Error> {
    let etag = document_etag(document)?;
    document.set_etag(etag);
    Ok(())
}
