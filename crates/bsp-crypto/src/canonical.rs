//! Canonical signing bytes for a record.

use bsp_core::FileRecord;

use crate::error::SignatureError;

/// Produce the canonical JSON bytes a record is signed over.
///
/// The `signature` field is removed; everything else, including
/// `public_key_fingerprint`, is part of the signed payload. Key ordering
/// falls out of `serde_json`'s BTreeMap-backed object representation, which
/// sorts keys lexicographically at every level, and `to_vec` emits no
/// insignificant whitespace.
///
/// # Errors
///
/// Returns [`SignatureError::Serialization`] if the record cannot be
/// rendered.
pub fn canonical_signing_bytes(record: &FileRecord) -> Result<Vec<u8>, SignatureError> {
    let mut value = serde_json::to_value(record)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("signature");
    }
    Ok(serde_json::to_vec(&value)?)
}
