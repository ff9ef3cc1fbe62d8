//! Dotted-name wire codec.
//!
//! A dotted name is canonically encoded as a sequence of length-prefixed
//! labels terminated by a zero-length label ("wire name"). Labels that
//! do not fit the one-byte length prefix are replaced by a bracketed hex
//! encoding of their label hash, so every well-formed dotted name has a
//! wire form.

use crate::errors::{NamingError, NamingResult};
use crate::hashing::{hash_blake3, hash_blake3_multiple};
use crate::primitives::LabelHash;

/// Maximum encoded label length that fits the one-byte length prefix
pub const MAX_LABEL_LEN: usize = 255;

/// Hash a single label. Total: any byte string is a valid label,
/// including the empty string (which identifies the root).
pub fn label_hash(label: &str) -> LabelHash {
    LabelHash(hash_blake3(label.as_bytes()))
}

/// Recursive node hash of a full dotted name.
///
/// The root node is 32 zero bytes; each label folds in right-to-left as
/// `H(parent_node || label_hash(label))`. Used by the legacy lookup
/// surface, which addresses names by this single flat hash.
pub fn namehash(name: &str) -> LabelHash {
    let trimmed = name.trim_matches('.');
    let mut node = [0u8; 32];
    if trimmed.is_empty() {
        return LabelHash(node);
    }
    for label in trimmed.split('.').rev() {
        node = hash_blake3_multiple(&[&node, &label_hash(label).0]);
    }
    LabelHash(node)
}

/// Encode a dotted name into its canonical wire form.
///
/// Leading and trailing dots are stripped; the empty name encodes as the
/// single terminator byte. Labels longer than [`MAX_LABEL_LEN`] bytes
/// are substituted by `[<hex label hash>]`.
pub fn to_wire_name(name: &str) -> NamingResult<Vec<u8>> {
    let trimmed = name.trim_matches('.');
    if trimmed.is_empty() {
        return Ok(vec![0]);
    }

    let mut out = Vec::with_capacity(trimmed.len() + 2);
    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(NamingError::EmptyLabel(name.to_string()));
        }
        let bytes = label.as_bytes();
        if bytes.len() > MAX_LABEL_LEN {
            let escaped = encode_label_hash(&label_hash(label));
            if escaped.len() > MAX_LABEL_LEN {
                return Err(NamingError::LabelTooLong { len: bytes.len() });
            }
            out.push(escaped.len() as u8);
            out.extend_from_slice(escaped.as_bytes());
        } else {
            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
        }
    }
    out.push(0);
    Ok(out)
}

/// Bracketed hex escape for a label that cannot be carried literally
fn encode_label_hash(hash: &LabelHash) -> String {
    format!("[{}]", hex::encode(hash.0))
}

/// Decode a wire name back into its label sequence.
///
/// Strict inverse of [`to_wire_name`]: the byte string must be a
/// well-formed sequence of length-prefixed labels ending in exactly one
/// zero-length terminator with nothing after it.
pub fn from_wire_name(bytes: &[u8]) -> NamingResult<Vec<String>> {
    let mut labels = Vec::new();
    let mut offset = 0usize;

    loop {
        let len = *bytes.get(offset).ok_or(NamingError::MissingTerminator)? as usize;
        offset += 1;
        if len == 0 {
            break;
        }
        let end = offset + len;
        if end > bytes.len() {
            return Err(NamingError::Truncated(offset));
        }
        let label = std::str::from_utf8(&bytes[offset..end])
            .map_err(|_| NamingError::InvalidUtf8(offset))?;
        labels.push(label.to_string());
        offset = end;
    }

    if offset != bytes.len() {
        return Err(NamingError::TrailingBytes(bytes.len() - offset));
    }
    Ok(labels)
}

/// Decode a wire name and re-join it into a dotted name
pub fn wire_name_to_dotted(bytes: &[u8]) -> NamingResult<String> {
    Ok(from_wire_name(bytes)?.join("."))
}
