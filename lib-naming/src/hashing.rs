//! Hashing for the name system.
//!
//! **BLAKE3 is the canonical hash function for all name-system data.**
//! Label hashes, namehashes, and node identifiers are all derived from
//! it; mixing in an alternate hash produces mismatched identifiers
//! across registries.

/// Blake3 hash function - primary hash function for the name system
pub fn hash_blake3(data: &[u8]) -> [u8; 32] {
    let hash = blake3::hash(data);
    hash.into()
}

/// Hash multiple data segments as one concatenated input
pub fn hash_blake3_multiple(data_segments: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for segment in data_segments {
        hasher.update(segment);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash_is_deterministic() {
        let data = b"registry node";
        assert_eq!(hash_blake3(data), hash_blake3(data));
        assert_eq!(hash_blake3(data).len(), 32);
    }

    #[test]
    fn test_blake3_multiple_matches_concatenation() {
        let hash1 = hash_blake3_multiple(&[b"sub", b".", b"sov"]);
        let hash2 = hash_blake3(b"sub.sov");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_blake3_empty_input_is_valid() {
        // The empty label identifies the root; it must hash cleanly.
        let hash = hash_blake3(b"");
        assert_eq!(hash.len(), 32);
    }
}
