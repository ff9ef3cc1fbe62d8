//! Node identifier packing.
//!
//! A node identifier is a label hash with the low bits of its last byte
//! replaced by permission flags. Masking those bits off recovers the
//! canonical base identifier for the label, independent of lock state;
//! the flags themselves are one-way (union, never subtract), so a lock
//! is an irrevocable commitment encoded in the identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{NamingError, NamingResult};
use crate::primitives::LabelHash;

/// Subregistry reference is locked and can no longer be changed
pub const FLAG_SUBREGISTRY_LOCKED: u8 = 0x1;

/// Resolver reference is locked and can no longer be changed
pub const FLAG_RESOLVER_LOCKED: u8 = 0x2;

/// Width of the flag field: the low 3 bits of an identifier
pub const FLAG_MASK: u8 = 0x7;

/// One-way permission flags carried in an identifier's low bits.
///
/// Merging is union-only: bits can be set, never cleared. Attempting to
/// clear a set bit is a silent no-op.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RecordFlags(u8);

impl RecordFlags {
    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Validate raw bits against the permitted width
    pub fn new(bits: u8) -> NamingResult<Self> {
        if bits & !FLAG_MASK != 0 {
            return Err(NamingError::InvalidFlags {
                flags: bits,
                mask: FLAG_MASK,
            });
        }
        Ok(Self(bits))
    }

    /// Raw flag bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Union merge: the result carries every bit either side has set
    pub const fn union(&self, other: RecordFlags) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether every bit of `other` is set here
    pub const fn contains(&self, other: RecordFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Subregistry lock bit
    pub const fn subregistry_locked(&self) -> bool {
        self.0 & FLAG_SUBREGISTRY_LOCKED != 0
    }

    /// Resolver lock bit
    pub const fn resolver_locked(&self) -> bool {
        self.0 & FLAG_RESOLVER_LOCKED != 0
    }
}

impl fmt::Debug for RecordFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordFlags({:#04x})", self.0)
    }
}

/// Packed node identifier: label-hash high bits + flag low bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Derive the canonical base identifier for a label hash (flags zeroed)
    pub fn base_from_hash(hash: LabelHash) -> Self {
        let mut bytes = hash.0;
        bytes[31] &= !FLAG_MASK;
        Self(bytes)
    }

    /// Derive an identifier carrying the given flags
    pub fn from_hash(hash: LabelHash, flags: RecordFlags) -> Self {
        Self::base_from_hash(hash).with_flags(flags)
    }

    /// Project out the base identifier (flags masked to zero)
    pub fn base(&self) -> Self {
        let mut bytes = self.0;
        bytes[31] &= !FLAG_MASK;
        Self(bytes)
    }

    /// Project out the flag bits
    pub fn flags(&self) -> RecordFlags {
        RecordFlags(self.0[31] & FLAG_MASK)
    }

    /// Re-derive this identifier under different flags
    pub fn with_flags(&self, flags: RecordFlags) -> Self {
        let mut bytes = self.0;
        bytes[31] = (bytes[31] & !FLAG_MASK) | flags.bits();
        Self(bytes)
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::label_hash;

    #[test]
    fn test_base_id_invariant_under_flags() {
        let hash = label_hash("alice");
        let f1 = RecordFlags::new(FLAG_SUBREGISTRY_LOCKED).unwrap();
        let f2 = RecordFlags::new(FLAG_SUBREGISTRY_LOCKED | FLAG_RESOLVER_LOCKED).unwrap();

        let id1 = NodeId::from_hash(hash, f1);
        let id2 = NodeId::from_hash(hash, f2);
        assert_eq!(id1.base(), id2.base());
        assert_eq!(id1.base(), NodeId::base_from_hash(hash));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_flag_projection_roundtrip() {
        let hash = label_hash("bob");
        for bits in 0..=FLAG_MASK {
            let flags = RecordFlags::new(bits).unwrap();
            let id = NodeId::from_hash(hash, flags);
            assert_eq!(id.flags(), flags);
            assert_eq!(id.with_flags(RecordFlags::empty()), id.base());
        }
    }

    #[test]
    fn test_invalid_flags_rejected() {
        assert!(matches!(
            RecordFlags::new(FLAG_MASK + 1),
            Err(NamingError::InvalidFlags { .. })
        ));
        // Full width is fine even though bit 2 is unassigned today.
        assert!(RecordFlags::new(FLAG_MASK).is_ok());
    }

    #[test]
    fn test_union_never_subtracts() {
        let locked = RecordFlags::new(FLAG_SUBREGISTRY_LOCKED).unwrap();
        let cleared = locked.union(RecordFlags::empty());
        assert_eq!(cleared, locked);

        let both = locked.union(RecordFlags::new(FLAG_RESOLVER_LOCKED).unwrap());
        assert!(both.subregistry_locked());
        assert!(both.resolver_locked());
    }

    #[test]
    fn test_only_low_bits_differ_between_variants() {
        let hash = label_hash("carol");
        let plain = NodeId::base_from_hash(hash);
        let locked = plain.with_flags(RecordFlags::new(FLAG_MASK).unwrap());
        assert_eq!(plain.0[..31], locked.0[..31]);
        assert_eq!(plain.0[31] & !FLAG_MASK, locked.0[31] & !FLAG_MASK);
    }
}
