//! Registry Record
//!
//! One record per (registry, base identifier): owner, delegated
//! subregistry, resolver reference, expiry, and the accumulated
//! permission flags.

use serde::{Deserialize, Serialize};
use lib_naming::{Address, NodeId, RecordFlags};

/// Per-node registry record.
///
/// `expiry == 0` means the record never expires. Liveness is a pure
/// predicate: reads evaluate it against the current time and treat an
/// expired record as absent, leaving the storage slot untouched until a
/// re-registration overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Owning address, if any (TLD delegation records are ownerless)
    pub owner: Option<Address>,
    /// Delegated child registry for everything below this label
    pub subregistry: Option<Address>,
    /// Resolver responsible for this name and undelegated descendants
    pub resolver: Option<Address>,
    /// Unix expiry timestamp; 0 = never expires
    pub expiry: u64,
    /// Accumulated one-way permission flags
    pub flags: RecordFlags,
}

impl Record {
    /// Create a freshly registered record
    pub fn new(
        owner: Address,
        subregistry: Option<Address>,
        resolver: Option<Address>,
        flags: RecordFlags,
        expiry: u64,
    ) -> Self {
        Self {
            owner: Some(owner),
            subregistry,
            resolver,
            expiry,
            flags,
        }
    }

    /// Create an ownerless permanent delegation record (root TLD entry)
    pub fn delegation(subregistry: Address) -> Self {
        Self {
            owner: None,
            subregistry: Some(subregistry),
            resolver: None,
            expiry: 0,
            flags: RecordFlags::empty(),
        }
    }

    /// Liveness predicate: `expiry == 0 || now < expiry`.
    ///
    /// Evaluated on every read path; never mutates anything.
    pub fn is_live(&self, now: u64) -> bool {
        self.expiry == 0 || now < self.expiry
    }

    /// The effective node identifier for this record, given its base id.
    ///
    /// Ownership is keyed under this identifier: after a lock, the
    /// effective id changes and the pre-lock variant reads as ownerless.
    pub fn node_id(&self, base: NodeId) -> NodeId {
        base.with_flags(self.flags)
    }
}
