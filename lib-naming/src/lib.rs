//! Sovereign Name System naming primitives.
//!
//! This crate provides the pure, synchronous foundation of the name
//! system: fixed-size address and hash types, the dotted-name wire
//! codec, and the node-identifier packing scheme that embeds permission
//! flags in the low bits of a label hash.
//!
//! Rule: no behavior in here touches storage, time, or the network.

pub mod codec;
pub mod errors;
pub mod hashing;
pub mod node_id;
pub mod primitives;

pub use codec::{
    from_wire_name, label_hash, namehash, to_wire_name, wire_name_to_dotted, MAX_LABEL_LEN,
};
pub use errors::{NamingError, NamingResult};
pub use hashing::{hash_blake3, hash_blake3_multiple};
pub use node_id::{
    NodeId, RecordFlags, FLAG_MASK, FLAG_RESOLVER_LOCKED, FLAG_SUBREGISTRY_LOCKED,
};
pub use primitives::{Address, LabelHash};
