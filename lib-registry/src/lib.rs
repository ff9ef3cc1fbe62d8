//! Sovereign Name System registry core.
//!
//! This crate provides the delegated registry data model: the per-node
//! [`Record`], the process-wide [`RecordStore`] shared by every registry
//! instance, the self-similar [`NameRegistry`] component instantiated at
//! every level of the hierarchy, and the change-notification stream
//! external indexers subscribe to.
//!
//! # Key Rules
//!
//! 1. **Atomic mutations**: every state transition is one indivisible
//!    unit against the store; failures leave state untouched
//! 2. **Read-time expiry**: an expired record is functionally absent for
//!    every read, with no state-clearing transaction
//! 3. **One-way locks**: permission flags only ever accumulate, and the
//!    node identifier itself encodes the lock state

pub mod clock;
pub mod directory;
pub mod errors;
pub mod events;
pub mod record;
pub mod registry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::RegistryDirectory;
pub use errors::{RegistryError, RegistryResult};
pub use events::{
    RecordChange, RecordOp, RegistryEventListener, RegistryEventPublisher, TestEventListener,
};
pub use record::Record;
pub use registry::NameRegistry;
pub use store::{RecordKey, RecordStore};
