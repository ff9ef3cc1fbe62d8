//! Registry Errors

use thiserror::Error;
use lib_naming::{Address, NamingError, NodeId};

/// Error during registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("caller {caller} is not authorized for this operation on registry {registry}")]
    Unauthorized { registry: Address, caller: Address },

    #[error("a live record already occupies node {base:?} in registry {registry}")]
    AlreadyRegistered { registry: Address, base: NodeId },

    #[error("no live record for node {base:?} in registry {registry}")]
    NotFound { registry: Address, base: NodeId },

    #[error("mutation blocked by lock bits {bits:#04x} on node {base:?}")]
    Locked { base: NodeId, bits: u8 },

    #[error(transparent)]
    Naming(#[from] NamingError),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
