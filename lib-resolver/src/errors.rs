//! Resolution Errors

use thiserror::Error;
use lib_naming::{Address, LabelHash, NamingError};

/// Error during name resolution or legacy lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("resolution of {name:?} exceeded its hop bound of {max_hops}")]
    DelegationCycle { name: String, max_hops: usize },

    #[error("no registry instance known at {0}")]
    UnknownRegistry(Address),

    #[error("gateway payload rejected: {0}")]
    BadGatewayPayload(String),

    #[error("gateway returned name hashing to {actual}, expected node {expected}")]
    NamehashMismatch {
        expected: LabelHash,
        actual: LabelHash,
    },

    #[error(transparent)]
    Naming(#[from] NamingError),
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
