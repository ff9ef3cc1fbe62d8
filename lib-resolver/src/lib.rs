//! Sovereign Name System resolution.
//!
//! This crate walks the registry hierarchy to answer full-name queries:
//!
//! - [`UniversalResolver`] descends from the root registry label by
//!   label to find the most specific registry and effective resolver
//!   for a dotted name, with an LRU cache at the resolver boundary
//! - [`LegacyLookup`] bridges old-style flat-hash queries onto the
//!   hierarchical model, handing back an off-chain redirect when the
//!   plaintext name has to be fetched by the caller's transport
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │  Gateway/API     │────▶│  UniversalResolver   │────▶│  NameRegistry    │
//! │  Handlers        │     │  (LRU cache + walk)  │     │  (RecordStore)   │
//! └──────────────────┘     └──────────────────────┘     └──────────────────┘
//! ```

pub mod config;
pub mod errors;
pub mod legacy;
pub mod resolver;

pub use config::ResolverConfig;
pub use errors::{ResolveError, ResolveResult};
pub use legacy::{GatewayResponse, LegacyAnswer, LegacyLookup, OffchainRedirect};
pub use resolver::{Resolution, ResolverMetrics, UniversalResolver};
