//! Registry Directory
//!
//! Maps registry addresses to live registry instances so that a
//! record's delegation reference can be followed into the child
//! registry. The directory owns the shared store and clock; every
//! registry it creates runs over the same partitioned state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use lib_naming::Address;

use crate::clock::Clock;
use crate::registry::NameRegistry;
use crate::store::RecordStore;

/// Address → registry instance map over one shared store
pub struct RegistryDirectory {
    registries: RwLock<HashMap<Address, Arc<NameRegistry>>>,
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
}

impl RegistryDirectory {
    /// Create an empty directory over a fresh store
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            registries: RwLock::new(HashMap::new()),
            store,
            clock,
        })
    }

    /// The shared record store
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The shared time source
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Instantiate a registry at `addr` and track it.
    ///
    /// Registries are self-similar: root, TLD, and subdomain levels all
    /// come through here with nothing but a different address and
    /// registrar.
    pub async fn create(&self, addr: Address, registrar: Address) -> Arc<NameRegistry> {
        let registry = Arc::new(NameRegistry::new(
            addr,
            registrar,
            self.store.clone(),
            self.clock.clone(),
        ));
        let mut registries = self.registries.write().await;
        registries.insert(addr, registry.clone());
        info!(registry = %addr, registrar = %registrar, "Registry instance created");
        registry
    }

    /// Look up a registry instance by address
    pub async fn get(&self, addr: Address) -> Option<Arc<NameRegistry>> {
        self.registries.read().await.get(&addr).cloned()
    }

    /// Number of tracked registries
    pub async fn len(&self) -> usize {
        self.registries.read().await.len()
    }

    /// Whether the directory tracks no registries
    pub async fn is_empty(&self) -> bool {
        self.registries.read().await.is_empty()
    }
}
