//! Shared Record Store
//!
//! One process-wide store holds every registry's records, keyed by
//! (registry address, base identifier). Registry instances own disjoint
//! key partitions; the store itself enforces no domain rules beyond
//! atomic application of a single record mutation and first-writer-wins
//! admission on [`RecordStore::put_new`].
//!
//! Invoked by [`NameRegistry`](crate::registry::NameRegistry) instances
//! only, never directly by callers.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use lib_naming::{Address, NodeId};

use crate::errors::{RegistryError, RegistryResult};
use crate::events::{RecordChange, RecordOp, RegistryEventPublisher};
use crate::record::Record;

/// Storage key: registry instance + base identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub registry: Address,
    pub base: NodeId,
}

impl RecordKey {
    pub fn new(registry: Address, base: NodeId) -> Self {
        // Records are always slotted under the canonical base id; flag
        // variants of the same label must collapse to one key.
        Self {
            registry,
            base: base.base(),
        }
    }
}

/// Process-wide record storage shared by all registry instances
pub struct RecordStore {
    records: RwLock<HashMap<RecordKey, Record>>,
    publisher: RegistryEventPublisher,
}

impl RecordStore {
    /// Create an empty store with its own event publisher
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: RwLock::new(HashMap::new()),
            publisher: RegistryEventPublisher::new(),
        })
    }

    /// The change-notification publisher for this store
    pub fn publisher(&self) -> &RegistryEventPublisher {
        &self.publisher
    }

    /// Fetch a record snapshot, expired or not.
    ///
    /// Liveness is the registry's concern; the store hands back whatever
    /// occupies the slot.
    pub async fn get(&self, registry: Address, base: NodeId) -> Option<Record> {
        let records = self.records.read().await;
        records.get(&RecordKey::new(registry, base)).cloned()
    }

    /// Number of occupied slots (including expired ones)
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Unconditional overwrite of a slot
    pub async fn put(&self, registry: Address, base: NodeId, record: Record, op: RecordOp) {
        let key = RecordKey::new(registry, base);
        let old = {
            let mut records = self.records.write().await;
            records.insert(key, record.clone())
        };
        debug!(registry = %registry, base = ?key.base, op = ?op, "record slot overwritten");
        self.notify(key, op, old, Some(record)).await;
    }

    /// First-writer-wins admission.
    ///
    /// Fails with `AlreadyRegistered` iff a live record occupies the
    /// slot; an expired leftover is overwritten in place. The check and
    /// the insert happen under one write guard, so of two racing
    /// registrations exactly one wins.
    pub async fn put_new(
        &self,
        registry: Address,
        base: NodeId,
        record: Record,
        now: u64,
    ) -> RegistryResult<()> {
        let key = RecordKey::new(registry, base);
        let old = {
            let mut records = self.records.write().await;
            if let Some(existing) = records.get(&key) {
                if existing.is_live(now) {
                    return Err(RegistryError::AlreadyRegistered {
                        registry,
                        base: key.base,
                    });
                }
            }
            records.insert(key, record.clone())
        };
        self.notify(key, RecordOp::Registered, old, Some(record)).await;
        Ok(())
    }

    /// Overwrite only the subregistry reference of an existing record
    pub async fn set_subregistry(
        &self,
        registry: Address,
        base: NodeId,
        subregistry: Option<Address>,
    ) -> RegistryResult<()> {
        self.mutate(registry, base, RecordOp::SubregistryChanged, |record| {
            record.subregistry = subregistry;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Overwrite only the resolver reference of an existing record
    pub async fn set_resolver(
        &self,
        registry: Address,
        base: NodeId,
        resolver: Option<Address>,
    ) -> RegistryResult<()> {
        self.mutate(registry, base, RecordOp::ResolverChanged, |record| {
            record.resolver = resolver;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Atomic read-modify-write of one existing record.
    ///
    /// `NotFound` if the slot is empty. The closure runs under the write
    /// guard against a scratch copy; the slot is committed only when the
    /// closure succeeds, so a failed mutation leaves state untouched and
    /// no partial state is ever observable. Returns the (old, new)
    /// snapshots.
    pub async fn mutate<F>(
        &self,
        registry: Address,
        base: NodeId,
        op: RecordOp,
        apply: F,
    ) -> RegistryResult<(Record, Record)>
    where
        F: FnOnce(&mut Record) -> RegistryResult<()>,
    {
        let key = RecordKey::new(registry, base);
        let (old, new) = {
            let mut records = self.records.write().await;
            let slot = records.get_mut(&key).ok_or(RegistryError::NotFound {
                registry,
                base: key.base,
            })?;
            let old = slot.clone();
            let mut next = old.clone();
            apply(&mut next)?;
            *slot = next.clone();
            (old, next)
        };
        self.notify(key, op, Some(old.clone()), Some(new.clone())).await;
        Ok((old, new))
    }

    /// Remove a slot entirely (ownership burn).
    ///
    /// The check closure runs against the occupant under the write
    /// guard; the slot is removed only when it succeeds.
    pub async fn remove<F>(
        &self,
        registry: Address,
        base: NodeId,
        op: RecordOp,
        check: F,
    ) -> RegistryResult<Record>
    where
        F: FnOnce(&Record) -> RegistryResult<()>,
    {
        let key = RecordKey::new(registry, base);
        let old = {
            let mut records = self.records.write().await;
            let occupant = records
                .get(&key)
                .ok_or(RegistryError::NotFound {
                    registry,
                    base: key.base,
                })?
                .clone();
            check(&occupant)?;
            records.remove(&key);
            occupant
        };
        self.notify(key, op, Some(old.clone()), None).await;
        Ok(old)
    }

    async fn notify(
        &self,
        key: RecordKey,
        op: RecordOp,
        old: Option<Record>,
        new: Option<Record>,
    ) {
        self.publisher
            .publish(RecordChange {
                registry: key.registry,
                base: key.base,
                op,
                old,
                new,
            })
            .await;
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            publisher: RegistryEventPublisher::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_naming::{label_hash, RecordFlags, FLAG_MASK};

    fn registry_addr() -> Address {
        Address::new([0xAA; 32])
    }

    fn base(label: &str) -> NodeId {
        NodeId::base_from_hash(label_hash(label))
    }

    fn record(owner_byte: u8, expiry: u64) -> Record {
        Record::new(
            Address::new([owner_byte; 32]),
            None,
            None,
            RecordFlags::empty(),
            expiry,
        )
    }

    #[tokio::test]
    async fn test_put_new_rejects_live_occupant() {
        let store = RecordStore::new();
        store
            .put_new(registry_addr(), base("a"), record(1, 0), 100)
            .await
            .unwrap();

        let result = store
            .put_new(registry_addr(), base("a"), record(2, 0), 100)
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { .. })
        ));

        // Loser left no trace.
        let stored = store.get(registry_addr(), base("a")).await.unwrap();
        assert_eq!(stored.owner, Some(Address::new([1u8; 32])));
    }

    #[tokio::test]
    async fn test_put_new_overwrites_expired_leftover() {
        let store = RecordStore::new();
        store
            .put_new(registry_addr(), base("a"), record(1, 50), 10)
            .await
            .unwrap();

        // Slot holds an expired record at now=60; admission succeeds.
        store
            .put_new(registry_addr(), base("a"), record(2, 0), 60)
            .await
            .unwrap();
        let stored = store.get(registry_addr(), base("a")).await.unwrap();
        assert_eq!(stored.owner, Some(Address::new([2u8; 32])));
    }

    #[tokio::test]
    async fn test_keys_collapse_flag_variants() {
        let store = RecordStore::new();
        let flagged = base("a").with_flags(RecordFlags::new(FLAG_MASK).unwrap());
        store
            .put_new(registry_addr(), flagged, record(1, 0), 0)
            .await
            .unwrap();

        assert!(store.get(registry_addr(), base("a")).await.is_some());
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_partitions_are_disjoint_per_registry() {
        let store = RecordStore::new();
        let other = Address::new([0xBB; 32]);
        store
            .put_new(registry_addr(), base("a"), record(1, 0), 0)
            .await
            .unwrap();

        assert!(store.get(other, base("a")).await.is_none());
        store.put_new(other, base("a"), record(2, 0), 0).await.unwrap();
        assert_eq!(store.record_count().await, 2);
    }

    #[tokio::test]
    async fn test_mutate_missing_slot_is_not_found() {
        let store = RecordStore::new();
        let result = store
            .set_resolver(registry_addr(), base("a"), Some(Address::new([9u8; 32])))
            .await;
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_single_field_setters_touch_nothing_else() {
        let store = RecordStore::new();
        store
            .put_new(registry_addr(), base("a"), record(1, 77), 0)
            .await
            .unwrap();

        let sub = Address::new([0xE1; 32]);
        let res = Address::new([0xF1; 32]);
        store
            .set_subregistry(registry_addr(), base("a"), Some(sub))
            .await
            .unwrap();
        store
            .set_resolver(registry_addr(), base("a"), Some(res))
            .await
            .unwrap();

        let stored = store.get(registry_addr(), base("a")).await.unwrap();
        assert_eq!(stored.subregistry, Some(sub));
        assert_eq!(stored.resolver, Some(res));
        assert_eq!(stored.owner, Some(Address::new([1u8; 32])));
        assert_eq!(stored.expiry, 77);
    }

    #[tokio::test]
    async fn test_registration_race_has_one_winner() {
        let store = RecordStore::new();
        let store2 = store.clone();

        let a = tokio::spawn(async move {
            store2
                .put_new(registry_addr(), base("contested"), record(1, 0), 0)
                .await
        });
        let b = store
            .put_new(registry_addr(), base("contested"), record(2, 0), 0)
            .await;
        let a = a.await.unwrap();

        assert!(a.is_ok() != b.is_ok(), "exactly one registration must win");
        let winner = if a.is_ok() { 1u8 } else { 2u8 };
        let stored = store.get(registry_addr(), base("contested")).await.unwrap();
        assert_eq!(stored.owner, Some(Address::new([winner; 32])));
    }
}
