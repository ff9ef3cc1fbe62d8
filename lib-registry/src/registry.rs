//! Name Registry
//!
//! The self-similar registry component: the root, every TLD, and every
//! user-owned subdomain registry are the same type, differing only in
//! address, registrar, and which partition of the shared record store
//! they own. A parent registry's record may reference a child registry
//! as the delegated authority for everything below that label.
//!
//! Ownership checks are flag-exact: the node identifier itself encodes
//! the lock state, so a caller presenting a pre-lock identifier no
//! longer owns (or may mutate) the record.

use std::sync::Arc;
use tracing::info;

use lib_naming::{label_hash, Address, LabelHash, NodeId, RecordFlags};

use crate::clock::Clock;
use crate::errors::{RegistryError, RegistryResult};
use crate::events::RecordOp;
use crate::record::Record;
use crate::store::RecordStore;

/// One registry instance in the delegation hierarchy
pub struct NameRegistry {
    /// This registry's own address (its partition key in the store)
    addr: Address,
    /// The only address allowed to issue names in this registry
    registrar: Address,
    /// Shared process-wide record store
    store: Arc<RecordStore>,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl NameRegistry {
    /// Create a registry instance over its store partition
    pub fn new(
        addr: Address,
        registrar: Address,
        store: Arc<RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            addr,
            registrar,
            store,
            clock,
        }
    }

    /// This registry's address
    pub fn addr(&self) -> Address {
        self.addr
    }

    /// The registrar authorized to issue names here
    pub fn registrar(&self) -> Address {
        self.registrar
    }

    fn now(&self) -> u64 {
        self.clock.unix_now()
    }

    fn require_registrar(&self, caller: Address) -> RegistryResult<()> {
        if caller != self.registrar {
            return Err(RegistryError::Unauthorized {
                registry: self.addr,
                caller,
            });
        }
        Ok(())
    }

    /// Flag-exact ownership test used by every owner-gated mutation
    fn check_owner(&self, record: &Record, id: NodeId, caller: Address) -> RegistryResult<()> {
        let owns = record.owner == Some(caller) && record.flags == id.flags();
        if !owns {
            return Err(RegistryError::Unauthorized {
                registry: self.addr,
                caller,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register a new name under this registry.
    ///
    /// Registrar-only. Fails with `AlreadyRegistered` while a live
    /// record holds the label's base identifier; an expired leftover is
    /// overwritten. Returns the assigned node identifier, which carries
    /// the requested flags in its low bits.
    #[allow(clippy::too_many_arguments)]
    pub async fn register(
        &self,
        caller: Address,
        label: &str,
        owner: Address,
        subregistry: Option<Address>,
        resolver: Option<Address>,
        flags: RecordFlags,
        expiry: u64,
    ) -> RegistryResult<NodeId> {
        self.require_registrar(caller)?;

        let base = NodeId::base_from_hash(label_hash(label));
        let record = Record::new(owner, subregistry, resolver, flags, expiry);
        self.store
            .put_new(self.addr, base, record, self.now())
            .await?;

        let id = base.with_flags(flags);
        info!(
            registry = %self.addr,
            label = %label,
            id = %id,
            owner = %owner,
            expiry = expiry,
            "Name registered"
        );
        Ok(id)
    }

    /// Direct insert of a pre-hashed node, overwriting any occupant.
    ///
    /// Registrar-only escape hatch for seeding and migration: the node
    /// is addressed by hash because the plaintext label may not be
    /// known to the issuer.
    pub async fn oneify(
        &self,
        caller: Address,
        node: LabelHash,
        owner: Address,
        subregistry: Option<Address>,
        resolver: Option<Address>,
        expiry: u64,
    ) -> RegistryResult<NodeId> {
        self.require_registrar(caller)?;

        let base = NodeId::base_from_hash(node);
        let record = Record::new(owner, subregistry, resolver, RecordFlags::empty(), expiry);
        self.store
            .put(self.addr, base, record, RecordOp::Oneified)
            .await;

        info!(registry = %self.addr, node = %base, "Name seeded directly");
        Ok(base)
    }

    /// Permanently delegate a top-level label to a child registry.
    ///
    /// Registrar-only. The resulting record is ownerless and never
    /// expires; it blocks ordinary registration of the same label.
    pub async fn set_tld(
        &self,
        caller: Address,
        label: &str,
        registry: Address,
    ) -> RegistryResult<NodeId> {
        self.require_registrar(caller)?;

        let base = NodeId::base_from_hash(label_hash(label));
        self.store
            .put(
                self.addr,
                base,
                Record::delegation(registry),
                RecordOp::TldDelegated,
            )
            .await;

        info!(registry = %self.addr, label = %label, child = %registry, "TLD delegated");
        Ok(base)
    }

    /// Transfer a live name to a new owner
    pub async fn transfer(
        &self,
        caller: Address,
        id: NodeId,
        new_owner: Address,
    ) -> RegistryResult<()> {
        let now = self.now();
        self.store
            .mutate(self.addr, id, RecordOp::Transferred, |record| {
                if !record.is_live(now) {
                    // An expired record has no current owner to transfer from.
                    return Err(RegistryError::NotFound {
                        registry: self.addr,
                        base: id.base(),
                    });
                }
                self.check_owner(record, id, caller)?;
                record.owner = Some(new_owner);
                Ok(())
            })
            .await?;

        info!(registry = %self.addr, id = %id, new_owner = %new_owner, "Name transferred");
        Ok(())
    }

    /// Point a name at a different child registry
    pub async fn set_subregistry(
        &self,
        caller: Address,
        id: NodeId,
        subregistry: Option<Address>,
    ) -> RegistryResult<()> {
        let now = self.now();
        self.store
            .mutate(self.addr, id, RecordOp::SubregistryChanged, |record| {
                if !record.is_live(now) {
                    return Err(RegistryError::NotFound {
                        registry: self.addr,
                        base: id.base(),
                    });
                }
                self.check_owner(record, id, caller)?;
                if record.flags.subregistry_locked() {
                    return Err(RegistryError::Locked {
                        base: id.base(),
                        bits: lib_naming::FLAG_SUBREGISTRY_LOCKED,
                    });
                }
                record.subregistry = subregistry;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Point a name at a different resolver
    pub async fn set_resolver(
        &self,
        caller: Address,
        id: NodeId,
        resolver: Option<Address>,
    ) -> RegistryResult<()> {
        let now = self.now();
        self.store
            .mutate(self.addr, id, RecordOp::ResolverChanged, |record| {
                if !record.is_live(now) {
                    return Err(RegistryError::NotFound {
                        registry: self.addr,
                        base: id.base(),
                    });
                }
                self.check_owner(record, id, caller)?;
                if record.flags.resolver_locked() {
                    return Err(RegistryError::Locked {
                        base: id.base(),
                        bits: lib_naming::FLAG_RESOLVER_LOCKED,
                    });
                }
                record.resolver = resolver;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Irrevocably set permission bits on a name.
    ///
    /// Monotone union: bits already set stay set, and an attempt to
    /// clear comes out as a no-op, not an error. Ownership is re-keyed
    /// under the new effective identifier. Returns that identifier.
    pub async fn lock(
        &self,
        caller: Address,
        id: NodeId,
        bits: RecordFlags,
    ) -> RegistryResult<NodeId> {
        let now = self.now();
        let (old, new) = self
            .store
            .mutate(self.addr, id, RecordOp::Locked, |record| {
                if !record.is_live(now) {
                    return Err(RegistryError::NotFound {
                        registry: self.addr,
                        base: id.base(),
                    });
                }
                self.check_owner(record, id, caller)?;
                record.flags = record.flags.union(bits);
                Ok(())
            })
            .await?;

        let effective = id.base().with_flags(new.flags);
        if old.flags != new.flags {
            info!(registry = %self.addr, id = %effective, "Name locked under new identifier");
        }
        Ok(effective)
    }

    /// Burn a name: the record is destroyed and the label becomes
    /// immediately re-registrable.
    pub async fn burn(&self, caller: Address, id: NodeId) -> RegistryResult<()> {
        let now = self.now();
        self.store
            .remove(self.addr, id, RecordOp::Burned, |record| {
                if !record.is_live(now) {
                    return Err(RegistryError::NotFound {
                        registry: self.addr,
                        base: id.base(),
                    });
                }
                self.check_owner(record, id, caller)
            })
            .await?;

        info!(registry = %self.addr, id = %id, "Name burned");
        Ok(())
    }

    // ========================================================================
    // Reads (each applies the liveness predicate independently)
    // ========================================================================

    /// Live record snapshot for an identifier (any flag variant)
    pub async fn get_record(&self, id: NodeId) -> Option<Record> {
        let record = self.store.get(self.addr, id.base()).await?;
        if record.is_live(self.now()) {
            Some(record)
        } else {
            None
        }
    }

    /// Current owner, if the presented identifier is the effective one.
    ///
    /// Flag-exact: after a lock, only the post-lock identifier resolves
    /// to the owner; every other variant reads as ownerless.
    pub async fn owner_of(&self, id: NodeId) -> Option<Address> {
        let record = self.get_record(id).await?;
        if record.flags != id.flags() {
            return None;
        }
        record.owner
    }

    /// Resolver reference for a live record (any flag variant)
    pub async fn resolver_of(&self, id: NodeId) -> Option<Address> {
        self.get_record(id).await?.resolver
    }

    /// Delegated child registry for a live record (any flag variant)
    pub async fn subregistry_of(&self, id: NodeId) -> Option<Address> {
        self.get_record(id).await?.subregistry
    }

    /// Whether a live record exists for the identifier (any flag variant)
    pub async fn record_exists(&self, id: NodeId) -> bool {
        self.get_record(id).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use lib_naming::{FLAG_RESOLVER_LOCKED, FLAG_SUBREGISTRY_LOCKED};

    const REGISTRAR: Address = Address::new([0x01; 32]);
    const ALICE: Address = Address::new([0x0A; 32]);
    const BOB: Address = Address::new([0x0B; 32]);

    fn harness(now: u64) -> (NameRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let store = RecordStore::new();
        let registry = NameRegistry::new(Address::new([0xE0; 32]), REGISTRAR, store, clock.clone());
        (registry, clock)
    }

    fn flags(bits: u8) -> RecordFlags {
        RecordFlags::new(bits).unwrap()
    }

    #[tokio::test]
    async fn test_register_requires_registrar() {
        let (registry, _) = harness(1000);
        let result = registry
            .register(ALICE, "name", ALICE, None, None, RecordFlags::empty(), 0)
            .await;
        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_register_assigns_flagged_identifier() {
        let (registry, _) = harness(1000);
        let id = registry
            .register(
                REGISTRAR,
                "name",
                ALICE,
                None,
                None,
                flags(FLAG_SUBREGISTRY_LOCKED | FLAG_RESOLVER_LOCKED),
                0,
            )
            .await
            .unwrap();

        assert_eq!(id.flags().bits(), 0x3);
        assert_eq!(id.base(), NodeId::base_from_hash(label_hash("name")));
        assert_eq!(registry.owner_of(id).await, Some(ALICE));
        assert_eq!(registry.owner_of(id.base()).await, None);
    }

    #[tokio::test]
    async fn test_double_registration_rejected_while_live() {
        let (registry, _) = harness(1000);
        registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 2000)
            .await
            .unwrap();
        let result = registry
            .register(REGISTRAR, "name", BOB, None, None, RecordFlags::empty(), 0)
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_name_is_re_registrable() {
        let (registry, clock) = harness(1000);
        let id = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 2000)
            .await
            .unwrap();
        assert_eq!(registry.owner_of(id).await, Some(ALICE));

        clock.set(2000);
        assert_eq!(registry.owner_of(id).await, None);
        let id2 = registry
            .register(REGISTRAR, "name", BOB, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();
        assert_eq!(registry.owner_of(id2).await, Some(BOB));
    }

    #[tokio::test]
    async fn test_transfer_owner_only() {
        let (registry, _) = harness(1000);
        let id = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();

        let result = registry.transfer(BOB, id, BOB).await;
        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
        assert_eq!(registry.owner_of(id).await, Some(ALICE));

        registry.transfer(ALICE, id, BOB).await.unwrap();
        assert_eq!(registry.owner_of(id).await, Some(BOB));
    }

    #[tokio::test]
    async fn test_transfer_of_expired_name_is_not_found() {
        let (registry, clock) = harness(1000);
        let id = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 1500)
            .await
            .unwrap();
        clock.set(1500);
        let result = registry.transfer(ALICE, id, BOB).await;
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_subregistry_blocked_by_lock_bit() {
        let (registry, _) = harness(1000);
        let id = registry
            .register(
                REGISTRAR,
                "name",
                ALICE,
                None,
                None,
                flags(FLAG_SUBREGISTRY_LOCKED),
                0,
            )
            .await
            .unwrap();

        let result = registry
            .set_subregistry(ALICE, id, Some(Address::new([0xE1; 32])))
            .await;
        assert!(matches!(result, Err(RegistryError::Locked { .. })));

        // Resolver is independently lockable and still open here.
        registry
            .set_resolver(ALICE, id, Some(Address::new([0xF1; 32])))
            .await
            .unwrap();
        assert_eq!(
            registry.resolver_of(id).await,
            Some(Address::new([0xF1; 32]))
        );
    }

    #[tokio::test]
    async fn test_lock_rekeys_ownership() {
        let (registry, _) = harness(1000);
        let base = registry
            .register(REGISTRAR, "test2", ALICE, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();
        let locked = base.with_flags(flags(0x3));

        assert_eq!(registry.owner_of(base).await, Some(ALICE));
        assert_eq!(registry.owner_of(locked).await, None);

        let effective = registry.lock(ALICE, base, flags(0x3)).await.unwrap();
        assert_eq!(effective, locked);
        assert_eq!(registry.owner_of(locked).await, Some(ALICE));
        assert_eq!(registry.owner_of(base).await, None);
    }

    #[tokio::test]
    async fn test_lock_cannot_clear_bits() {
        let (registry, _) = harness(1000);
        let id = registry
            .register(REGISTRAR, "test2", ALICE, None, None, flags(0x3), 0)
            .await
            .unwrap();

        // "Clearing" with zero bits is a silent no-op.
        let effective = registry.lock(ALICE, id, RecordFlags::empty()).await.unwrap();
        assert_eq!(effective, id);
        assert_eq!(registry.owner_of(id).await, Some(ALICE));
        assert_eq!(registry.owner_of(id.base()).await, None);
    }

    #[tokio::test]
    async fn test_stale_identifier_does_not_authorize_mutation() {
        let (registry, _) = harness(1000);
        let base = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();
        registry
            .lock(ALICE, base, flags(FLAG_SUBREGISTRY_LOCKED))
            .await
            .unwrap();

        // The pre-lock identifier no longer authorizes anything.
        let result = registry.transfer(ALICE, base, BOB).await;
        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_burn_frees_the_label() {
        let (registry, _) = harness(1000);
        let id = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();

        let result = registry.burn(BOB, id).await;
        assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));

        registry.burn(ALICE, id).await.unwrap();
        assert!(!registry.record_exists(id).await);
        registry
            .register(REGISTRAR, "name", BOB, None, None, RecordFlags::empty(), 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tld_delegation_blocks_registration() {
        let (registry, _) = harness(1000);
        registry
            .set_tld(REGISTRAR, "sov", Address::new([0xE1; 32]))
            .await
            .unwrap();

        let id = NodeId::base_from_hash(label_hash("sov"));
        assert!(registry.record_exists(id).await);
        assert_eq!(registry.owner_of(id).await, None);
        assert_eq!(
            registry.subregistry_of(id).await,
            Some(Address::new([0xE1; 32]))
        );

        let result = registry
            .register(REGISTRAR, "sov", ALICE, None, None, RecordFlags::empty(), 0)
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_reads_ignore_flag_variant_except_owner() {
        let (registry, _) = harness(1000);
        let sub = Address::new([0xE1; 32]);
        let res = Address::new([0xF1; 32]);
        let id = registry
            .register(
                REGISTRAR,
                "name",
                ALICE,
                Some(sub),
                Some(res),
                flags(FLAG_SUBREGISTRY_LOCKED),
                0,
            )
            .await
            .unwrap();

        for probe in [id, id.base(), id.base().with_flags(flags(0x3))] {
            assert_eq!(registry.subregistry_of(probe).await, Some(sub));
            assert_eq!(registry.resolver_of(probe).await, Some(res));
            assert!(registry.record_exists(probe).await);
        }
        assert_eq!(registry.owner_of(id).await, Some(ALICE));
        assert_eq!(registry.owner_of(id.base()).await, None);
    }

    #[tokio::test]
    async fn test_expiry_read_does_not_mutate_storage() {
        let clock = Arc::new(ManualClock::new(1000));
        let store = RecordStore::new();
        let registry = NameRegistry::new(
            Address::new([0xE0; 32]),
            REGISTRAR,
            store.clone(),
            clock.clone(),
        );
        let id = registry
            .register(REGISTRAR, "name", ALICE, None, None, RecordFlags::empty(), 1500)
            .await
            .unwrap();

        clock.set(9999);
        assert_eq!(registry.owner_of(id).await, None);
        assert!(!registry.record_exists(id).await);

        // The slot itself is untouched until re-registration.
        let raw = store.get(registry.addr(), id).await.unwrap();
        assert_eq!(raw.owner, Some(ALICE));
        assert_eq!(raw.expiry, 1500);
    }
}
