//! Registry Change Notifications
//!
//! Every record mutation emits one change notification carrying the
//! registry address, the base identifier, and the old/new record
//! snapshots. External indexers subscribe to this stream for off-system
//! caching; it is the store's only externally observable side effect.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use async_trait::async_trait;

use lib_naming::{Address, NodeId};

use crate::record::Record;

// ============================================================================
// CHANGE NOTIFICATION
// ============================================================================

/// Which mutation produced a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordOp {
    Registered,
    Oneified,
    Transferred,
    Locked,
    SubregistryChanged,
    ResolverChanged,
    Burned,
    TldDelegated,
}

/// One record mutation, as seen by subscribers.
///
/// `old` is `None` for fresh registrations; `new` is `None` for burns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    /// Registry instance the mutation happened in
    pub registry: Address,
    /// Base identifier of the affected node
    pub base: NodeId,
    /// The mutation kind
    pub op: RecordOp,
    /// Record before the mutation
    pub old: Option<Record>,
    /// Record after the mutation
    pub new: Option<Record>,
}

impl std::fmt::Display for RecordChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}(registry={}, base={:?})",
            self.op,
            hex::encode(&self.registry.as_bytes()[..8]),
            self.base,
        )
    }
}

// ============================================================================
// EVENT LISTENER TRAIT
// ============================================================================

/// Trait for entities that listen to registry changes
#[async_trait]
pub trait RegistryEventListener: Send {
    /// Called for every record mutation.
    ///
    /// Async so indexers can do their own I/O without blocking the
    /// registry; a listener error is logged and skipped, never
    /// propagated into the mutation path.
    async fn on_change(&mut self, change: RecordChange) -> Result<()>;
}

// ============================================================================
// EVENT PUBLISHER
// ============================================================================

/// Thread-safe publisher for registry change notifications
#[derive(Clone, Default)]
pub struct RegistryEventPublisher {
    listeners: Arc<Mutex<Vec<Box<dyn RegistryEventListener>>>>,
}

impl std::fmt::Debug for RegistryEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEventPublisher").finish()
    }
}

impl RegistryEventPublisher {
    /// Create a new publisher with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to record changes
    pub async fn subscribe(&self, listener: Box<dyn RegistryEventListener>) {
        let mut listeners = self.listeners.lock().await;
        listeners.push(listener);
    }

    /// Publish a change to all subscribers
    pub async fn publish(&self, change: RecordChange) {
        let mut listeners = self.listeners.lock().await;
        for listener in listeners.iter_mut() {
            if let Err(e) = listener.on_change(change.clone()).await {
                tracing::warn!(change = %change, error = %e, "Registry event listener error");
                // Continue notifying other listeners even if one fails
            }
        }
    }

    /// Number of subscribed listeners
    pub async fn listener_count(&self) -> usize {
        self.listeners.lock().await.len()
    }
}

// ============================================================================
// SIMPLE TEST LISTENER
// ============================================================================

/// Listener that captures changes for assertions in tests
#[derive(Debug, Clone, Default)]
pub struct TestEventListener {
    /// Changes captured
    pub changes: Arc<Mutex<Vec<RecordChange>>>,
}

impl TestEventListener {
    /// Create a new capturing listener
    pub fn new() -> Self {
        Self {
            changes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get captured changes
    pub async fn captured(&self) -> Vec<RecordChange> {
        self.changes.lock().await.clone()
    }

    /// Clear captured changes
    pub async fn clear(&self) {
        self.changes.lock().await.clear();
    }
}

#[async_trait]
impl RegistryEventListener for TestEventListener {
    async fn on_change(&mut self, change: RecordChange) -> Result<()> {
        self.changes.lock().await.push(change);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_naming::{label_hash, RecordFlags};

    fn sample_change() -> RecordChange {
        RecordChange {
            registry: Address::new([7u8; 32]),
            base: NodeId::base_from_hash(label_hash("sample")),
            op: RecordOp::Registered,
            old: None,
            new: Some(Record::new(
                Address::new([1u8; 32]),
                None,
                None,
                RecordFlags::empty(),
                0,
            )),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_listeners() {
        let publisher = RegistryEventPublisher::new();
        let first = TestEventListener::new();
        let second = TestEventListener::new();
        publisher.subscribe(Box::new(first.clone())).await;
        publisher.subscribe(Box::new(second.clone())).await;
        assert_eq!(publisher.listener_count().await, 2);

        publisher.publish(sample_change()).await;

        assert_eq!(first.captured().await.len(), 1);
        assert_eq!(second.captured().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_block_others() {
        struct FailingListener;

        #[async_trait]
        impl RegistryEventListener for FailingListener {
            async fn on_change(&mut self, _change: RecordChange) -> Result<()> {
                Err(anyhow::anyhow!("indexer offline"))
            }
        }

        let publisher = RegistryEventPublisher::new();
        let capturing = TestEventListener::new();
        publisher.subscribe(Box::new(FailingListener)).await;
        publisher.subscribe(Box::new(capturing.clone())).await;

        publisher.publish(sample_change()).await;
        assert_eq!(capturing.captured().await.len(), 1);
    }

    #[test]
    fn test_change_serializes() {
        let change = sample_change();
        let json = serde_json::to_string(&change).unwrap();
        let back: RecordChange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, change);
    }
}
