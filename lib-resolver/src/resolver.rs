//! Universal Resolver with LRU caching
//!
//! Walks the registry hierarchy from the root, label by label, to find
//! the most specific registry and effective resolver for a dotted name.
//! Any ancestor registry serves as the fallback resolver for
//! descendants it has not explicitly delegated ("most specific known
//! authority wins"). Results are cached at the resolver boundary with
//! TTLs that never outlive the records they were derived from.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, info};

use lib_naming::{label_hash, namehash, Address, LabelHash, NodeId};
use lib_registry::{Clock, RegistryDirectory};

use crate::config::ResolverConfig;
use crate::errors::{ResolveError, ResolveResult};

/// Outcome of resolving a full dotted name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Deepest registry reached by delegation
    pub registry: Address,
    /// Most specific resolver seen along the walk, if any
    pub resolver: Option<Address>,
    /// Namehash of the queried name
    pub node: LabelHash,
    /// True iff every label was consumed by delegation: the terminal
    /// registry exactly matches the full name, not just a prefix
    pub exact: bool,
}

/// Cached resolution wrapper with expiration tracking
#[derive(Debug, Clone)]
struct CachedResolution {
    resolution: Resolution,
    /// Negative entries are walks that bound nothing at all
    negative: bool,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedResolution {
    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Resolver metrics for monitoring
#[derive(Debug, Default, Clone)]
pub struct ResolverMetrics {
    /// Total cache hits
    pub cache_hits: u64,
    /// Total cache misses
    pub cache_misses: u64,
    /// Total negative cache hits (names that bound nothing)
    pub negative_hits: u64,
    /// Total registry walks performed
    pub registry_walks: u64,
    /// Total expired cache entries encountered
    pub expired_entries: u64,
    /// Total invalidations performed
    pub invalidations: u64,
}

impl ResolverMetrics {
    /// Calculate cache hit ratio
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// What one hierarchy walk bound
struct WalkOutcome {
    registry: Address,
    resolver: Option<Address>,
    consumed: usize,
    touched: usize,
    earliest_expiry: Option<u64>,
}

/// Universal resolver over a registry directory
pub struct UniversalResolver {
    /// Registry instances, shared with the write path
    directory: Arc<RegistryDirectory>,
    /// Address of the naming root
    root: Address,
    /// LRU cache of resolved names
    cache: RwLock<LruCache<String, CachedResolution>>,
    /// Time source shared with the registries
    clock: Arc<dyn Clock>,
    config: ResolverConfig,
    metrics: RwLock<ResolverMetrics>,
}

impl UniversalResolver {
    /// Create a resolver rooted at `root`
    pub fn new(directory: Arc<RegistryDirectory>, root: Address, config: ResolverConfig) -> Self {
        info!(
            root = %root,
            cache_size = config.cache_size,
            default_ttl_secs = config.default_ttl.as_secs(),
            "Universal resolver initialized"
        );

        let cache_size = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        let clock = directory.clock();
        Self {
            directory,
            root,
            cache: RwLock::new(LruCache::new(cache_size)),
            clock,
            config,
            metrics: RwLock::new(ResolverMetrics::default()),
        }
    }

    /// Resolve a dotted name to its responsible registry and resolver.
    ///
    /// Cache misses trigger a hierarchy walk and cache the result; the
    /// positive TTL is capped at the earliest expiry seen during the
    /// walk so a cached answer can never outlive its records.
    pub async fn resolve(&self, name: &str) -> ResolveResult<Resolution> {
        let name = Self::normalize(name);

        // Check cache first
        {
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.get(&name) {
                if !cached.is_expired() {
                    if self.config.enable_metrics {
                        let mut metrics = self.metrics.write().await;
                        if cached.negative {
                            metrics.negative_hits += 1;
                        } else {
                            metrics.cache_hits += 1;
                        }
                    }
                    if self.config.debug_cache {
                        debug!(
                            name = %name,
                            is_negative = cached.negative,
                            age_ms = cached.cached_at.elapsed().as_millis(),
                            "Cache hit"
                        );
                    }
                    return Ok(cached.resolution.clone());
                }
                if self.config.enable_metrics {
                    let mut metrics = self.metrics.write().await;
                    metrics.expired_entries += 1;
                }
                if self.config.debug_cache {
                    debug!(name = %name, "Cache entry expired");
                }
            }
        }

        if self.config.enable_metrics {
            let mut metrics = self.metrics.write().await;
            metrics.cache_misses += 1;
            metrics.registry_walks += 1;
        }

        let labels = lib_naming::from_wire_name(&lib_naming::to_wire_name(&name)?)?;
        let outcome = self.walk(&name, &labels, labels.len()).await?;

        let resolution = Resolution {
            registry: outcome.registry,
            resolver: outcome.resolver,
            node: namehash(&name),
            exact: outcome.consumed == labels.len(),
        };

        // Cache the result
        {
            let negative = !labels.is_empty() && outcome.touched == 0;
            let ttl = if negative {
                self.config.negative_ttl
            } else {
                self.positive_ttl(outcome.earliest_expiry)
            };
            if ttl > Duration::ZERO {
                let mut cache = self.cache.write().await;
                cache.put(
                    name.clone(),
                    CachedResolution {
                        resolution: resolution.clone(),
                        negative,
                        cached_at: Instant::now(),
                        ttl,
                    },
                );
                if self.config.debug_cache {
                    debug!(
                        name = %name,
                        ttl_secs = ttl.as_secs(),
                        is_negative = negative,
                        "Cached resolution"
                    );
                }
            }
        }

        Ok(resolution)
    }

    /// Query surface: the responsible registry and exactness flag
    pub async fn get_registry(&self, name: &str) -> ResolveResult<(Address, bool)> {
        let resolution = self.resolve(name).await?;
        Ok((resolution.registry, resolution.exact))
    }

    /// Hierarchical owner read: the owner of the full name's record in
    /// its parent registry, if every ancestor delegation is live.
    pub async fn owner_of_name(&self, name: &str) -> ResolveResult<Option<Address>> {
        let name = Self::normalize(name);
        let labels = lib_naming::from_wire_name(&lib_naming::to_wire_name(&name)?)?;
        let Some((leaf, ancestors)) = labels.split_first() else {
            return Ok(None);
        };

        let mut current = match self.directory.get(self.root).await {
            Some(registry) => registry,
            None => return Err(ResolveError::UnknownRegistry(self.root)),
        };
        for label in ancestors.iter().rev() {
            let id = NodeId::base_from_hash(label_hash(label));
            let Some(next_addr) = current.subregistry_of(id).await else {
                return Ok(None);
            };
            let Some(next) = self.directory.get(next_addr).await else {
                return Ok(None);
            };
            current = next;
        }

        let id = NodeId::base_from_hash(label_hash(leaf));
        Ok(current.get_record(id).await.and_then(|record| record.owner))
    }

    /// Invalidate the cache entry for a name.
    ///
    /// Call this when a name is registered, transferred, or re-pointed.
    pub async fn invalidate(&self, name: &str) {
        let name = Self::normalize(name);
        let mut cache = self.cache.write().await;
        if cache.pop(&name).is_some() {
            if self.config.enable_metrics {
                drop(cache); // Release cache lock before acquiring metrics lock
                let mut metrics = self.metrics.write().await;
                metrics.invalidations += 1;
            }
            info!(name = %name, "Cache entry invalidated");
        }
    }

    /// Invalidate all cache entries (for maintenance/testing)
    pub async fn invalidate_all(&self) {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        info!(entries_cleared = count, "All cache entries invalidated");
    }

    /// Get current resolver metrics
    pub async fn get_metrics(&self) -> ResolverMetrics {
        self.metrics.read().await.clone()
    }

    /// Get current cache size
    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Walk the hierarchy from the root, consuming labels outermost-in.
    ///
    /// Each iteration looks the next label up in the current registry:
    /// a live record contributes its resolver as the new most-specific
    /// fallback, and a live delegation descends into the child registry,
    /// consuming the label. The walk stops at the first label the
    /// current registry does not know, does not delegate, or delegates
    /// to an instance the directory cannot produce.
    ///
    /// The hop bound defends against delegation cycles wired up by a
    /// misconfigured caller; label consumption already caps the walk at
    /// one hop per label, so exceeding the bound is strictly a defect
    /// signal.
    async fn walk(
        &self,
        name: &str,
        labels: &[String],
        max_hops: usize,
    ) -> ResolveResult<WalkOutcome> {
        let mut current = match self.directory.get(self.root).await {
            Some(registry) => registry,
            None => return Err(ResolveError::UnknownRegistry(self.root)),
        };
        let mut outcome = WalkOutcome {
            registry: self.root,
            resolver: None,
            consumed: 0,
            touched: 0,
            earliest_expiry: None,
        };

        let mut hops = 0usize;
        for label in labels.iter().rev() {
            hops += 1;
            if hops > max_hops {
                return Err(ResolveError::DelegationCycle {
                    name: name.to_string(),
                    max_hops,
                });
            }

            let id = NodeId::base_from_hash(label_hash(label));
            let Some(record) = current.get_record(id).await else {
                break;
            };
            outcome.touched += 1;
            if record.expiry != 0 {
                outcome.earliest_expiry = Some(match outcome.earliest_expiry {
                    Some(existing) => existing.min(record.expiry),
                    None => record.expiry,
                });
            }
            if let Some(resolver) = record.resolver {
                outcome.resolver = Some(resolver);
            }

            let Some(child_addr) = record.subregistry else {
                break;
            };
            let Some(child) = self.directory.get(child_addr).await else {
                break;
            };
            current = child;
            outcome.registry = child_addr;
            outcome.consumed += 1;
        }

        debug!(
            name = %name,
            registry = %outcome.registry,
            consumed = outcome.consumed,
            total = labels.len(),
            "Hierarchy walk finished"
        );
        Ok(outcome)
    }

    fn positive_ttl(&self, earliest_expiry: Option<u64>) -> Duration {
        match earliest_expiry {
            Some(expiry) => {
                let remaining = expiry.saturating_sub(self.clock.unix_now());
                self.config.default_ttl.min(Duration::from_secs(remaining))
            }
            None => self.config.default_ttl,
        }
    }

    fn normalize(name: &str) -> String {
        name.trim().trim_matches('.').to_lowercase()
    }
}
