// # Memory Address Sink
//
// In-memory implementation of AddressSink.
//
// ## Purpose
//
// Holds the currently active address space in memory. Useful for tests, for
// running the daemon standalone, and as the reference behavior of the sink
// contract.
//
// ## Crash Behavior
//
// - The active space is lost on restart/crash
// - The first refresh after a restart rebuilds it from the metadata service

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};

use crate::traits::address_sink::{
    AddressPool, AddressRecord, AddressScope, AddressSink, AddressSpace, PoolError, PoolKey,
    SinkError,
};

/// Read-only view of an address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSpaceSnapshot {
    pub id: String,
    pub scope: AddressScope,
    /// Pools ordered by key
    pub pools: Vec<PoolSnapshot>,
    /// When the space was activated (`None` while under construction)
    pub activated_at: Option<DateTime<Utc>>,
}

impl AddressSpaceSnapshot {
    /// Find a pool by its key components
    pub fn pool(&self, interface: &str, priority: u8, subnet: IpNet) -> Option<&PoolSnapshot> {
        self.pools.iter().find(|p| {
            p.key.interface == interface && p.key.priority == priority && p.key.subnet == subnet
        })
    }

    /// Total number of address records across all pools
    pub fn record_count(&self) -> usize {
        self.pools.iter().map(|p| p.addresses.len()).sum()
    }
}

/// Read-only view of an address pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub key: PoolKey,
    /// Addresses in registration order
    pub addresses: Vec<IpAddr>,
}

/// In-memory address sink
///
/// Every call to `new_address_space` yields a fresh, empty space. Activating
/// a space replaces the previously active one.
///
/// # Example
///
/// ```rust,no_run
/// use ipam_core::sink::MemoryAddressSink;
/// use ipam_core::traits::{AddressPool, AddressScope, AddressSink, AddressSpace};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = MemoryAddressSink::new();
///
///     let mut space = sink.new_address_space("LocalDefaultAddressSpace", AddressScope::Local).await?;
///     let mut pool = space.new_address_pool("eth0", 0, "10.0.0.0/24".parse()?).await?;
///     pool.new_address_record("10.0.0.5".parse()?).await?;
///     sink.set_address_space(space).await?;
///
///     assert_eq!(sink.active().await.map(|s| s.record_count()), Some(1));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressSink {
    active: Arc<RwLock<Option<AddressSpaceSnapshot>>>,
    spaces_created: Arc<AtomicUsize>,
    activations: Arc<AtomicUsize>,
}

impl MemoryAddressSink {
    /// Create a sink with no active address space
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active address space, if any
    pub async fn active(&self) -> Option<AddressSpaceSnapshot> {
        self.active.read().await.clone()
    }

    /// Number of address spaces handed out so far
    pub fn spaces_created(&self) -> usize {
        self.spaces_created.load(Ordering::SeqCst)
    }

    /// Number of successful activations so far
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressSink for MemoryAddressSink {
    type Space = MemoryAddressSpace;

    async fn new_address_space(
        &self,
        id: &str,
        scope: AddressScope,
    ) -> Result<MemoryAddressSpace, SinkError> {
        if id.is_empty() {
            return Err(SinkError::Rejected("address space id cannot be empty".to_string()));
        }

        self.spaces_created.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryAddressSpace {
            id: id.to_string(),
            scope,
            pools: BTreeMap::new(),
        })
    }

    async fn set_address_space(&self, space: MemoryAddressSpace) -> Result<(), SinkError> {
        let mut snapshot = space.snapshot().await;
        snapshot.activated_at = Some(Utc::now());

        *self.active.write().await = Some(snapshot);
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Address space owned by the builder until activation
#[derive(Debug)]
pub struct MemoryAddressSpace {
    id: String,
    scope: AddressScope,
    pools: BTreeMap<PoolKey, MemoryAddressPool>,
}

impl MemoryAddressSpace {
    /// Capture the current contents of the space
    pub async fn snapshot(&self) -> AddressSpaceSnapshot {
        let mut pools = Vec::with_capacity(self.pools.len());
        for (key, pool) in &self.pools {
            pools.push(PoolSnapshot {
                key: key.clone(),
                addresses: pool.records.lock().await.clone(),
            });
        }

        AddressSpaceSnapshot {
            id: self.id.clone(),
            scope: self.scope,
            pools,
            activated_at: None,
        }
    }
}

#[async_trait]
impl AddressSpace for MemoryAddressSpace {
    type Pool = MemoryAddressPool;

    fn id(&self) -> &str {
        &self.id
    }

    fn scope(&self) -> AddressScope {
        self.scope
    }

    async fn new_address_pool(
        &mut self,
        interface: &str,
        priority: u8,
        subnet: IpNet,
    ) -> Result<MemoryAddressPool, PoolError<MemoryAddressPool>> {
        if interface.is_empty() {
            return Err(SinkError::Rejected("interface name cannot be empty".to_string()).into());
        }

        let key = PoolKey::new(interface, priority, subnet);
        if let Some(existing) = self.pools.get(&key) {
            return Err(PoolError::AlreadyExists(existing.clone()));
        }

        let pool = MemoryAddressPool {
            key: key.clone(),
            records: Arc::new(Mutex::new(Vec::new())),
        };
        self.pools.insert(key, pool.clone());
        Ok(pool)
    }
}

/// Handle to a pool inside a [`MemoryAddressSpace`]
///
/// Clones share the same records.
#[derive(Debug, Clone)]
pub struct MemoryAddressPool {
    key: PoolKey,
    records: Arc<Mutex<Vec<IpAddr>>>,
}

#[async_trait]
impl AddressPool for MemoryAddressPool {
    fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Registering an address that is already present returns the existing
    /// record. Addresses outside the pool's subnet are rejected.
    async fn new_address_record(&mut self, address: IpAddr) -> Result<AddressRecord, SinkError> {
        if !self.key.subnet.contains(&address) {
            return Err(SinkError::Rejected(format!(
                "address {} is outside subnet {}",
                address, self.key.subnet
            )));
        }

        let mut records = self.records.lock().await;
        if !records.contains(&address) {
            records.push(address);
        }
        Ok(AddressRecord { address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subnet(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_space_is_invisible_until_activated() {
        let sink = MemoryAddressSink::new();

        let mut space = sink
            .new_address_space("LocalDefaultAddressSpace", AddressScope::Local)
            .await
            .unwrap();
        let mut pool = space
            .new_address_pool("eth0", 0, subnet("10.0.0.0/24"))
            .await
            .unwrap();
        pool.new_address_record("10.0.0.5".parse().unwrap())
            .await
            .unwrap();

        assert!(sink.active().await.is_none());

        sink.set_address_space(space).await.unwrap();

        let active = sink.active().await.unwrap();
        assert_eq!(active.id, "LocalDefaultAddressSpace");
        assert_eq!(active.scope, AddressScope::Local);
        assert!(active.activated_at.is_some());
        assert_eq!(active.record_count(), 1);
        assert_eq!(sink.spaces_created(), 1);
        assert_eq!(sink.activation_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_pool_returns_existing() {
        let sink = MemoryAddressSink::new();
        let mut space = sink.new_address_space("s", AddressScope::Local).await.unwrap();

        let mut first = space
            .new_address_pool("eth0", 1, subnet("10.0.0.0/24"))
            .await
            .unwrap();
        first
            .new_address_record("10.0.0.5".parse().unwrap())
            .await
            .unwrap();

        let mut existing = match space.new_address_pool("eth0", 1, subnet("10.0.0.0/24")).await {
            Err(PoolError::AlreadyExists(pool)) => pool,
            other => panic!("expected AlreadyExists, got {:?}", other),
        };
        existing
            .new_address_record("10.0.0.6".parse().unwrap())
            .await
            .unwrap();

        let snapshot = space.snapshot().await;
        assert_eq!(snapshot.pools.len(), 1);
        assert_eq!(snapshot.record_count(), 2);
    }

    #[tokio::test]
    async fn test_priority_distinguishes_pools() {
        let sink = MemoryAddressSink::new();
        let mut space = sink.new_address_space("s", AddressScope::Local).await.unwrap();

        space
            .new_address_pool("eth0", 0, subnet("10.0.0.0/24"))
            .await
            .unwrap();
        space
            .new_address_pool("eth0", 1, subnet("10.0.0.0/24"))
            .await
            .unwrap();

        assert_eq!(space.snapshot().await.pools.len(), 2);
    }

    #[tokio::test]
    async fn test_record_outside_subnet_is_rejected() {
        let sink = MemoryAddressSink::new();
        let mut space = sink.new_address_space("s", AddressScope::Local).await.unwrap();
        let mut pool = space
            .new_address_pool("eth0", 0, subnet("10.0.0.0/24"))
            .await
            .unwrap();

        let result = pool.new_address_record("10.9.0.5".parse().unwrap()).await;
        assert!(matches!(result, Err(SinkError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_duplicate_record_is_idempotent() {
        let sink = MemoryAddressSink::new();
        let mut space = sink.new_address_space("s", AddressScope::Local).await.unwrap();
        let mut pool = space
            .new_address_pool("eth0", 0, subnet("10.0.0.0/24"))
            .await
            .unwrap();
        let ip: IpAddr = "10.0.0.5".parse().unwrap();

        pool.new_address_record(ip).await.unwrap();
        pool.new_address_record(ip).await.unwrap();

        assert_eq!(space.snapshot().await.record_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_space_id_is_rejected() {
        let sink = MemoryAddressSink::new();
        let result = sink.new_address_space("", AddressScope::Global).await;
        assert!(matches!(result, Err(SinkError::Rejected(_))));
        assert_eq!(sink.spaces_created(), 0);
    }
}
