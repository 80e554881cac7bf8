// # Address Sink Trait
//
// Defines the narrow capability interface of the external address-management
// system that receives discovered configuration.
//
// ## Implementations
//
// - In-memory: `ipam_core::sink::MemoryAddressSink`
// - Future: the IPAM storage engine of the network plugin
//
// ## Usage
//
// ```rust,ignore
// use ipam_core::traits::{AddressPool, AddressScope, AddressSink, AddressSpace};
//
// let mut space = sink.new_address_space("LocalDefaultAddressSpace", AddressScope::Local).await?;
// let mut pool = space.new_address_pool("eth0", 0, "10.0.0.0/24".parse()?).await?;
// pool.new_address_record("10.0.0.5".parse()?).await?;
// sink.set_address_space(space).await?;
// ```

use async_trait::async_trait;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Scope of an address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressScope {
    /// Addresses usable on this host only
    #[default]
    Local,
    /// Addresses shared across hosts
    Global,
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// Identity of an address pool inside an address space
///
/// Primary and secondary subnets on the same interface are distinct pools
/// because the priority is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    /// Local interface name (e.g., "eth0")
    pub interface: String,
    /// 0 for primary interfaces, 1 for secondary ones
    pub priority: u8,
    /// Subnet network
    pub subnet: IpNet,
}

impl PoolKey {
    pub fn new(interface: impl Into<String>, priority: u8, subnet: IpNet) -> Self {
        Self {
            interface: interface.into(),
            priority,
            subnet,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.interface, self.priority, self.subnet)
    }
}

/// A single address tracked within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// The registered address
    pub address: IpAddr,
}

/// Failures reported by sink implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The request was understood but refused
    #[error("rejected: {0}")]
    Rejected(String),

    /// The sink cannot serve requests right now
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a pool request that did not produce a fresh pool
///
/// `AlreadyExists` hands back the existing pool so that re-discovery of the
/// same interface/subnet can keep registering addresses into it.
#[derive(Error, Debug)]
pub enum PoolError<P> {
    /// A pool with the same key is already present
    #[error("address pool already exists")]
    AlreadyExists(P),

    /// Any other sink failure
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Trait for address sink implementations
///
/// The sink owns address-space storage. The source only allocates a private
/// space, fills it, and hands it back through [`AddressSink::set_address_space`],
/// which is the single point where discovered configuration becomes visible.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait AddressSink: Send + Sync {
    /// Address space handle produced by this sink
    type Space: AddressSpace;

    /// Allocate a fresh, privately owned address space
    ///
    /// # Parameters
    ///
    /// - `id`: Address space identifier (e.g., "LocalDefaultAddressSpace")
    /// - `scope`: Local or global scope
    ///
    /// # Returns
    ///
    /// - `Ok(Space)`: An empty address space, not yet visible to consumers
    /// - `Err(SinkError)`: If the sink cannot allocate a space
    async fn new_address_space(
        &self,
        id: &str,
        scope: AddressScope,
    ) -> Result<Self::Space, SinkError>;

    /// Publish a fully built address space as the current configuration
    ///
    /// Ownership of the space moves to the sink.
    async fn set_address_space(&self, space: Self::Space) -> Result<(), SinkError>;
}

/// An address space under construction
#[async_trait]
pub trait AddressSpace: Send {
    /// Address pool handle produced by this space
    type Pool: AddressPool;

    /// Address space identifier
    fn id(&self) -> &str;

    /// Address space scope
    fn scope(&self) -> AddressScope;

    /// Request the pool for (interface, priority, subnet)
    ///
    /// # Returns
    ///
    /// - `Ok(Pool)`: A newly created pool
    /// - `Err(PoolError::AlreadyExists(pool))`: The existing pool for the key
    /// - `Err(PoolError::Sink(_))`: Pool creation failed
    async fn new_address_pool(
        &mut self,
        interface: &str,
        priority: u8,
        subnet: IpNet,
    ) -> Result<Self::Pool, PoolError<Self::Pool>>;
}

/// An address pool under construction
#[async_trait]
pub trait AddressPool: Send {
    /// Key identifying this pool within its space
    fn key(&self) -> &PoolKey;

    /// Register one address in the pool
    async fn new_address_record(&mut self, address: IpAddr) -> Result<AddressRecord, SinkError>;
}
