//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles for the source's seams: the
//! metadata fetcher, the interface provider, the clock and the address sink.

#![allow(dead_code)]

use ipam_core::config::SourceConfig;
use ipam_core::error::{Error, Result};
use ipam_core::sink::{MemoryAddressPool, MemoryAddressSink, MemoryAddressSpace};
use ipam_core::traits::{
    AddressPool, AddressRecord, AddressScope, AddressSink, AddressSpace, InterfaceProvider,
    LocalInterface, MetadataFetcher, PoolError, PoolKey, SinkError,
};
use ipam_core::{Clock, MetadataSource};
use ipnet::IpNet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A fetcher returning a fixed body and counting calls
///
/// Clones share the call counter and the body.
#[derive(Clone)]
pub struct StaticFetcher {
    body: Arc<Mutex<Vec<u8>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Arc::new(Mutex::new(body.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times fetch() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replace the body served by subsequent fetches
    pub fn set_body(&self, body: impl Into<Vec<u8>>) {
        *self.body.lock().unwrap() = body.into();
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for StaticFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.lock().unwrap().clone())
    }

    fn endpoint(&self) -> &str {
        "static"
    }
}

/// A fetcher that always fails
#[derive(Clone, Default)]
pub struct FailingFetcher {
    calls: Arc<AtomicUsize>,
}

impl FailingFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for FailingFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::fetch("connection refused"))
    }

    fn endpoint(&self) -> &str {
        "unreachable"
    }
}

/// A fixed set of local interfaces
pub struct StaticInterfaces(pub Vec<LocalInterface>);

impl StaticInterfaces {
    pub fn new(interfaces: &[(&str, &str)]) -> Self {
        Self(
            interfaces
                .iter()
                .map(|(name, mac)| LocalInterface::new(*name, Some(mac.to_string())))
                .collect(),
        )
    }
}

impl InterfaceProvider for StaticInterfaces {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        Ok(self.0.clone())
    }
}

/// An interface provider whose OS query fails
pub struct FailingInterfaces;

impl InterfaceProvider for FailingInterfaces {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        Err(Error::interface_query("permission denied"))
    }
}

/// A clock that only moves when told to
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

/// Where a [`FaultySink`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `new_address_space` fails
    NewSpace,
    /// `new_address_pool` fails for every key
    NewPool,
    /// `new_address_record` fails for this address
    Record(IpAddr),
    /// `set_address_space` fails
    Activation,
}

/// A sink delegating to [`MemoryAddressSink`] that fails at one point
#[derive(Clone)]
pub struct FaultySink {
    inner: MemoryAddressSink,
    fault: Fault,
    set_calls: Arc<AtomicUsize>,
}

impl FaultySink {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryAddressSink::new(),
            fault,
            set_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inner(&self) -> &MemoryAddressSink {
        &self.inner
    }

    /// Get the number of times set_address_space() was called
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

pub struct FaultySpace {
    inner: MemoryAddressSpace,
    fault: Fault,
}

pub struct FaultyPool {
    inner: MemoryAddressPool,
    fault: Fault,
}

#[async_trait::async_trait]
impl AddressSink for FaultySink {
    type Space = FaultySpace;

    async fn new_address_space(
        &self,
        id: &str,
        scope: AddressScope,
    ) -> std::result::Result<FaultySpace, SinkError> {
        if self.fault == Fault::NewSpace {
            return Err(SinkError::Unavailable("storage offline".to_string()));
        }
        let inner = self.inner.new_address_space(id, scope).await?;
        Ok(FaultySpace {
            inner,
            fault: self.fault,
        })
    }

    async fn set_address_space(&self, space: FaultySpace) -> std::result::Result<(), SinkError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::Activation {
            return Err(SinkError::Rejected("activation refused".to_string()));
        }
        self.inner.set_address_space(space.inner).await
    }
}

#[async_trait::async_trait]
impl AddressSpace for FaultySpace {
    type Pool = FaultyPool;

    fn id(&self) -> &str {
        self.inner.id()
    }

    fn scope(&self) -> AddressScope {
        self.inner.scope()
    }

    async fn new_address_pool(
        &mut self,
        interface: &str,
        priority: u8,
        subnet: IpNet,
    ) -> std::result::Result<FaultyPool, PoolError<FaultyPool>> {
        if self.fault == Fault::NewPool {
            return Err(SinkError::Rejected("no pools allowed".to_string()).into());
        }
        let fault = self.fault;
        match self.inner.new_address_pool(interface, priority, subnet).await {
            Ok(inner) => Ok(FaultyPool { inner, fault }),
            Err(PoolError::AlreadyExists(inner)) => {
                Err(PoolError::AlreadyExists(FaultyPool { inner, fault }))
            }
            Err(PoolError::Sink(e)) => Err(PoolError::Sink(e)),
        }
    }
}

#[async_trait::async_trait]
impl AddressPool for FaultyPool {
    fn key(&self) -> &PoolKey {
        self.inner.key()
    }

    async fn new_address_record(
        &mut self,
        address: IpAddr,
    ) -> std::result::Result<AddressRecord, SinkError> {
        if self.fault == Fault::Record(address) {
            return Err(SinkError::Rejected(format!("{} is blocked", address)));
        }
        self.inner.new_address_record(address).await
    }
}

/// Configuration with throttling at the default 30 seconds
pub fn test_config() -> SourceConfig {
    SourceConfig::default()
}

/// Build a started source around a static fetcher and interface list
pub fn started_source<S: AddressSink>(
    fetcher: impl MetadataFetcher + 'static,
    interfaces: impl InterfaceProvider + 'static,
    sink: Arc<S>,
    clock: Arc<ManualClock>,
) -> MetadataSource<S> {
    let mut source = MetadataSource::new(Box::new(fetcher), Box::new(interfaces), &test_config())
        .expect("default config is valid")
        .with_clock(clock);
    source.start(sink);
    source
}

/// The single-interface document from the eth0 scenario
pub const ETH0_DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Interfaces>
  <Interface MacAddress="00:11:22:33:44:55" IsPrimary="true">
    <IPSubnet Prefix="10.0.0.0/24">
      <IPAddress Address="10.0.0.4" IsPrimary="true"/>
      <IPAddress Address="10.0.0.5" IsPrimary="false"/>
    </IPSubnet>
  </Interface>
</Interfaces>"#;

/// The host's interfaces in the eth0 scenario
pub fn eth0_host() -> StaticInterfaces {
    StaticInterfaces::new(&[("lo", "00:00:00:00:00:00"), ("eth0", "00:11:22:33:44:55")])
}

pub fn net(s: &str) -> IpNet {
    s.parse().unwrap()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
