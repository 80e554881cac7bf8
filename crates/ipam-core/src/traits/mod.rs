//! Core traits for the IPAM configuration source
//!
//! This module defines the abstract interfaces around the refresh algorithm.
//!
//! - [`AddressSink`]: External address-space/pool/record storage
//! - [`MetadataFetcher`]: Retrieve the raw metadata document
//! - [`InterfaceProvider`]: List the host's network interfaces

pub mod address_sink;
pub mod interface_provider;
pub mod metadata_fetcher;

pub use address_sink::{
    AddressPool, AddressRecord, AddressScope, AddressSink, AddressSpace, PoolError, PoolKey,
    SinkError,
};
pub use interface_provider::{InterfaceProvider, LocalInterface};
pub use metadata_fetcher::MetadataFetcher;
