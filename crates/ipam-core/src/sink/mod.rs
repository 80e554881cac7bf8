// # Address Sink Implementations
//
// This module provides implementations of the AddressSink trait.

pub mod memory;

pub use memory::{
    AddressSpaceSnapshot, MemoryAddressPool, MemoryAddressSink, MemoryAddressSpace, PoolSnapshot,
};
