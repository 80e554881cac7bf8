// # pnet Interface Provider
//
// This crate lists the host's network interfaces through `pnet::datalink`.
//
// ## Purpose
//
// Supplies the name and hardware address of every local interface so the
// metadata document's MAC addresses can be mapped to real devices.
//
// ## Platform Support
//
// `pnet::datalink::interfaces()` is available on Linux, the BSDs, macOS and
// Windows. Interfaces without a hardware address (loopback, tunnels) are
// reported with `hardware_addr: None` and never correlate.

use ipam_core::Result;
use ipam_core::traits::{InterfaceProvider, LocalInterface};
use pnet::datalink::{self, NetworkInterface};
use pnet::util::MacAddr;

/// Interface provider backed by `pnet::datalink`
#[derive(Debug, Clone, Copy, Default)]
pub struct PnetInterfaceProvider;

impl PnetInterfaceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceProvider for PnetInterfaceProvider {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        let interfaces: Vec<LocalInterface> =
            datalink::interfaces().iter().map(to_local).collect();

        tracing::debug!("Found {} local interfaces", interfaces.len());
        Ok(interfaces)
    }
}

fn to_local(interface: &NetworkInterface) -> LocalInterface {
    LocalInterface::new(interface.name.clone(), hardware_addr(interface.mac))
}

/// Render a MAC address, treating the all-zero address as absent
pub fn hardware_addr(mac: Option<MacAddr>) -> Option<String> {
    match mac {
        Some(mac) if mac != MacAddr::zero() => Some(mac.to_string()),
        _ => None,
    }
}
