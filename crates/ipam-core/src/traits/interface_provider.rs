// # Interface Provider Trait
//
// Lists the operating system's network interfaces so that metadata
// descriptors can be correlated with real devices.
//
// ## Implementations
//
// - pnet datalink: `ipam-iface-pnet` crate

/// A network interface present on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    /// Interface name (e.g., "eth0")
    pub name: String,
    /// Hardware address as rendered by the OS (e.g., "00:11:22:33:44:55")
    ///
    /// `None` for interfaces without one, such as loopback.
    pub hardware_addr: Option<String>,
}

impl LocalInterface {
    pub fn new(name: impl Into<String>, hardware_addr: Option<String>) -> Self {
        Self {
            name: name.into(),
            hardware_addr,
        }
    }
}

/// Trait for local interface providers
///
/// Implementations should return all interfaces; correlation does the
/// filtering. Interface order must be stable, since the first match wins.
pub trait InterfaceProvider: Send + Sync {
    /// List the host's network interfaces
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<LocalInterface>)`: All interfaces, in OS order
    /// - `Err(Error::InterfaceQuery)`: If the OS query failed
    fn interfaces(&self) -> Result<Vec<LocalInterface>, crate::Error>;
}
