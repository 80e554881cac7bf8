//! Address hierarchy construction
//!
//! Populates a private address space with one pool per correlated
//! (interface, priority, subnet) and one record per non-primary address.

use crate::correlate::CorrelatedInterface;
use crate::error::{Error, Result};
use crate::traits::{AddressPool, AddressSpace, PoolError};
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Counters from one build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Pools newly created in the space
    pub pools_created: usize,
    /// Pool requests answered with an existing pool
    pub pools_reused: usize,
    /// Address records registered
    pub records: usize,
    /// Primary addresses left out for the host
    pub reserved: usize,
}

/// Parse a subnet prefix into its network (`10.0.0.5/24` becomes `10.0.0.0/24`)
pub fn parse_subnet(prefix: &str) -> Result<IpNet> {
    prefix
        .trim()
        .parse::<IpNet>()
        .map(|net| net.trunc())
        .map_err(|e| Error::invalid_subnet(prefix, e))
}

/// Populate `space` from correlated interfaces
///
/// Any error aborts immediately; the caller must then drop the space instead
/// of activating it. A pool that already exists is not an error and keeps
/// receiving records.
pub async fn build<S>(space: &mut S, interfaces: &[CorrelatedInterface<'_>]) -> Result<BuildSummary>
where
    S: AddressSpace,
{
    let mut summary = BuildSummary::default();

    for iface in interfaces {
        for subnet in iface.subnets {
            let network = parse_subnet(&subnet.prefix)?;

            let mut pool = match space
                .new_address_pool(&iface.name, iface.priority, network)
                .await
            {
                Ok(pool) => {
                    summary.pools_created += 1;
                    pool
                }
                Err(PoolError::AlreadyExists(pool)) => {
                    warn!("Address pool {} already exists, reusing it", pool.key());
                    summary.pools_reused += 1;
                    pool
                }
                Err(PoolError::Sink(e)) => {
                    return Err(Error::pool_creation(format!(
                        "{}/{}/{}: {}",
                        iface.name, iface.priority, network, e
                    )));
                }
            };

            for address in &subnet.addresses {
                if address.is_primary {
                    debug!("Skipping primary address {} on {}", address.address, iface.name);
                    summary.reserved += 1;
                    continue;
                }

                let ip: IpAddr = address
                    .address
                    .trim()
                    .parse()
                    .map_err(|_| Error::invalid_address(address.address.as_str()))?;

                pool.new_address_record(ip)
                    .await
                    .map_err(|e| Error::record_creation(ip, e))?;
                summary.records += 1;
            }
        }
    }

    Ok(summary)
}
