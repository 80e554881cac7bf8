//! Interface correlation
//!
//! Matches metadata interface descriptors to the host's real interfaces by
//! hardware address and assigns pool priorities.

use crate::document::{InterfaceDocument, SubnetDescriptor};
use crate::traits::LocalInterface;
use tracing::debug;

/// Pool priority of subnets on the primary interface
pub const PRIMARY_PRIORITY: u8 = 0;

/// Pool priority of subnets on secondary interfaces
pub const SECONDARY_PRIORITY: u8 = 1;

/// A document interface resolved to a local interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedInterface<'doc> {
    /// Local interface name
    pub name: String,
    /// [`PRIMARY_PRIORITY`] or [`SECONDARY_PRIORITY`]
    pub priority: u8,
    /// Subnets of the matched descriptor, in document order
    pub subnets: &'doc [SubnetDescriptor],
}

/// Normalize a hardware address for comparison
///
/// Lowercases and drops `:` and `-` separators, so `"AA:BB:CC:DD:EE:FF"`,
/// `"aa-bb-cc-dd-ee-ff"` and `"aabbccddeeff"` all compare equal.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Priority for a descriptor's primary flag
pub fn priority_for(is_primary: bool) -> u8 {
    if is_primary {
        PRIMARY_PRIORITY
    } else {
        SECONDARY_PRIORITY
    }
}

/// Resolve document interfaces against local interfaces
///
/// The first local interface whose normalized hardware address equals the
/// descriptor's wins. Descriptors without a match are dropped: the metadata
/// may describe NICs that are not (yet) attached to this host. Interfaces
/// without a hardware address never match, and neither do empty MACs.
pub fn correlate<'doc>(
    doc: &'doc InterfaceDocument,
    local_interfaces: &[LocalInterface],
) -> Vec<CorrelatedInterface<'doc>> {
    let local: Vec<(String, &str)> = local_interfaces
        .iter()
        .filter_map(|iface| {
            let mac = normalize_mac(iface.hardware_addr.as_deref()?);
            (!mac.is_empty()).then_some((mac, iface.name.as_str()))
        })
        .collect();

    doc.interfaces
        .iter()
        .filter_map(|descriptor| {
            let mac = normalize_mac(&descriptor.mac_address);
            let matched = (!mac.is_empty())
                .then(|| local.iter().find(|(local_mac, _)| *local_mac == mac))
                .flatten();

            match matched {
                Some((_, name)) => Some(CorrelatedInterface {
                    name: name.to_string(),
                    priority: priority_for(descriptor.is_primary),
                    subnets: &descriptor.subnets,
                }),
                None => {
                    debug!(
                        "No local interface with MAC {}, skipping descriptor",
                        descriptor.mac_address
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InterfaceDescriptor;

    fn descriptor(mac: &str, is_primary: bool) -> InterfaceDescriptor {
        InterfaceDescriptor {
            mac_address: mac.to_string(),
            is_primary,
            subnets: vec![SubnetDescriptor {
                prefix: "10.0.0.0/24".to_string(),
                addresses: Vec::new(),
            }],
        }
    }

    fn local(name: &str, mac: Option<&str>) -> LocalInterface {
        LocalInterface::new(name, mac.map(str::to_string))
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF"), "aabbccddeeff");
        assert_eq!(normalize_mac("aa-bb-cc-dd-ee-ff"), "aabbccddeeff");
        assert_eq!(normalize_mac("aabbccddeeff"), "aabbccddeeff");
        assert_eq!(normalize_mac(" 000D3A6E1C2B "), "000d3a6e1c2b");
    }

    #[test]
    fn test_match_is_case_and_separator_insensitive() {
        let doc = InterfaceDocument {
            interfaces: vec![descriptor("AABBCCDDEEFF", true)],
        };
        let locals = vec![local("eth0", Some("aa:bb:cc:dd:ee:ff"))];

        let correlated = correlate(&doc, &locals);
        assert_eq!(correlated.len(), 1);
        assert_eq!(correlated[0].name, "eth0");
        assert_eq!(correlated[0].subnets, doc.interfaces[0].subnets.as_slice());
    }

    #[test]
    fn test_priority_assignment() {
        let doc = InterfaceDocument {
            interfaces: vec![
                descriptor("001122334455", true),
                descriptor("001122334466", false),
            ],
        };
        let locals = vec![
            local("eth0", Some("00:11:22:33:44:55")),
            local("eth1", Some("00:11:22:33:44:66")),
        ];

        let correlated = correlate(&doc, &locals);
        assert_eq!(correlated[0].priority, PRIMARY_PRIORITY);
        assert_eq!(correlated[1].priority, SECONDARY_PRIORITY);
    }

    #[test]
    fn test_first_local_match_wins() {
        let doc = InterfaceDocument {
            interfaces: vec![descriptor("001122334455", false)],
        };
        let locals = vec![
            local("eth0", Some("00:11:22:33:44:55")),
            local("vlan0", Some("00:11:22:33:44:55")),
        ];

        let correlated = correlate(&doc, &locals);
        assert_eq!(correlated.len(), 1);
        assert_eq!(correlated[0].name, "eth0");
    }

    #[test]
    fn test_unmatched_descriptor_is_skipped() {
        let doc = InterfaceDocument {
            interfaces: vec![
                descriptor("ffffffffffff", true),
                descriptor("001122334455", false),
            ],
        };
        let locals = vec![local("eth1", Some("00:11:22:33:44:55"))];

        let correlated = correlate(&doc, &locals);
        assert_eq!(correlated.len(), 1);
        assert_eq!(correlated[0].name, "eth1");
    }

    #[test]
    fn test_empty_macs_never_match() {
        let doc = InterfaceDocument {
            interfaces: vec![descriptor("", true)],
        };
        let locals = vec![local("lo", None), local("tun0", Some(""))];

        assert!(correlate(&doc, &locals).is_empty());
    }
}
