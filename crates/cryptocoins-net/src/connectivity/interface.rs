//! Interface-based reachability.

use super::ConnectivityGuard;

/// A summary of one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    /// Interface name (e.g., "eth0", "en0").
    pub name: String,
    /// Interface index.
    pub index: u32,
    /// Whether the interface is up.
    pub is_up: bool,
    /// Whether this is a loopback interface.
    pub is_loopback: bool,
    /// Number of assigned IPv4 and IPv6 addresses.
    pub address_count: usize,
}

impl InterfaceSnapshot {
    /// List all interfaces on the system.
    pub fn list() -> Vec<InterfaceSnapshot> {
        netdev::get_interfaces()
            .into_iter()
            .map(|iface| InterfaceSnapshot {
                name: iface.name.clone(),
                index: iface.index,
                is_up: iface.is_up(),
                is_loopback: iface.is_loopback(),
                address_count: iface.ipv4.len() + iface.ipv6.len(),
            })
            .collect()
    }

    /// Check whether this interface can carry outbound traffic.
    pub fn is_usable(&self) -> bool {
        self.is_up && !self.is_loopback && self.address_count > 0
    }
}

/// Check if the system appears to be online.
///
/// Returns `true` if at least one non-loopback interface is up and has an
/// address assigned.
pub fn check_online_state() -> bool {
    InterfaceSnapshot::list().iter().any(InterfaceSnapshot::is_usable)
}

/// A guard that inspects the interface table on every check.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceConnectivity;

impl InterfaceConnectivity {
    /// Create an interface-based guard.
    pub fn new() -> Self {
        Self
    }
}

impl ConnectivityGuard for InterfaceConnectivity {
    fn is_connected(&self) -> bool {
        check_online_state()
    }
}
