//! Device state types built fresh on every scrape cycle.
//!
//! Nothing in here outlives the cycle that produced it: the extractor builds a
//! [`DeviceState`] from the three decoded payloads, the projection turns it into
//! observations, and the state is dropped.

use std::fmt;

/// The three script endpoints the switch serves its state from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    System,
    Link,
    Vlan,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::System, Endpoint::Link, Endpoint::Vlan];

    /// Script name without the `.js` suffix
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::System => "system_data",
            Endpoint::Link => "link_data",
            Endpoint::Vlan => "VLAN_1Q_List_data",
        }
    }

    /// Request path on the switch
    pub fn path(self) -> String {
        format!("/{}.js", self.name())
    }

    /// Variables the decoder keeps for this endpoint; everything else is ignored.
    pub fn variables(self) -> &'static [&'static str] {
        match self {
            Endpoint::System => &[
                "Max_port",
                "model_name",
                "sys_fmw_ver",
                "sys_IP",
                "sys_MAC",
                "loop",
                "loop_status",
            ],
            Endpoint::Link => &["portstatus", "speed", "Stats"],
            Endpoint::Vlan => &["qvlans"],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// System identity from `system_data.js`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub model: String,
    pub firmware: String,
    pub ip: String,
    pub mac: String,
    /// Global loop-detection state as reported by the switch
    pub loop_state: String,
    pub port_count: usize,
}

/// Link state and traffic totals for a single port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortLinkState {
    /// Link speed in bits per second, 0 when the link is down
    pub speed_bps: u64,
    pub status: String,
    pub loop_status: String,
    pub tx_total: u64,
    pub rx_total: u64,
}

/// One row of the 802.1Q VLAN table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanEntry {
    pub id: u16,
    /// Bit i set: port i+1 is an untagged member
    pub untagged_mask: u64,
    /// Bit i set: port i+1 is a tagged member
    pub tagged_mask: u64,
}

/// VLAN membership derived for one port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortVlanAssignment {
    pub primary: Option<u16>,
    /// Ascending, no duplicates
    pub tagged: Vec<u16>,
}

impl PortVlanAssignment {
    /// Primary VLAN as a label value, `0` when the port has none.
    pub fn primary_label(&self) -> String {
        self.primary.unwrap_or(0).to_string()
    }

    pub fn tagged_label(&self) -> String {
        join_ids(&self.tagged)
    }
}

/// Everything one scrape cycle learned about the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub identity: DeviceIdentity,
    pub ports: Vec<PortLinkState>,
    pub vlans: Vec<VlanEntry>,
    /// Parallel to `ports`
    pub assignments: Vec<PortVlanAssignment>,
}

impl DeviceState {
    /// Label value listing every configured VLAN, in table order.
    pub fn vlan_ids_label(&self) -> String {
        let ids: Vec<u16> = self.vlans.iter().map(|v| v.id).collect();
        join_ids(&ids)
    }
}

/// Display name of a 0-based port index
pub fn port_name(index: usize) -> String {
    format!("port {}", index + 1)
}

pub(crate) fn join_ids(ids: &[u16]) -> String {
    ids.iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
