pub mod client;
pub mod extract;
pub mod password;
pub mod payload;
pub mod types;
pub mod vlan;

pub use client::{Gs1200Client, Session, SessionState};
pub use types::{DeviceIdentity, DeviceState, Endpoint, PortLinkState, PortVlanAssignment, VlanEntry};
