//! VLAN Membership Resolver
//!
//! The switch stores 802.1Q membership as one row per VLAN with two port
//! bitmasks. Exporting it per port means inverting that table: for each port,
//! which VLAN carries its untagged traffic and which VLANs it trunks tagged.

use crate::gs1200::types::{PortVlanAssignment, VlanEntry};

/// Resolve the VLAN membership of the 0-based `port`.
///
/// If several VLANs claim the port as an untagged member the last one in table
/// order wins. Firmware should never produce that, so it is not treated as an error.
pub fn resolve(port: usize, vlans: &[VlanEntry]) -> PortVlanAssignment {
    let mut assignment = PortVlanAssignment::default();

    let Some(bit) = u32::try_from(port).ok().and_then(|p| 1u64.checked_shl(p)) else {
        return assignment;
    };

    for vlan in vlans {
        if vlan.untagged_mask & bit != 0 {
            assignment.primary = Some(vlan.id);
        }
        if vlan.tagged_mask & bit != 0 {
            assignment.tagged.push(vlan.id);
        }
    }

    // Stable label values regardless of table order
    assignment.tagged.sort_unstable();
    assignment.tagged.dedup();
    assignment
}

/// Resolve every port of a `port_count`-port switch.
pub fn resolve_all(port_count: usize, vlans: &[VlanEntry]) -> Vec<PortVlanAssignment> {
    (0..port_count).map(|port| resolve(port, vlans)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u16, untagged_mask: u64, tagged_mask: u64) -> VlanEntry {
        VlanEntry {
            id,
            untagged_mask,
            tagged_mask,
        }
    }

    #[test]
    fn vlan_one_untagged_everywhere() {
        let vlans = [entry(1, 0b1111_1111, 0)];
        for assignment in resolve_all(8, &vlans) {
            assert_eq!(assignment.primary_label(), "1");
            assert_eq!(assignment.tagged_label(), "");
        }
    }

    #[test]
    fn untagged_member_becomes_primary() {
        for port in 0..24 {
            let vlans = [entry(1, 0, 0), entry(42, 1 << port, 0), entry(7, 0, 0)];
            assert_eq!(resolve(port, &vlans).primary, Some(42));
        }
    }

    #[test]
    fn tagged_list_is_sorted_regardless_of_table_order() {
        let vlans = [
            entry(300, 0, 0b10),
            entry(5, 0, 0b10),
            entry(100, 0b10, 0b10),
            entry(20, 0, 0b10),
        ];
        let assignment = resolve(1, &vlans);
        assert_eq!(assignment.tagged, vec![5, 20, 100, 300]);
        assert_eq!(assignment.tagged_label(), "5,20,100,300");
        assert_eq!(assignment.primary, Some(100));
    }

    #[test]
    fn duplicate_rows_are_deduplicated() {
        let vlans = [entry(10, 0, 1), entry(10, 0, 1)];
        assert_eq!(resolve(0, &vlans).tagged, vec![10]);
    }

    #[test]
    fn last_untagged_claim_wins() {
        let vlans = [entry(2, 0b1, 0), entry(3, 0b1, 0)];
        assert_eq!(resolve(0, &vlans).primary, Some(3));
    }

    #[test]
    fn port_without_membership_has_no_primary() {
        let vlans = [entry(1, 0b0111_1111, 0)];
        let assignment = resolve(7, &vlans);
        assert_eq!(assignment.primary, None);
        assert_eq!(assignment.primary_label(), "0");
        assert!(assignment.tagged.is_empty());
    }

    #[test]
    fn ports_beyond_mask_width_never_match() {
        let vlans = [entry(1, u64::MAX, u64::MAX)];
        assert_eq!(resolve(64, &vlans), PortVlanAssignment::default());
        assert_eq!(resolve(63, &vlans).primary, Some(1));
    }
}
