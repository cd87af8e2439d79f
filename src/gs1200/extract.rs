//! Device State Extractor
//!
//! Validates the three decoded payloads and coerces them into typed device
//! state. The firmware is loose about types (port counts arrive as `'8'`, VLAN
//! masks as `'0x0f'`), so every accessor here accepts the spellings the switch
//! is known to use and reports anything else as a [`ExporterError::TypeMismatch`].

use crate::error::{ExporterError, Result};
use crate::gs1200::payload::{Payload, Value};
use crate::gs1200::types::{DeviceIdentity, DeviceState, PortLinkState, VlanEntry};
use crate::gs1200::vlan;

/// Raw per-port counters summed into the transmit total.
pub const TX_COUNTERS: [usize; 3] = [1, 2, 3];
/// Raw per-port counters summed into the receive total. Indices 4, 5 and 9
/// count errors and are left out.
pub const RX_COUNTERS: [usize; 4] = [6, 7, 8, 10];

const STATS_ROW_LEN: usize = 11;
const BITS_PER_MBIT: u64 = 1_000_000;

/// Build the full device state from the system, link and VLAN payloads.
pub fn extract(system: &Payload, link: &Payload, vlan_table: &Payload) -> Result<DeviceState> {
    let identity = extract_identity(system)?;
    let ports = extract_ports(system, link, identity.port_count)?;
    let vlans = extract_vlans(vlan_table)?;
    let assignments = vlan::resolve_all(identity.port_count, &vlans);

    Ok(DeviceState {
        identity,
        ports,
        vlans,
        assignments,
    })
}

pub fn extract_identity(system: &Payload) -> Result<DeviceIdentity> {
    let port_count = integer(system, "Max_port", required(system, "Max_port")?)?;
    let port_count = usize::try_from(port_count)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| mismatch(system, "Max_port", "a positive integer"))?;

    Ok(DeviceIdentity {
        model: label(system, "model_name")?,
        firmware: label(system, "sys_fmw_ver")?,
        ip: label(system, "sys_IP")?,
        mac: label(system, "sys_MAC")?,
        loop_state: label(system, "loop")?,
        port_count,
    })
}

pub fn extract_ports(
    system: &Payload,
    link: &Payload,
    port_count: usize,
) -> Result<Vec<PortLinkState>> {
    let loop_status = per_port(system, "loop_status", port_count)?;
    let status = per_port(link, "portstatus", port_count)?;
    let speed = per_port(link, "speed", port_count)?;
    let stats = per_port(link, "Stats", port_count)?;

    let mut ports = Vec::with_capacity(port_count);
    for i in 0..port_count {
        let field = |name: &str| format!("{}[{}]", name, i);

        let row = stats[i]
            .as_array()
            .ok_or_else(|| mismatch(link, &field("Stats"), "an array of counters"))?;
        if row.len() < STATS_ROW_LEN {
            return Err(ExporterError::FieldCountMismatch {
                endpoint: link.endpoint().to_string(),
                field: field("Stats"),
                expected: STATS_ROW_LEN,
                actual: row.len(),
            });
        }

        ports.push(PortLinkState {
            speed_bps: speed_bps(link, &field("speed"), &speed[i])?,
            status: label_value(link, &field("portstatus"), &status[i])?,
            loop_status: label_value(system, &field("loop_status"), &loop_status[i])?,
            tx_total: sum_counters(link, &field("Stats"), row, &TX_COUNTERS)?,
            rx_total: sum_counters(link, &field("Stats"), row, &RX_COUNTERS)?,
        });
    }

    Ok(ports)
}

pub fn extract_vlans(vlan_table: &Payload) -> Result<Vec<VlanEntry>> {
    let rows = required(vlan_table, "qvlans")?
        .as_array()
        .ok_or_else(|| mismatch(vlan_table, "qvlans", "an array of VLAN rows"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let field = format!("qvlans[{}]", i);
            let cells = row
                .as_array()
                .ok_or_else(|| mismatch(vlan_table, &field, "an array"))?;
            if cells.len() < 3 {
                return Err(ExporterError::FieldCountMismatch {
                    endpoint: vlan_table.endpoint().to_string(),
                    field,
                    expected: 3,
                    actual: cells.len(),
                });
            }

            let id = integer(vlan_table, &field, &cells[0])?;
            let id = u16::try_from(id)
                .ok()
                .filter(|id| (1..=4094).contains(id))
                .ok_or_else(|| mismatch(vlan_table, &field, "a VLAN ID between 1 and 4094"))?;

            Ok(VlanEntry {
                id,
                untagged_mask: mask(vlan_table, &field, &cells[1])?,
                tagged_mask: mask(vlan_table, &field, &cells[2])?,
            })
        })
        .collect()
}

fn required<'a>(payload: &'a Payload, name: &str) -> Result<&'a Value> {
    payload
        .get(name)
        .ok_or_else(|| ExporterError::MissingField {
            endpoint: payload.endpoint().to_string(),
            field: name.to_string(),
        })
}

fn mismatch(payload: &Payload, field: &str, expected: &str) -> ExporterError {
    ExporterError::TypeMismatch {
        endpoint: payload.endpoint().to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

fn per_port<'a>(payload: &'a Payload, name: &str, port_count: usize) -> Result<&'a [Value]> {
    let items = required(payload, name)?
        .as_array()
        .ok_or_else(|| mismatch(payload, name, "a per-port array"))?;
    if items.len() != port_count {
        return Err(ExporterError::FieldCountMismatch {
            endpoint: payload.endpoint().to_string(),
            field: name.to_string(),
            expected: port_count,
            actual: items.len(),
        });
    }
    Ok(items)
}

fn label(payload: &Payload, name: &str) -> Result<String> {
    label_value(payload, name, required(payload, name)?)
}

/// Strings pass through; numbers and booleans are rendered as text.
fn label_value(payload: &Payload, field: &str, value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Float(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) => Err(mismatch(payload, field, "a string")),
    }
}

/// Integer from a number literal or a string-encoded decimal.
fn integer(payload: &Payload, field: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(*n as i64),
        Value::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| mismatch(payload, field, "an integer")),
        _ => Err(mismatch(payload, field, "an integer")),
    }
}

/// Port bitmask from a number or a hex string. Strings are always base 16,
/// with or without a `0x` prefix.
fn mask(payload: &Payload, field: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Integer(n) => u64::try_from(*n).ok(),
        Value::Str(s) => {
            let s = s.trim();
            let hex = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            u64::from_str_radix(hex, 16).ok()
        }
        _ => None,
    };
    parsed.ok_or_else(|| mismatch(payload, field, "a port bitmask"))
}

/// Link speed in bps from an Mbps value such as `"1000"` or `"1000 Mbps"`.
fn speed_bps(payload: &Payload, field: &str, value: &Value) -> Result<u64> {
    let mbps = match value {
        Value::Str(s) => {
            let s = s.trim();
            s.strip_suffix("Mbps").unwrap_or(s).trim().parse::<u64>().ok()
        }
        Value::Integer(n) => u64::try_from(*n).ok(),
        _ => None,
    };
    mbps.and_then(|m| m.checked_mul(BITS_PER_MBIT))
        .ok_or_else(|| mismatch(payload, field, "a speed in Mbps"))
}

fn sum_counters(payload: &Payload, field: &str, row: &[Value], indices: &[usize]) -> Result<u64> {
    indices.iter().try_fold(0u64, |total, &i| {
        let counter = match &row[i] {
            Value::Integer(n) => u64::try_from(*n).ok(),
            Value::Float(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        };
        counter
            .and_then(|c| total.checked_add(c))
            .ok_or_else(|| mismatch(payload, &format!("{}[{}]", field, i), "a counter"))
    })
}
