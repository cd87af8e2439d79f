//! Metric Projection
//!
//! Pure mapping from one cycle's [`DeviceState`] to the labelled gauge values
//! the exporter publishes. Keeping this free of registry access makes the
//! metric surface testable without rendering text.

use crate::gs1200::types::{port_name, DeviceState};
use crate::metrics::DeviceMetric;

/// One labelled gauge value. `labels` follow [`DeviceMetric::label_names`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: DeviceMetric,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    fn new(metric: DeviceMetric, labels: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(labels.len(), metric.label_names().len());
        Self {
            metric,
            labels,
            value,
        }
    }

    /// Value of the label called `name`, if the metric has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric
            .label_names()
            .iter()
            .position(|&n| n == name)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }
}

pub fn project(state: &DeviceState) -> Vec<Observation> {
    let identity = &state.identity;
    let mut observations = Vec::with_capacity(2 + state.ports.len() * 3);

    observations.push(Observation::new(
        DeviceMetric::NumPorts,
        vec![
            identity.model.clone(),
            identity.firmware.clone(),
            identity.ip.clone(),
            identity.mac.clone(),
            identity.loop_state.clone(),
        ],
        identity.port_count as f64,
    ));

    for (i, (port, assignment)) in state.ports.iter().zip(&state.assignments).enumerate() {
        let name = port_name(i);

        observations.push(Observation::new(
            DeviceMetric::Speed,
            vec![
                name.clone(),
                port.status.clone(),
                port.loop_status.clone(),
                assignment.primary_label(),
                assignment.tagged_label(),
            ],
            port.speed_bps as f64,
        ));
        observations.push(Observation::new(
            DeviceMetric::PacketsTx,
            vec![name.clone()],
            port.tx_total as f64,
        ));
        observations.push(Observation::new(
            DeviceMetric::PacketsRx,
            vec![name],
            port.rx_total as f64,
        ));
    }

    observations.push(Observation::new(
        DeviceMetric::NumVlans,
        vec![state.vlan_ids_label()],
        state.vlans.len() as f64,
    ));

    observations
}
