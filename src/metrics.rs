//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the GS1200 exporter.
//!
//! # Metric Categories
//!
//! ## Device metrics
//! Rebuilt from scratch on every scrape, see [`DeviceMetric`]:
//! - `gs1200_num_ports` - port count, labelled with the switch identity
//! - `gs1200_speed` - per-port link speed with status and VLAN labels
//! - `gs1200_packets_tx` / `gs1200_packets_rx` - per-port traffic totals
//! - `gs1200_num_vlans` - number of configured 802.1Q VLANs
//!
//! ## Exporter metrics
//! - `gs1200_up` - 1 if the last scrape cycle succeeded
//! - `gs1200_scrape_duration_seconds` - duration of the last scrape cycle
//!
//! All values are gauges: the switch keeps its own cumulative counters and the
//! exporter republishes the latest snapshot.

use crate::error::Result;
use crate::projection::Observation;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

const NAMESPACE: &str = "gs1200";

/// Metrics whose label sets come from the switch and are replaced every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMetric {
    NumPorts,
    Speed,
    PacketsTx,
    PacketsRx,
    NumVlans,
}

impl DeviceMetric {
    pub const ALL: [DeviceMetric; 5] = [
        DeviceMetric::NumPorts,
        DeviceMetric::Speed,
        DeviceMetric::PacketsTx,
        DeviceMetric::PacketsRx,
        DeviceMetric::NumVlans,
    ];

    /// Name without the namespace prefix
    pub fn name(self) -> &'static str {
        match self {
            DeviceMetric::NumPorts => "num_ports",
            DeviceMetric::Speed => "speed",
            DeviceMetric::PacketsTx => "packets_tx",
            DeviceMetric::PacketsRx => "packets_rx",
            DeviceMetric::NumVlans => "num_vlans",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            DeviceMetric::NumPorts => "Number of ports. Mainly a placeholder for system information.",
            DeviceMetric::Speed => "Port speed in bits per second (0 when the link is down).",
            DeviceMetric::PacketsTx => "Number of packets transmitted.",
            DeviceMetric::PacketsRx => "Number of packets received.",
            DeviceMetric::NumVlans => "Number of configured VLANs.",
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            DeviceMetric::NumPorts => &["model", "firmware", "ip", "mac", "loop"],
            DeviceMetric::Speed => &["port", "status", "loop", "pvlan", "vlans"],
            DeviceMetric::PacketsTx | DeviceMetric::PacketsRx => &["port"],
            DeviceMetric::NumVlans => &["vlans"],
        }
    }
}

/// Metrics collector for the GS1200 exporter
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Device metrics
    pub num_ports: Arc<GaugeVec>,
    pub speed: Arc<GaugeVec>,
    pub packets_tx: Arc<GaugeVec>,
    pub packets_rx: Arc<GaugeVec>,
    pub num_vlans: Arc<GaugeVec>,

    // Exporter metrics
    pub up: Arc<Gauge>,
    pub scrape_duration_seconds: Arc<Gauge>,

    /// Held for writing while device metrics are replaced, for reading while rendering
    update_lock: Arc<RwLock<()>>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let register_vec = |metric: DeviceMetric| -> prometheus::Result<GaugeVec> {
            let vec = GaugeVec::new(
                Opts::new(metric.name(), metric.help()).namespace(NAMESPACE),
                metric.label_names(),
            )?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        let num_ports = register_vec(DeviceMetric::NumPorts)?;
        let speed = register_vec(DeviceMetric::Speed)?;
        let packets_tx = register_vec(DeviceMetric::PacketsTx)?;
        let packets_rx = register_vec(DeviceMetric::PacketsRx)?;
        let num_vlans = register_vec(DeviceMetric::NumVlans)?;

        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last scrape of the switch succeeded (1 = yes)")
                .namespace(NAMESPACE),
        )?;

        let scrape_duration_seconds = Gauge::with_opts(
            Opts::new(
                "scrape_duration_seconds",
                "Duration of the last login, fetch and logout cycle",
            )
            .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            num_ports: Arc::new(num_ports),
            speed: Arc::new(speed),
            packets_tx: Arc::new(packets_tx),
            packets_rx: Arc::new(packets_rx),
            num_vlans: Arc::new(num_vlans),
            up: Arc::new(up),
            scrape_duration_seconds: Arc::new(scrape_duration_seconds),
            update_lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn device_vec(&self, metric: DeviceMetric) -> &GaugeVec {
        match metric {
            DeviceMetric::NumPorts => &self.num_ports,
            DeviceMetric::Speed => &self.speed,
            DeviceMetric::PacketsTx => &self.packets_tx,
            DeviceMetric::PacketsRx => &self.packets_rx,
            DeviceMetric::NumVlans => &self.num_vlans,
        }
    }

    /// Replace all device metrics with one cycle's observations.
    ///
    /// Series from the previous cycle are dropped first, so a port or VLAN that
    /// disappeared from the switch leaves nothing behind. Renders never see the
    /// half-updated registry.
    pub fn publish(&self, observations: &[Observation]) -> Result<()> {
        let _guard = self.write_guard();
        self.reset_device_metrics();
        self.set_observations(observations)
    }

    /// Record a finished scrape cycle: its observations (`None` if the cycle
    /// failed), `up` and the cycle duration, all in one update.
    ///
    /// A cycle whose observations cannot be set is published as failed.
    pub fn publish_cycle(
        &self,
        observations: Option<&[Observation]>,
        duration: Duration,
    ) -> Result<()> {
        let _guard = self.write_guard();
        self.reset_device_metrics();

        let result = observations.map_or(Ok(()), |obs| self.set_observations(obs));
        if result.is_err() {
            self.reset_device_metrics();
        }

        let up = observations.is_some() && result.is_ok();
        self.up.set(if up { 1.0 } else { 0.0 });
        self.scrape_duration_seconds.set(duration.as_secs_f64());
        result
    }

    /// Drop every device series, e.g. after a failed cycle.
    pub fn clear(&self) {
        let _guard = self.write_guard();
        self.reset_device_metrics();
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.update_lock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_observations(&self, observations: &[Observation]) -> Result<()> {
        for obs in observations {
            let labels: Vec<&str> = obs.labels.iter().map(String::as_str).collect();
            self.device_vec(obs.metric)
                .get_metric_with_label_values(&labels)?
                .set(obs.value);
        }
        Ok(())
    }

    fn reset_device_metrics(&self) {
        for metric in DeviceMetric::ALL {
            self.device_vec(metric).reset();
        }
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let metric_families = {
            let _guard = self
                .update_lock
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            self.registry.gather()
        };

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
