//! Zyxel GS1200 Prometheus Exporter
//!
//! A Prometheus metrics exporter for Zyxel GS1200-series managed switches.
//!
//! # Overview
//!
//! The GS1200 has no management API. Its web UI logs in with a password form and
//! loads the switch state from small script files. This exporter drives the same
//! flow on every Prometheus scrape: log in, fetch the three state scripts, decode
//! them with a dedicated literal parser (nothing is executed), derive per-port
//! VLAN membership, publish gauges, log out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   login.cgi / *.js    ┌──────────────────┐
//! │   GS1200    │ ◄──────────────────►  │     Exporter     │
//! │   switch    │   logout.html         │                  │
//! └─────────────┘                       │  ┌────────────┐  │      HTTP      ┌────────────┐
//!                                       │  │  Scraper   │  │ ◄────────────► │ Prometheus │
//!                                       │  └────────────┘  │   /metrics     └────────────┘
//!                                       │  ┌────────────┐  │
//!                                       │  │  Metrics   │  │
//!                                       │  └────────────┘  │
//!                                       └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`gs1200`] - Session client, payload decoder, extractor and VLAN resolver
//! - [`collector`] - One serialized login → fetch → logout cycle
//! - [`projection`] - Device state to metric observations
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use gs1200_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod gs1200;
pub mod metrics;
pub mod projection;
pub mod server;
